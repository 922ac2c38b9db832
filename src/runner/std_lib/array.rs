//! Array built-in.
//!
//! Provides `Array.isArray`/`from`/`of` and the prototype methods plugins
//! commonly reach for. Methods taking callbacks are async natives since the
//! callback may be script code.

use std::rc::Rc;

use futures::future::{FutureExt, LocalBoxFuture};

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::object::{array_elements, array_length, new_array, ObjectType};
use crate::runner::ds::operations::object::{iterate, unwrap_proxy};
use crate::runner::ds::operations::test_and_comparison::{same_value_zero, strict_equals};
use crate::runner::ds::operations::type_conversion::{to_boolean, to_number, to_string};
use crate::runner::ds::realm::Realm;
use crate::runner::ds::value::{check_string_length, JsValue};
use crate::runner::eval::function::call_function;
use crate::runner::eval::ValueResult;

use super::core::{arg, BuiltInObject, PrototypeKind};

/// Register the Array built-in.
pub fn register(realm: &Realm) {
    BuiltInObject::new("Array")
        .with_constructor(array_constructor)
        .with_prototype(PrototypeKind::Array)
        .add_method("isArray", array_is_array)
        .add_method("of", array_of)
        .add_async_method("from", array_from)
        .add_prototype_method("push", array_push)
        .add_prototype_method("pop", array_pop)
        .add_prototype_method("shift", array_shift)
        .add_prototype_method("unshift", array_unshift)
        .add_prototype_method("slice", array_slice)
        .add_prototype_method("splice", array_splice)
        .add_prototype_method("indexOf", array_index_of)
        .add_prototype_method("lastIndexOf", array_last_index_of)
        .add_prototype_method("includes", array_includes)
        .add_prototype_method("join", array_join)
        .add_prototype_method("concat", array_concat)
        .add_prototype_method("reverse", array_reverse)
        .add_prototype_method("flat", array_flat)
        .add_prototype_method("at", array_at)
        .add_prototype_method("toString", array_to_string)
        .add_async_prototype_method("forEach", array_for_each)
        .add_async_prototype_method("map", array_map)
        .add_async_prototype_method("filter", array_filter)
        .add_async_prototype_method("reduce", array_reduce)
        .add_async_prototype_method("find", array_find)
        .add_async_prototype_method("findIndex", array_find_index)
        .add_async_prototype_method("some", array_some)
        .add_async_prototype_method("every", array_every)
        .add_async_prototype_method("flatMap", array_flat_map)
        .add_async_prototype_method("sort", array_sort)
        .install(realm);
}

fn not_an_array(method: &str) -> JErrorType {
    JErrorType::TypeError(format!(
        "Array.prototype.{} called on a non-array value",
        method
    ))
}

fn elements_of(this: &JsValue, method: &str) -> Result<Vec<JsValue>, JErrorType> {
    array_elements(&unwrap_proxy(this)).ok_or_else(|| not_an_array(method))
}

/// Runs `f` against the element storage of the array `this`.
fn with_elements<R>(
    this: &JsValue,
    method: &str,
    f: impl FnOnce(&mut Vec<JsValue>) -> R,
) -> Result<R, JErrorType> {
    let target = unwrap_proxy(this);
    if let JsValue::Object(o) = &target {
        if let ObjectType::Array(a) = &mut *o.borrow_mut() {
            return Ok(f(&mut a.elements));
        }
    }
    Err(not_an_array(method))
}

/// Resolves a relative index argument (negative counts from the end).
fn relative_index(value: &JsValue, len: usize, default: usize) -> usize {
    if let JsValue::Undefined = value {
        return default;
    }
    let n = to_number(value);
    if n.is_nan() {
        return 0;
    }
    let n = n.trunc();
    if n < 0.0 {
        (len as f64 + n).max(0.0) as usize
    } else {
        n.min(len as f64) as usize
    }
}

fn array_constructor(_this: JsValue, args: Vec<JsValue>) -> ValueResult {
    match args.as_slice() {
        [JsValue::Number(n)] => Ok(new_array(vec![JsValue::Undefined; array_length(*n)?])),
        _ => Ok(new_array(args)),
    }
}

fn array_is_array(_this: JsValue, args: Vec<JsValue>) -> ValueResult {
    Ok(JsValue::Boolean(unwrap_proxy(&arg(&args, 0)).is_array()))
}

fn array_of(_this: JsValue, args: Vec<JsValue>) -> ValueResult {
    Ok(new_array(args))
}

fn array_from(realm: Rc<Realm>, _this: JsValue, args: Vec<JsValue>) -> LocalBoxFuture<'static, ValueResult> {
    async move {
        let source = arg(&args, 0);
        if source.is_nullish() {
            return Err(JErrorType::TypeError(format!(
                "{} is not iterable",
                to_string(&source)
            )));
        }
        let items = iterate(&source)?;
        let map_fn = arg(&args, 1);
        if map_fn.is_nullish() {
            return Ok(new_array(items));
        }
        let mut mapped = Vec::with_capacity(items.len());
        for (idx, item) in items.into_iter().enumerate() {
            let args = vec![item, JsValue::from(idx as f64)];
            mapped.push(call_function(&realm, &map_fn, JsValue::Undefined, args).await?);
        }
        Ok(new_array(mapped))
    }
    .boxed_local()
}

fn array_push(this: JsValue, args: Vec<JsValue>) -> ValueResult {
    with_elements(&this, "push", |elements| -> ValueResult {
        let len = array_length((elements.len() + args.len()) as f64)?;
        elements.extend(args);
        Ok(JsValue::from(len as f64))
    })?
}

fn array_pop(this: JsValue, _args: Vec<JsValue>) -> ValueResult {
    with_elements(&this, "pop", |elements| {
        elements.pop().unwrap_or(JsValue::Undefined)
    })
}

fn array_shift(this: JsValue, _args: Vec<JsValue>) -> ValueResult {
    with_elements(&this, "shift", |elements| {
        if elements.is_empty() {
            JsValue::Undefined
        } else {
            elements.remove(0)
        }
    })
}

fn array_unshift(this: JsValue, args: Vec<JsValue>) -> ValueResult {
    with_elements(&this, "unshift", |elements| {
        elements.splice(0..0, args);
        JsValue::from(elements.len() as f64)
    })
}

fn array_slice(this: JsValue, args: Vec<JsValue>) -> ValueResult {
    let elements = elements_of(&this, "slice")?;
    let len = elements.len();
    let start = relative_index(&arg(&args, 0), len, 0);
    let end = relative_index(&arg(&args, 1), len, len);
    if start >= end {
        return Ok(new_array(vec![]));
    }
    Ok(new_array(elements[start..end].to_vec()))
}

fn array_splice(this: JsValue, args: Vec<JsValue>) -> ValueResult {
    with_elements(&this, "splice", |elements| {
        let len = elements.len();
        let start = relative_index(&arg(&args, 0), len, 0);
        let delete_count = match args.len() {
            0 => 0,
            1 => len - start,
            _ => {
                let n = to_number(&args[1]);
                if n.is_nan() || n < 0.0 {
                    0
                } else {
                    (n.trunc() as usize).min(len - start)
                }
            }
        };
        let inserted = args.iter().skip(2).cloned();
        let removed: Vec<JsValue> = elements
            .splice(start..start + delete_count, inserted)
            .collect();
        new_array(removed)
    })
}

fn array_index_of(this: JsValue, args: Vec<JsValue>) -> ValueResult {
    let elements = elements_of(&this, "indexOf")?;
    let needle = arg(&args, 0);
    let from = relative_index(&arg(&args, 1), elements.len(), 0);
    let found = elements
        .iter()
        .enumerate()
        .skip(from)
        .find(|(_, e)| strict_equals(e, &needle))
        .map(|(idx, _)| idx as f64);
    Ok(JsValue::from(found.unwrap_or(-1.0)))
}

fn array_last_index_of(this: JsValue, args: Vec<JsValue>) -> ValueResult {
    let elements = elements_of(&this, "lastIndexOf")?;
    let needle = arg(&args, 0);
    let found = elements
        .iter()
        .rposition(|e| strict_equals(e, &needle))
        .map(|idx| idx as f64);
    Ok(JsValue::from(found.unwrap_or(-1.0)))
}

fn array_includes(this: JsValue, args: Vec<JsValue>) -> ValueResult {
    let elements = elements_of(&this, "includes")?;
    let needle = arg(&args, 0);
    Ok(JsValue::Boolean(
        elements.iter().any(|e| same_value_zero(e, &needle)),
    ))
}

fn join_elements(elements: &[JsValue], separator: &str) -> String {
    elements
        .iter()
        .map(|e| if e.is_nullish() { String::new() } else { to_string(e) })
        .collect::<Vec<_>>()
        .join(separator)
}

fn array_join(this: JsValue, args: Vec<JsValue>) -> ValueResult {
    let elements = elements_of(&this, "join")?;
    let separator = match arg(&args, 0) {
        JsValue::Undefined => ",".to_string(),
        other => to_string(&other),
    };
    check_string_length(separator.len().saturating_mul(elements.len()))?;
    Ok(JsValue::String(join_elements(&elements, &separator)))
}

fn array_to_string(this: JsValue, _args: Vec<JsValue>) -> ValueResult {
    let elements = elements_of(&this, "toString")?;
    Ok(JsValue::String(join_elements(&elements, ",")))
}

fn array_concat(this: JsValue, args: Vec<JsValue>) -> ValueResult {
    let mut elements = elements_of(&this, "concat")?;
    for a in args {
        match array_elements(&unwrap_proxy(&a)) {
            Some(more) => {
                array_length((elements.len() + more.len()) as f64)?;
                elements.extend(more)
            }
            None => elements.push(a),
        }
    }
    Ok(new_array(elements))
}

fn array_reverse(this: JsValue, _args: Vec<JsValue>) -> ValueResult {
    with_elements(&this, "reverse", |elements| elements.reverse())?;
    Ok(this)
}

fn flatten_into(out: &mut Vec<JsValue>, elements: Vec<JsValue>, depth: f64) {
    for e in elements {
        match array_elements(&unwrap_proxy(&e)) {
            Some(inner) if depth >= 1.0 => flatten_into(out, inner, depth - 1.0),
            _ => out.push(e),
        }
    }
}

fn array_flat(this: JsValue, args: Vec<JsValue>) -> ValueResult {
    let elements = elements_of(&this, "flat")?;
    let depth = match arg(&args, 0) {
        JsValue::Undefined => 1.0,
        other => to_number(&other),
    };
    let mut out = vec![];
    flatten_into(&mut out, elements, depth);
    Ok(new_array(out))
}

fn array_at(this: JsValue, args: Vec<JsValue>) -> ValueResult {
    let elements = elements_of(&this, "at")?;
    let n = to_number(&arg(&args, 0));
    let n = if n.is_nan() { 0.0 } else { n.trunc() };
    let idx = if n < 0.0 { elements.len() as f64 + n } else { n };
    if idx < 0.0 {
        return Ok(JsValue::Undefined);
    }
    Ok(elements
        .get(idx as usize)
        .cloned()
        .unwrap_or(JsValue::Undefined))
}

/// Calls `callback(element, index, array)` for each element, in order.
async fn call_each(
    realm: &Rc<Realm>,
    this: &JsValue,
    callback: &JsValue,
    element: JsValue,
    idx: usize,
) -> ValueResult {
    let args = vec![element, JsValue::from(idx as f64), this.clone()];
    call_function(realm, callback, JsValue::Undefined, args).await
}

fn callback_arg(args: &[JsValue]) -> Result<JsValue, JErrorType> {
    let callback = arg(args, 0);
    if callback.is_callable() || unwrap_proxy(&callback).is_callable() {
        Ok(callback)
    } else {
        Err(JErrorType::TypeError(format!(
            "{} is not a function",
            to_string(&callback)
        )))
    }
}

fn array_for_each(realm: Rc<Realm>, this: JsValue, args: Vec<JsValue>) -> LocalBoxFuture<'static, ValueResult> {
    async move {
        let elements = elements_of(&this, "forEach")?;
        let callback = callback_arg(&args)?;
        for (idx, e) in elements.into_iter().enumerate() {
            call_each(&realm, &this, &callback, e, idx).await?;
        }
        Ok(JsValue::Undefined)
    }
    .boxed_local()
}

fn array_map(realm: Rc<Realm>, this: JsValue, args: Vec<JsValue>) -> LocalBoxFuture<'static, ValueResult> {
    async move {
        let elements = elements_of(&this, "map")?;
        let callback = callback_arg(&args)?;
        let mut out = Vec::with_capacity(elements.len());
        for (idx, e) in elements.into_iter().enumerate() {
            out.push(call_each(&realm, &this, &callback, e, idx).await?);
        }
        Ok(new_array(out))
    }
    .boxed_local()
}

fn array_flat_map(realm: Rc<Realm>, this: JsValue, args: Vec<JsValue>) -> LocalBoxFuture<'static, ValueResult> {
    async move {
        let elements = elements_of(&this, "flatMap")?;
        let callback = callback_arg(&args)?;
        let mut mapped = Vec::with_capacity(elements.len());
        for (idx, e) in elements.into_iter().enumerate() {
            mapped.push(call_each(&realm, &this, &callback, e, idx).await?);
        }
        let mut out = vec![];
        flatten_into(&mut out, mapped, 1.0);
        Ok(new_array(out))
    }
    .boxed_local()
}

fn array_filter(realm: Rc<Realm>, this: JsValue, args: Vec<JsValue>) -> LocalBoxFuture<'static, ValueResult> {
    async move {
        let elements = elements_of(&this, "filter")?;
        let callback = callback_arg(&args)?;
        let mut out = vec![];
        for (idx, e) in elements.into_iter().enumerate() {
            if to_boolean(&call_each(&realm, &this, &callback, e.clone(), idx).await?) {
                out.push(e);
            }
        }
        Ok(new_array(out))
    }
    .boxed_local()
}

fn array_reduce(realm: Rc<Realm>, this: JsValue, args: Vec<JsValue>) -> LocalBoxFuture<'static, ValueResult> {
    async move {
        let elements = elements_of(&this, "reduce")?;
        let callback = callback_arg(&args)?;
        let mut items = elements.into_iter().enumerate();
        let mut accumulator = match args.get(1) {
            Some(initial) => initial.clone(),
            None => match items.next() {
                Some((_, first)) => first,
                None => {
                    return Err(JErrorType::TypeError(
                        "Reduce of empty array with no initial value".to_string(),
                    ))
                }
            },
        };
        for (idx, e) in items {
            let args = vec![accumulator, e, JsValue::from(idx as f64), this.clone()];
            accumulator = call_function(&realm, &callback, JsValue::Undefined, args).await?;
        }
        Ok(accumulator)
    }
    .boxed_local()
}

/// Index of the first element the callback accepts.
async fn find_position(
    realm: &Rc<Realm>,
    this: &JsValue,
    args: &[JsValue],
    method: &str,
) -> Result<Option<(usize, JsValue)>, JErrorType> {
    let elements = elements_of(this, method)?;
    let callback = callback_arg(args)?;
    for (idx, e) in elements.into_iter().enumerate() {
        if to_boolean(&call_each(realm, this, &callback, e.clone(), idx).await?) {
            return Ok(Some((idx, e)));
        }
    }
    Ok(None)
}

fn array_find(realm: Rc<Realm>, this: JsValue, args: Vec<JsValue>) -> LocalBoxFuture<'static, ValueResult> {
    async move {
        Ok(find_position(&realm, &this, &args, "find")
            .await?
            .map(|(_, e)| e)
            .unwrap_or(JsValue::Undefined))
    }
    .boxed_local()
}

fn array_find_index(realm: Rc<Realm>, this: JsValue, args: Vec<JsValue>) -> LocalBoxFuture<'static, ValueResult> {
    async move {
        let idx = find_position(&realm, &this, &args, "findIndex")
            .await?
            .map(|(idx, _)| idx as f64);
        Ok(JsValue::from(idx.unwrap_or(-1.0)))
    }
    .boxed_local()
}

fn array_some(realm: Rc<Realm>, this: JsValue, args: Vec<JsValue>) -> LocalBoxFuture<'static, ValueResult> {
    async move {
        let found = find_position(&realm, &this, &args, "some").await?;
        Ok(JsValue::Boolean(found.is_some()))
    }
    .boxed_local()
}

fn array_every(realm: Rc<Realm>, this: JsValue, args: Vec<JsValue>) -> LocalBoxFuture<'static, ValueResult> {
    async move {
        let elements = elements_of(&this, "every")?;
        let callback = callback_arg(&args)?;
        for (idx, e) in elements.into_iter().enumerate() {
            if !to_boolean(&call_each(&realm, &this, &callback, e, idx).await?) {
                return Ok(JsValue::Boolean(false));
            }
        }
        Ok(JsValue::Boolean(true))
    }
    .boxed_local()
}

/// `a` sorts after `b`.
async fn sorts_after(
    realm: &Rc<Realm>,
    comparator: &JsValue,
    a: &JsValue,
    b: &JsValue,
) -> Result<bool, JErrorType> {
    if comparator.is_nullish() {
        return Ok(to_string(a) > to_string(b));
    }
    let args = vec![a.clone(), b.clone()];
    let order = to_number(&call_function(realm, comparator, JsValue::Undefined, args).await?);
    Ok(order > 0.0)
}

/// Stable insertion sort; `undefined` elements go last.
fn array_sort(realm: Rc<Realm>, this: JsValue, args: Vec<JsValue>) -> LocalBoxFuture<'static, ValueResult> {
    async move {
        let elements = elements_of(&this, "sort")?;
        let comparator = arg(&args, 0);
        let (mut defined, undefined): (Vec<JsValue>, Vec<JsValue>) = elements
            .into_iter()
            .partition(|e| !matches!(e, JsValue::Undefined));
        for i in 1..defined.len() {
            let mut j = i;
            while j > 0 && sorts_after(&realm, &comparator, &defined[j - 1], &defined[j]).await? {
                defined.swap(j - 1, j);
                j -= 1;
            }
        }
        defined.extend(undefined);
        with_elements(&this, "sort", |elements| *elements = defined)?;
        Ok(this)
    }
    .boxed_local()
}
