//! Object built-in.

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::object::{new_array, new_object, object_from_entries};
use crate::runner::ds::operations::object::{get_own, iterate, own_keys, set, unwrap_proxy};
use crate::runner::ds::operations::type_conversion::{to_property_key, to_string};
use crate::runner::ds::realm::Realm;
use crate::runner::ds::value::JsValue;
use crate::runner::eval::ValueResult;

use super::core::{arg, BuiltInObject, PrototypeKind};

/// Register the Object built-in.
pub fn register(realm: &Realm) {
    BuiltInObject::new("Object")
        .with_constructor(object_constructor)
        .with_prototype(PrototypeKind::Object)
        .add_method("keys", object_keys)
        .add_method("values", object_values)
        .add_method("entries", object_entries)
        .add_method("assign", object_assign)
        .add_method("fromEntries", object_from_entries_fn)
        .add_method("freeze", object_freeze)
        .add_method("create", object_create)
        .add_prototype_method("hasOwnProperty", object_has_own_property)
        .add_prototype_method("toString", object_to_string)
        .install(realm);
}

fn require_object_coercible(value: &JsValue) -> Result<(), JErrorType> {
    if value.is_nullish() {
        Err(JErrorType::TypeError(
            "Cannot convert undefined or null to object".to_string(),
        ))
    } else {
        Ok(())
    }
}

/// Own enumerable `[key, value]` pairs of `value`.
fn own_entries(value: &JsValue) -> Result<Vec<(String, JsValue)>, JErrorType> {
    require_object_coercible(value)?;
    Ok(own_keys(value)
        .into_iter()
        .map(|key| {
            let v = get_own(value, &key).unwrap_or(JsValue::Undefined);
            (key, v)
        })
        .collect())
}

fn object_constructor(_this: JsValue, args: Vec<JsValue>) -> ValueResult {
    Ok(match arg(&args, 0) {
        v @ JsValue::Object(_) => v,
        _ => new_object(),
    })
}

fn object_keys(_this: JsValue, args: Vec<JsValue>) -> ValueResult {
    let entries = own_entries(&arg(&args, 0))?;
    Ok(new_array(
        entries.into_iter().map(|(k, _)| JsValue::String(k)).collect(),
    ))
}

fn object_values(_this: JsValue, args: Vec<JsValue>) -> ValueResult {
    let entries = own_entries(&arg(&args, 0))?;
    Ok(new_array(entries.into_iter().map(|(_, v)| v).collect()))
}

fn object_entries(_this: JsValue, args: Vec<JsValue>) -> ValueResult {
    let entries = own_entries(&arg(&args, 0))?;
    Ok(new_array(
        entries
            .into_iter()
            .map(|(k, v)| new_array(vec![JsValue::String(k), v]))
            .collect(),
    ))
}

fn object_assign(_this: JsValue, args: Vec<JsValue>) -> ValueResult {
    let target = arg(&args, 0);
    require_object_coercible(&target)?;
    for source in args.iter().skip(1) {
        if source.is_nullish() {
            continue;
        }
        for (key, value) in own_entries(source)? {
            set(&target, &key, value)?;
        }
    }
    Ok(target)
}

fn object_from_entries_fn(_this: JsValue, args: Vec<JsValue>) -> ValueResult {
    let mut entries = vec![];
    for pair in iterate(&arg(&args, 0))? {
        let key = get_own(&pair, "0").unwrap_or(JsValue::Undefined);
        let value = get_own(&pair, "1").unwrap_or(JsValue::Undefined);
        entries.push((to_property_key(&key), value));
    }
    Ok(object_from_entries(entries))
}

/// Objects are not sealed; `freeze` hands its argument back.
fn object_freeze(_this: JsValue, args: Vec<JsValue>) -> ValueResult {
    Ok(arg(&args, 0))
}

fn object_create(_this: JsValue, args: Vec<JsValue>) -> ValueResult {
    match arg(&args, 0) {
        JsValue::Null | JsValue::Object(_) => Ok(new_object()),
        other => Err(JErrorType::TypeError(format!(
            "Object prototype may only be an Object or null: {}",
            to_string(&other)
        ))),
    }
}

fn object_has_own_property(this: JsValue, args: Vec<JsValue>) -> ValueResult {
    let key = to_property_key(&arg(&args, 0));
    Ok(JsValue::Boolean(get_own(&unwrap_proxy(&this), &key).is_some()))
}

fn object_to_string(this: JsValue, _args: Vec<JsValue>) -> ValueResult {
    Ok(JsValue::String(match this {
        JsValue::Undefined => "[object Undefined]".to_string(),
        JsValue::Null => "[object Null]".to_string(),
        other if other.is_array() => "[object Array]".to_string(),
        other if other.is_callable() => "[object Function]".to_string(),
        _ => "[object Object]".to_string(),
    }))
}
