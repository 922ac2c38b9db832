//! String built-in.
//!
//! Indices count Unicode scalar values, not UTF-16 code units.

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::object::new_array;
use crate::runner::ds::operations::object::unwrap_proxy;
use crate::runner::ds::operations::type_conversion::{to_number, to_string};
use crate::runner::ds::realm::Realm;
use crate::runner::ds::value::{check_string_length, JsValue, MAX_STRING_LENGTH};
use crate::runner::eval::ValueResult;

use super::core::{arg, BuiltInObject, PrototypeKind};

/// Register the String built-in.
pub fn register(realm: &Realm) {
    BuiltInObject::new("String")
        .with_constructor(string_constructor)
        .with_prototype(PrototypeKind::String)
        .add_method("fromCharCode", string_from_char_code)
        .add_prototype_method("charAt", string_char_at)
        .add_prototype_method("charCodeAt", string_char_code_at)
        .add_prototype_method("at", string_at)
        .add_prototype_method("substring", string_substring)
        .add_prototype_method("slice", string_slice)
        .add_prototype_method("indexOf", string_index_of)
        .add_prototype_method("lastIndexOf", string_last_index_of)
        .add_prototype_method("includes", string_includes)
        .add_prototype_method("startsWith", string_starts_with)
        .add_prototype_method("endsWith", string_ends_with)
        .add_prototype_method("split", string_split)
        .add_prototype_method("trim", string_trim)
        .add_prototype_method("trimStart", string_trim_start)
        .add_prototype_method("trimEnd", string_trim_end)
        .add_prototype_method("toUpperCase", string_to_upper_case)
        .add_prototype_method("toLowerCase", string_to_lower_case)
        .add_prototype_method("repeat", string_repeat)
        .add_prototype_method("padStart", string_pad_start)
        .add_prototype_method("padEnd", string_pad_end)
        .add_prototype_method("replace", string_replace)
        .add_prototype_method("replaceAll", string_replace_all)
        .add_prototype_method("concat", string_concat)
        .add_prototype_method("toString", string_to_string)
        .install(realm);
}

/// The string a method was called on.
fn this_string(this: &JsValue) -> Result<String, JErrorType> {
    match unwrap_proxy(this) {
        JsValue::String(s) => Ok(s),
        JsValue::Undefined | JsValue::Null => Err(JErrorType::TypeError(
            "String.prototype method called on null or undefined".to_string(),
        )),
        other => Ok(to_string(&other)),
    }
}

fn chars(s: &str) -> Vec<char> {
    s.chars().collect()
}

/// Clamps an integer argument into `0..=len`, counting negatives from the
/// end when `relative` is set.
fn clamp_index(value: &JsValue, len: usize, default: usize, relative: bool) -> usize {
    if let JsValue::Undefined = value {
        return default;
    }
    let n = to_number(value);
    if n.is_nan() {
        return 0;
    }
    let n = n.trunc();
    if n < 0.0 {
        if relative {
            (len as f64 + n).max(0.0) as usize
        } else {
            0
        }
    } else {
        n.min(len as f64) as usize
    }
}

/// Character offset of a byte offset into `s`.
fn char_offset(s: &str, byte_offset: usize) -> usize {
    s[..byte_offset].chars().count()
}

/// Byte offset of the `idx`-th character of `s`.
fn byte_offset(s: &str, idx: usize) -> usize {
    s.char_indices().nth(idx).map(|(b, _)| b).unwrap_or(s.len())
}

fn string_constructor(_this: JsValue, args: Vec<JsValue>) -> ValueResult {
    Ok(match args.first() {
        Some(v) => JsValue::String(to_string(v)),
        None => JsValue::String(String::new()),
    })
}

fn string_from_char_code(_this: JsValue, args: Vec<JsValue>) -> ValueResult {
    let s: String = args
        .iter()
        .filter_map(|a| char::from_u32(to_number(a) as u32))
        .collect();
    Ok(JsValue::String(s))
}

fn string_to_string(this: JsValue, _args: Vec<JsValue>) -> ValueResult {
    Ok(JsValue::String(this_string(&this)?))
}

fn string_char_at(this: JsValue, args: Vec<JsValue>) -> ValueResult {
    let s = chars(&this_string(&this)?);
    let idx = to_number(&arg(&args, 0));
    let idx = if idx.is_nan() { 0.0 } else { idx.trunc() };
    if idx < 0.0 {
        return Ok(JsValue::from(""));
    }
    Ok(JsValue::String(
        s.get(idx as usize).map(|c| c.to_string()).unwrap_or_default(),
    ))
}

fn string_char_code_at(this: JsValue, args: Vec<JsValue>) -> ValueResult {
    let s = chars(&this_string(&this)?);
    let idx = to_number(&arg(&args, 0));
    let idx = if idx.is_nan() { 0.0 } else { idx.trunc() };
    if idx < 0.0 {
        return Ok(JsValue::from(f64::NAN));
    }
    Ok(JsValue::from(
        s.get(idx as usize).map(|c| *c as u32 as f64).unwrap_or(f64::NAN),
    ))
}

fn string_at(this: JsValue, args: Vec<JsValue>) -> ValueResult {
    let s = chars(&this_string(&this)?);
    let n = to_number(&arg(&args, 0));
    let n = if n.is_nan() { 0.0 } else { n.trunc() };
    let idx = if n < 0.0 { s.len() as f64 + n } else { n };
    if idx < 0.0 {
        return Ok(JsValue::Undefined);
    }
    Ok(s
        .get(idx as usize)
        .map(|c| JsValue::String(c.to_string()))
        .unwrap_or(JsValue::Undefined))
}

fn string_substring(this: JsValue, args: Vec<JsValue>) -> ValueResult {
    let s = chars(&this_string(&this)?);
    let len = s.len();
    let a = clamp_index(&arg(&args, 0), len, 0, false);
    let b = clamp_index(&arg(&args, 1), len, len, false);
    let (start, end) = if a <= b { (a, b) } else { (b, a) };
    Ok(JsValue::String(s[start..end].iter().collect()))
}

fn string_slice(this: JsValue, args: Vec<JsValue>) -> ValueResult {
    let s = chars(&this_string(&this)?);
    let len = s.len();
    let start = clamp_index(&arg(&args, 0), len, 0, true);
    let end = clamp_index(&arg(&args, 1), len, len, true);
    if start >= end {
        return Ok(JsValue::from(""));
    }
    Ok(JsValue::String(s[start..end].iter().collect()))
}

fn string_index_of(this: JsValue, args: Vec<JsValue>) -> ValueResult {
    let s = this_string(&this)?;
    let needle = to_string(&arg(&args, 0));
    let from = clamp_index(&arg(&args, 1), s.chars().count(), 0, false);
    let start = byte_offset(&s, from);
    let found = s[start..]
        .find(&needle)
        .map(|b| char_offset(&s, start + b) as f64);
    Ok(JsValue::from(found.unwrap_or(-1.0)))
}

fn string_last_index_of(this: JsValue, args: Vec<JsValue>) -> ValueResult {
    let s = this_string(&this)?;
    let needle = to_string(&arg(&args, 0));
    let found = s.rfind(&needle).map(|b| char_offset(&s, b) as f64);
    Ok(JsValue::from(found.unwrap_or(-1.0)))
}

fn string_includes(this: JsValue, args: Vec<JsValue>) -> ValueResult {
    let s = this_string(&this)?;
    let needle = to_string(&arg(&args, 0));
    let from = clamp_index(&arg(&args, 1), s.chars().count(), 0, false);
    Ok(JsValue::Boolean(s[byte_offset(&s, from)..].contains(&needle)))
}

fn string_starts_with(this: JsValue, args: Vec<JsValue>) -> ValueResult {
    let s = this_string(&this)?;
    let needle = to_string(&arg(&args, 0));
    let from = clamp_index(&arg(&args, 1), s.chars().count(), 0, false);
    Ok(JsValue::Boolean(
        s[byte_offset(&s, from)..].starts_with(&needle),
    ))
}

fn string_ends_with(this: JsValue, args: Vec<JsValue>) -> ValueResult {
    let s = this_string(&this)?;
    let needle = to_string(&arg(&args, 0));
    let len = s.chars().count();
    let end = clamp_index(&arg(&args, 1), len, len, false);
    Ok(JsValue::Boolean(s[..byte_offset(&s, end)].ends_with(&needle)))
}

fn string_split(this: JsValue, args: Vec<JsValue>) -> ValueResult {
    let s = this_string(&this)?;
    let limit = match arg(&args, 1) {
        JsValue::Undefined => usize::MAX,
        other => to_number(&other).max(0.0) as usize,
    };
    let parts: Vec<JsValue> = match arg(&args, 0) {
        JsValue::Undefined => vec![JsValue::String(s)],
        separator => {
            let separator = to_string(&separator);
            if separator.is_empty() {
                s.chars().map(|c| JsValue::String(c.to_string())).collect()
            } else {
                s.split(separator.as_str())
                    .map(|p| JsValue::String(p.to_string()))
                    .collect()
            }
        }
    };
    Ok(new_array(parts.into_iter().take(limit).collect()))
}

fn string_trim(this: JsValue, _args: Vec<JsValue>) -> ValueResult {
    Ok(JsValue::from(this_string(&this)?.trim()))
}

fn string_trim_start(this: JsValue, _args: Vec<JsValue>) -> ValueResult {
    Ok(JsValue::from(this_string(&this)?.trim_start()))
}

fn string_trim_end(this: JsValue, _args: Vec<JsValue>) -> ValueResult {
    Ok(JsValue::from(this_string(&this)?.trim_end()))
}

fn string_to_upper_case(this: JsValue, _args: Vec<JsValue>) -> ValueResult {
    Ok(JsValue::String(this_string(&this)?.to_uppercase()))
}

fn string_to_lower_case(this: JsValue, _args: Vec<JsValue>) -> ValueResult {
    Ok(JsValue::String(this_string(&this)?.to_lowercase()))
}

fn string_repeat(this: JsValue, args: Vec<JsValue>) -> ValueResult {
    let s = this_string(&this)?;
    let count = to_number(&arg(&args, 0));
    let count = if count.is_nan() { 0.0 } else { count.trunc() };
    if count < 0.0 || count.is_infinite() {
        return Err(JErrorType::RangeError(format!(
            "Invalid count value: {}",
            to_string(&JsValue::from(count))
        )));
    }
    if s.is_empty() {
        return Ok(JsValue::String(s));
    }
    if count * s.len() as f64 > MAX_STRING_LENGTH as f64 {
        return Err(JErrorType::RangeError("Invalid string length".to_string()));
    }
    Ok(JsValue::String(s.repeat(count as usize)))
}

fn padding(s: &str, args: &[JsValue]) -> Result<String, JErrorType> {
    let target = to_number(&arg(args, 0));
    let target = if target.is_nan() { 0.0 } else { target.max(0.0) };
    if target > MAX_STRING_LENGTH as f64 {
        return Err(JErrorType::RangeError("Invalid string length".to_string()));
    }
    let target = target as usize;
    let filler = match arg(args, 1) {
        JsValue::Undefined => " ".to_string(),
        other => to_string(&other),
    };
    let len = s.chars().count();
    if target <= len || filler.is_empty() {
        return Ok(String::new());
    }
    Ok(filler.chars().cycle().take(target - len).collect())
}

fn string_pad_start(this: JsValue, args: Vec<JsValue>) -> ValueResult {
    let s = this_string(&this)?;
    Ok(JsValue::String(format!("{}{}", padding(&s, &args)?, s)))
}

fn string_pad_end(this: JsValue, args: Vec<JsValue>) -> ValueResult {
    let s = this_string(&this)?;
    Ok(JsValue::String(format!("{}{}", s, padding(&s, &args)?)))
}

fn string_replace(this: JsValue, args: Vec<JsValue>) -> ValueResult {
    let s = this_string(&this)?;
    let pattern = to_string(&arg(&args, 0));
    let replacement = to_string(&arg(&args, 1));
    Ok(JsValue::String(s.replacen(&pattern, &replacement, 1)))
}

fn string_replace_all(this: JsValue, args: Vec<JsValue>) -> ValueResult {
    let s = this_string(&this)?;
    let pattern = to_string(&arg(&args, 0));
    let replacement = to_string(&arg(&args, 1));
    Ok(JsValue::String(s.replace(&pattern, &replacement)))
}

fn string_concat(this: JsValue, args: Vec<JsValue>) -> ValueResult {
    let mut s = this_string(&this)?;
    for a in &args {
        let part = to_string(a);
        check_string_length(s.len() + part.len())?;
        s.push_str(&part);
    }
    Ok(JsValue::String(s))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(f: fn(JsValue, Vec<JsValue>) -> ValueResult, this: &str, args: Vec<JsValue>) -> JsValue {
        f(JsValue::from(this), args).unwrap()
    }

    #[test]
    fn test_slicing() {
        assert_eq!(
            call(string_slice, "plugin", vec![JsValue::from(-3)]),
            JsValue::from("gin")
        );
        assert_eq!(
            call(string_substring, "plugin", vec![JsValue::from(4), JsValue::from(1)]),
            JsValue::from("lug")
        );
    }

    #[test]
    fn test_padding_and_search() {
        assert_eq!(
            call(string_pad_start, "7", vec![JsValue::from(3), JsValue::from("0")]),
            JsValue::from("007")
        );
        assert_eq!(
            call(string_index_of, "a.b.c", vec![JsValue::from("."), JsValue::from(2)]),
            JsValue::from(3)
        );
        assert_eq!(
            call(string_replace, "a-b-c", vec![JsValue::from("-"), JsValue::from("+")]),
            JsValue::from("a+b-c")
        );
    }
}
