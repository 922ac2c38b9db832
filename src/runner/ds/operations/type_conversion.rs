use crate::parser::util::{format_number, parse_number};
use crate::runner::ds::error::JErrorType;
use crate::runner::ds::object::ObjectType;
use crate::runner::ds::value::JsValue;

pub const TYPE_STR_UNDEFINED: &str = "undefined";
pub const TYPE_STR_NULL: &str = "null";
pub const TYPE_STR_BOOLEAN: &str = "boolean";
pub const TYPE_STR_STRING: &str = "string";
pub const TYPE_STR_NUMBER: &str = "number";
pub const TYPE_STR_OBJECT: &str = "object";
pub const TYPE_STR_FUNCTION: &str = "function";

/// Result of the `typeof` operator.
pub fn get_type(a: &JsValue) -> &'static str {
    match a {
        JsValue::Undefined => TYPE_STR_UNDEFINED,
        JsValue::Null => TYPE_STR_OBJECT,
        JsValue::Boolean(_) => TYPE_STR_BOOLEAN,
        JsValue::String(_) => TYPE_STR_STRING,
        JsValue::Number(_) => TYPE_STR_NUMBER,
        JsValue::Object(o) => match &*o.borrow() {
            ObjectType::Function(_) => TYPE_STR_FUNCTION,
            ObjectType::Proxy(p) => get_type(p.target()),
            _ => TYPE_STR_OBJECT,
        },
    }
}

pub fn to_boolean(v: &JsValue) -> bool {
    match v {
        JsValue::Undefined | JsValue::Null => false,
        JsValue::Boolean(b) => *b,
        JsValue::Number(n) => !(*n == 0.0 || n.is_nan()),
        JsValue::String(s) => !s.is_empty(),
        JsValue::Object(_) => true,
    }
}

pub fn to_number(v: &JsValue) -> f64 {
    match v {
        JsValue::Undefined => f64::NAN,
        JsValue::Null => 0.0,
        JsValue::Boolean(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        JsValue::Number(n) => *n,
        JsValue::String(s) => string_to_number(s),
        JsValue::Object(_) => string_to_number(&to_string(v)),
    }
}

fn string_to_number(s: &str) -> f64 {
    let s = s.trim();
    if s.is_empty() {
        return 0.0;
    }
    match s {
        "Infinity" | "+Infinity" => f64::INFINITY,
        "-Infinity" => f64::NEG_INFINITY,
        _ => {
            let (sign, digits) = match s.strip_prefix('-') {
                Some(rest) => (-1.0, rest),
                None => (1.0, s.strip_prefix('+').unwrap_or(s)),
            };
            if digits.chars().any(|c| c.is_ascii_alphabetic() && !"eExXabcdefABCDEF".contains(c)) {
                return f64::NAN;
            }
            parse_number(digits).map(|n| sign * n).unwrap_or(f64::NAN)
        }
    }
}

/// ToInt32, used by the bitwise operators.
pub fn to_int32(v: &JsValue) -> i32 {
    let n = to_number(v);
    if !n.is_finite() {
        return 0;
    }
    (n.trunc() as i64 & 0xffff_ffff) as u32 as i32
}

pub fn to_string(v: &JsValue) -> String {
    match v {
        JsValue::Undefined => TYPE_STR_UNDEFINED.to_string(),
        JsValue::Null => TYPE_STR_NULL.to_string(),
        JsValue::Boolean(b) => b.to_string(),
        JsValue::Number(n) => format_number(*n),
        JsValue::String(s) => s.clone(),
        JsValue::Object(o) => match &*o.borrow() {
            ObjectType::Array(a) => a
                .elements
                .iter()
                .map(|e| if e.is_nullish() { String::new() } else { to_string(e) })
                .collect::<Vec<_>>()
                .join(","),
            ObjectType::Function(f) => format!("function {}() {{ [native code] }}", f.name),
            ObjectType::Error(base) => {
                let name = base.get("name").map(|n| to_string(&n)).unwrap_or_default();
                let message = base.get("message").map(|m| to_string(&m)).unwrap_or_default();
                if message.is_empty() {
                    name
                } else {
                    format!("{}: {}", name, message)
                }
            }
            ObjectType::Proxy(p) => to_string(p.target()),
            ObjectType::Ordinary(_) => "[object Object]".to_string(),
        },
    }
}

/// Converts a value used as a property key.
pub fn to_property_key(v: &JsValue) -> String {
    to_string(v)
}

pub fn to_object_or_throw(v: &JsValue, key: &str) -> Result<(), JErrorType> {
    if v.is_nullish() {
        Err(JErrorType::TypeError(format!(
            "Cannot read properties of {} (reading '{}')",
            to_string(v),
            key
        )))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::ds::object::{new_array, new_object};

    #[test]
    fn test_to_number() {
        assert_eq!(to_number(&JsValue::from(" 42 ")), 42.0);
        assert_eq!(to_number(&JsValue::from("")), 0.0);
        assert_eq!(to_number(&JsValue::from("0x10")), 16.0);
        assert!(to_number(&JsValue::from("4px")).is_nan());
        assert!(to_number(&JsValue::Undefined).is_nan());
        assert_eq!(to_number(&JsValue::Null), 0.0);
    }

    #[test]
    fn test_to_string() {
        assert_eq!(to_string(&JsValue::from(1.0)), "1");
        assert_eq!(to_string(&new_object()), "[object Object]");
        assert_eq!(
            to_string(&new_array(vec![JsValue::from(1), JsValue::Null, JsValue::from("a")])),
            "1,,a"
        );
    }

    #[test]
    fn test_to_int32() {
        assert_eq!(to_int32(&JsValue::from(4294967297.0)), 1);
        assert_eq!(to_int32(&JsValue::from(-1.5)), -1);
    }
}
