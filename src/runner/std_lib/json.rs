//! JSON built-in object, backed by `serde_json`.
//!
//! [`to_json`] and [`from_json`] are also used by the resolver to turn JSON
//! documents into runtime values.

use std::rc::Rc;

use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::{Map, Number, Value};

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::object::{new_array, object_from_entries, ObjectType};
use crate::runner::ds::operations::object::{get_own, own_keys, unwrap_proxy};
use crate::runner::ds::operations::type_conversion::to_string;
use crate::runner::ds::realm::Realm;
use crate::runner::ds::value::JsValue;
use crate::runner::eval::ValueResult;

use super::core::{arg, BuiltInObject};

/// Largest integer that survives the trip through `f64`.
const MAX_SAFE_INTEGER: f64 = 9007199254740991.0;

/// Register the JSON object.
pub fn register(realm: &Realm) {
    BuiltInObject::new("JSON")
        .add_method("parse", json_parse)
        .add_method("stringify", json_stringify)
        .install(realm);
}

/// Converts a parsed JSON document into a runtime value.
pub fn from_json(value: &Value) -> JsValue {
    match value {
        Value::Null => JsValue::Null,
        Value::Bool(b) => JsValue::Boolean(*b),
        Value::Number(n) => JsValue::Number(n.as_f64().unwrap_or(f64::NAN)),
        Value::String(s) => JsValue::String(s.clone()),
        Value::Array(items) => new_array(items.iter().map(from_json).collect()),
        Value::Object(map) => object_from_entries(
            map.iter()
                .map(|(k, v)| (k.clone(), from_json(v)))
                .collect::<Vec<_>>(),
        ),
    }
}

/// Converts a runtime value into JSON. `None` stands for values JSON cannot
/// represent (`undefined`, functions), which are dropped from objects and
/// become `null` inside arrays.
pub fn to_json(value: &JsValue) -> Result<Option<Value>, JErrorType> {
    to_json_inner(value, &mut vec![])
}

fn to_json_inner(
    value: &JsValue,
    stack: &mut Vec<*const std::cell::RefCell<ObjectType>>,
) -> Result<Option<Value>, JErrorType> {
    Ok(Some(match value {
        JsValue::Undefined => return Ok(None),
        JsValue::Null => Value::Null,
        JsValue::Boolean(b) => Value::Bool(*b),
        JsValue::String(s) => Value::String(s.clone()),
        JsValue::Number(n) => number_to_json(*n),
        JsValue::Object(_) => {
            let target = unwrap_proxy(value);
            let o = match target.as_object() {
                Some(o) => o.clone(),
                None => return to_json_inner(&target, stack),
            };
            let ptr = Rc::as_ptr(&o);
            if stack.contains(&ptr) {
                return Err(JErrorType::TypeError(
                    "Converting circular structure to JSON".to_string(),
                ));
            }
            if o.borrow().is_callable() {
                return Ok(None);
            }
            let elements = match &*o.borrow() {
                ObjectType::Array(a) => Some(a.elements.clone()),
                _ => None,
            };
            stack.push(ptr);
            let json = match elements {
                Some(elements) => {
                    let mut items = Vec::with_capacity(elements.len());
                    for e in &elements {
                        items.push(to_json_inner(e, stack)?.unwrap_or(Value::Null));
                    }
                    Value::Array(items)
                }
                None => {
                    let mut map = Map::new();
                    for key in own_keys(&target) {
                        let v = get_own(&target, &key).unwrap_or(JsValue::Undefined);
                        if let Some(json) = to_json_inner(&v, stack)? {
                            map.insert(key, json);
                        }
                    }
                    Value::Object(map)
                }
            };
            stack.pop();
            json
        }
    }))
}

fn number_to_json(n: f64) -> Value {
    if n.is_finite() && n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER {
        Value::from(n as i64)
    } else {
        Number::from_f64(n).map(Value::Number).unwrap_or(Value::Null)
    }
}

fn json_parse(_this: JsValue, args: Vec<JsValue>) -> ValueResult {
    let text = to_string(&arg(&args, 0));
    let value: Value = serde_json::from_str(&text)
        .map_err(|e| JErrorType::SyntaxError(format!("JSON.parse: {}", e)))?;
    Ok(from_json(&value))
}

/// `JSON.stringify(value, replacer, space)`; the replacer is not supported.
fn json_stringify(_this: JsValue, args: Vec<JsValue>) -> ValueResult {
    let json = match to_json(&arg(&args, 0))? {
        Some(json) => json,
        None => return Ok(JsValue::Undefined),
    };
    let indent = match arg(&args, 2) {
        JsValue::Number(n) => " ".repeat(n.clamp(0.0, 10.0) as usize),
        JsValue::String(s) => s.chars().take(10).collect(),
        _ => String::new(),
    };
    let text = if indent.is_empty() {
        serde_json::to_string(&json)
            .map_err(|e| JErrorType::TypeError(e.to_string()))?
    } else {
        let mut buf = Vec::new();
        let mut serializer =
            serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(indent.as_bytes()));
        json.serialize(&mut serializer)
            .map_err(|e| JErrorType::TypeError(e.to_string()))?;
        String::from_utf8(buf).map_err(|e| JErrorType::TypeError(e.to_string()))?
    };
    Ok(JsValue::String(text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::ds::object::new_object;
    use crate::runner::ds::operations::object::set;

    fn stringify(v: JsValue) -> JsValue {
        json_stringify(JsValue::Undefined, vec![v]).unwrap()
    }

    #[test]
    fn test_stringify_skips_unrepresentable_values() {
        let o = object_from_entries(vec![
            ("a", JsValue::from(1)),
            ("b", JsValue::Undefined),
            ("c", new_array(vec![JsValue::Undefined, JsValue::from(1.5)])),
        ]);
        assert_eq!(stringify(o), JsValue::from(r#"{"a":1,"c":[null,1.5]}"#));
        assert_eq!(stringify(JsValue::Undefined), JsValue::Undefined);
        assert_eq!(stringify(JsValue::from(f64::NAN)), JsValue::from("null"));
    }

    #[test]
    fn test_stringify_detects_cycles() {
        let o = new_object();
        set(&o, "self", o.clone()).unwrap();
        assert!(matches!(
            json_stringify(JsValue::Undefined, vec![o]),
            Err(JErrorType::TypeError(_))
        ));
    }

    #[test]
    fn test_parse_keeps_key_order() {
        let parsed = json_parse(JsValue::Undefined, vec![JsValue::from(r#"{"z":1,"a":[true,null]}"#)]).unwrap();
        assert_eq!(own_keys(&parsed), vec!["z".to_string(), "a".to_string()]);
        assert!(matches!(
            json_parse(JsValue::Undefined, vec![JsValue::from("{")]),
            Err(JErrorType::SyntaxError(_))
        ));
    }

    #[test]
    fn test_pretty_print() {
        let o = object_from_entries(vec![("a", JsValue::from(1))]);
        let text = json_stringify(JsValue::Undefined, vec![o, JsValue::Undefined, JsValue::from(2)]).unwrap();
        assert_eq!(text, JsValue::from("{\n  \"a\": 1\n}"));
    }
}
