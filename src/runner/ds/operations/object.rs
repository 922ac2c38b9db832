use crate::runner::ds::error::JErrorType;
use crate::runner::ds::object::{array_index, JsObjectType, ObjectType};
use crate::runner::ds::operations::type_conversion::{get_type, to_string};
use crate::runner::ds::realm::Realm;
use crate::runner::ds::value::JsValue;
use crate::runner::eval::types::ValueResult;

/// `value[key]`, including the built-in prototypes of the realm.
pub fn get(realm: &Realm, value: &JsValue, key: &str) -> ValueResult {
    match value {
        JsValue::Undefined | JsValue::Null => Err(JErrorType::TypeError(format!(
            "Cannot read properties of {} (reading '{}')",
            to_string(value),
            key
        ))),
        JsValue::String(s) => {
            if key == "length" {
                return Ok(JsValue::Number(s.chars().count() as f64));
            }
            if let Some(idx) = array_index(key) {
                return Ok(s
                    .chars()
                    .nth(idx)
                    .map(|c| JsValue::String(c.to_string()))
                    .unwrap_or(JsValue::Undefined));
            }
            Ok(lookup_prototypes(realm, Some(&realm.intrinsics.string_prototype), key))
        }
        JsValue::Number(_) => Ok(lookup_prototypes(
            realm,
            Some(&realm.intrinsics.number_prototype),
            key,
        )),
        JsValue::Boolean(_) => Ok(lookup_prototypes(realm, None, key)),
        JsValue::Object(o) => get_from_object(realm, o, key),
    }
}

fn get_from_object(realm: &Realm, o: &JsObjectType, key: &str) -> ValueResult {
    let target = {
        let borrowed = o.borrow();
        match &*borrowed {
            ObjectType::Proxy(p) => {
                if let Some(token) = p.lookup(key) {
                    return Ok(token);
                }
                p.target().clone()
            }
            other => {
                if let Some(v) = other.get_own_property(key) {
                    return Ok(v);
                }
                let proto = realm.intrinsics.prototype_for(other);
                return Ok(lookup_prototypes(realm, proto, key));
            }
        }
    };
    get(realm, &target, key)
}

fn lookup_prototypes(realm: &Realm, kind_prototype: Option<&JsObjectType>, key: &str) -> JsValue {
    kind_prototype
        .into_iter()
        .chain(std::iter::once(&realm.intrinsics.object_prototype))
        .find_map(|p| p.borrow().get_own_property(key))
        .unwrap_or(JsValue::Undefined)
}

/// Own property read without the prototype fallback. Token proxies answer
/// from the registry first, then from their target.
pub fn get_own(value: &JsValue, key: &str) -> Option<JsValue> {
    match value {
        JsValue::Object(o) => {
            let target = {
                let borrowed = o.borrow();
                match &*borrowed {
                    ObjectType::Proxy(p) => {
                        if let Some(token) = p.lookup(key) {
                            return Some(token);
                        }
                        p.target().clone()
                    }
                    other => return other.get_own_property(key),
                }
            };
            get_own(&target, key)
        }
        JsValue::String(s) => array_index(key)
            .and_then(|idx| s.chars().nth(idx))
            .map(|c| JsValue::String(c.to_string())),
        _ => None,
    }
}

/// `value[key] = v`. Writes through a token proxy land on the wrapped value.
pub fn set(value: &JsValue, key: &str, v: JsValue) -> Result<(), JErrorType> {
    match value {
        JsValue::Object(o) => {
            let target = {
                let mut borrowed = o.borrow_mut();
                match &mut *borrowed {
                    ObjectType::Proxy(p) => p.target().clone(),
                    other => return other.set_own_property(key, v),
                }
            };
            set(&target, key, v)
        }
        JsValue::Undefined | JsValue::Null => Err(JErrorType::TypeError(format!(
            "Cannot set properties of {} (setting '{}')",
            to_string(value),
            key
        ))),
        _ => Err(JErrorType::TypeError(format!(
            "Cannot create property '{}' on {} '{}'",
            key,
            get_type(value),
            to_string(value)
        ))),
    }
}

/// The `in` operator.
pub fn has_property(realm: &Realm, value: &JsValue, key: &str) -> Result<bool, JErrorType> {
    let o = match value {
        JsValue::Object(o) => o,
        _ => {
            return Err(JErrorType::TypeError(format!(
                "Cannot use 'in' operator to search for '{}' in {}",
                key,
                to_string(value)
            )))
        }
    };
    let target = {
        let borrowed = o.borrow();
        match &*borrowed {
            ObjectType::Proxy(p) => {
                if p.lookup(key).is_some() {
                    return Ok(true);
                }
                p.target().clone()
            }
            other => {
                if other.has_own_property(key) {
                    return Ok(true);
                }
                let proto = realm.intrinsics.prototype_for(other);
                return Ok(!matches!(
                    lookup_prototypes(realm, proto, key),
                    JsValue::Undefined
                ));
            }
        }
    };
    match target {
        JsValue::Object(_) => has_property(realm, &target, key),
        _ => Ok(false),
    }
}

pub fn delete_property(value: &JsValue, key: &str) -> bool {
    match value {
        JsValue::Object(o) => {
            let target = {
                let mut borrowed = o.borrow_mut();
                match &mut *borrowed {
                    ObjectType::Proxy(p) => p.target().clone(),
                    other => return other.delete_own_property(key),
                }
            };
            delete_property(&target, key)
        }
        _ => true,
    }
}

/// Enumerable own keys, as seen by `for..in` and `Object.keys`.
pub fn own_keys(value: &JsValue) -> Vec<String> {
    match value {
        JsValue::Object(o) => {
            let target = {
                let borrowed = o.borrow();
                match &*borrowed {
                    ObjectType::Proxy(p) => p.target().clone(),
                    other => return other.own_keys(),
                }
            };
            own_keys(&target)
        }
        JsValue::String(s) => (0..s.chars().count()).map(|i| i.to_string()).collect(),
        _ => vec![],
    }
}

/// Values produced by `for..of` and spread.
pub fn iterate(value: &JsValue) -> Result<Vec<JsValue>, JErrorType> {
    match value {
        JsValue::String(s) => Ok(s.chars().map(|c| JsValue::String(c.to_string())).collect()),
        JsValue::Object(o) => {
            let target = {
                let borrowed = o.borrow();
                match &*borrowed {
                    ObjectType::Array(a) => return Ok(a.elements.clone()),
                    ObjectType::Proxy(p) => p.target().clone(),
                    _ => return Err(not_iterable(value)),
                }
            };
            iterate(&target)
        }
        _ => Err(not_iterable(value)),
    }
}

fn not_iterable(value: &JsValue) -> JErrorType {
    JErrorType::TypeError(format!("{} is not iterable", to_string(value)))
}

/// Strips token proxies off a value.
pub fn unwrap_proxy(value: &JsValue) -> JsValue {
    if let JsValue::Object(o) = value {
        if let ObjectType::Proxy(p) = &*o.borrow() {
            return unwrap_proxy(p.target());
        }
    }
    value.clone()
}
