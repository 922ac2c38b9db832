use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::function_object::FunctionObject;
use crate::runner::ds::operations::type_conversion::to_number;
use crate::runner::ds::value::JsValue;
use crate::runner::plugin::token_proxy::TokenProxy;

pub type JsObjectType = Rc<RefCell<ObjectType>>;

/// Property storage shared by every object kind. Keys keep insertion order.
#[derive(Default)]
pub struct ObjectBase {
    keys: Vec<String>,
    properties: HashMap<String, JsValue>,
}
impl ObjectBase {
    pub fn new() -> Self {
        ObjectBase::default()
    }

    pub fn get(&self, key: &str) -> Option<JsValue> {
        self.properties.get(key).cloned()
    }

    pub fn has(&self, key: &str) -> bool {
        self.properties.contains_key(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: JsValue) {
        let key = key.into();
        if !self.properties.contains_key(&key) {
            self.keys.push(key.clone());
        }
        self.properties.insert(key, value);
    }

    pub fn delete(&mut self, key: &str) -> bool {
        if self.properties.remove(key).is_some() {
            self.keys.retain(|k| k != key);
        }
        true
    }

    pub fn keys(&self) -> Vec<String> {
        self.keys.clone()
    }
}

pub struct ArrayObject {
    pub elements: Vec<JsValue>,
    pub base: ObjectBase,
}

pub enum ObjectType {
    Ordinary(ObjectBase),
    Array(ArrayObject),
    Function(FunctionObject),
    Error(ObjectBase),
    Proxy(TokenProxy),
}
impl ObjectType {
    pub fn is_callable(&self) -> bool {
        matches!(self, ObjectType::Function(_))
    }

    fn base(&self) -> Option<&ObjectBase> {
        match self {
            ObjectType::Ordinary(b) | ObjectType::Error(b) => Some(b),
            ObjectType::Array(a) => Some(&a.base),
            ObjectType::Function(f) => Some(&f.base),
            ObjectType::Proxy(_) => None,
        }
    }

    fn base_mut(&mut self) -> Option<&mut ObjectBase> {
        match self {
            ObjectType::Ordinary(b) | ObjectType::Error(b) => Some(b),
            ObjectType::Array(a) => Some(&mut a.base),
            ObjectType::Function(f) => Some(&mut f.base),
            ObjectType::Proxy(_) => None,
        }
    }

    /// Own property lookup. Proxies have no own properties; reads through
    /// them go through `operations::object::get`.
    pub fn get_own_property(&self, key: &str) -> Option<JsValue> {
        match self {
            ObjectType::Array(a) => {
                if key == "length" {
                    return Some(JsValue::Number(a.elements.len() as f64));
                }
                match array_index(key) {
                    Some(idx) => a.elements.get(idx).cloned(),
                    None => a.base.get(key),
                }
            }
            ObjectType::Function(f) if key == "name" && !f.base.has(key) => {
                Some(JsValue::String(f.name.clone()))
            }
            other => other.base().and_then(|b| b.get(key)),
        }
    }

    pub fn has_own_property(&self, key: &str) -> bool {
        self.get_own_property(key).is_some()
    }

    /// Writes an own property. Growing an array past what it can hold is a
    /// `RangeError`; objects without property storage refuse with a
    /// `TypeError`.
    pub fn set_own_property(&mut self, key: &str, value: JsValue) -> Result<(), JErrorType> {
        if let ObjectType::Array(a) = self {
            if key == "length" {
                // Objects are not converted here; `self` may be the value.
                let n = match &value {
                    JsValue::Object(_) => f64::NAN,
                    primitive => to_number(primitive),
                };
                let len = array_length(n)?;
                a.elements.resize(len, JsValue::Undefined);
                return Ok(());
            }
            if let Some(idx) = array_index(key) {
                if idx >= a.elements.len() {
                    let len = array_length((idx + 1) as f64)?;
                    a.elements.resize(len, JsValue::Undefined);
                }
                a.elements[idx] = value;
                return Ok(());
            }
        }
        match self.base_mut() {
            Some(b) => {
                b.set(key, value);
                Ok(())
            }
            None => Err(JErrorType::TypeError(format!(
                "Cannot assign to property '{}'",
                key
            ))),
        }
    }

    pub fn delete_own_property(&mut self, key: &str) -> bool {
        if let ObjectType::Array(a) = self {
            if let Some(idx) = array_index(key) {
                if idx < a.elements.len() {
                    a.elements[idx] = JsValue::Undefined;
                }
                return true;
            }
        }
        match self.base_mut() {
            Some(b) => b.delete(key),
            None => false,
        }
    }

    /// Enumerable own keys in iteration order.
    pub fn own_keys(&self) -> Vec<String> {
        match self {
            ObjectType::Array(a) => (0..a.elements.len())
                .map(|i| i.to_string())
                .chain(a.base.keys())
                .collect(),
            ObjectType::Proxy(_) => vec![],
            other => other.base().map(|b| b.keys()).unwrap_or_default(),
        }
    }
}

/// Largest length an array may have.
pub const MAX_ARRAY_LENGTH: f64 = 4_294_967_295.0;

/// Elements are stored densely, so lengths past this are refused instead of
/// allocated.
pub const MAX_DENSE_LENGTH: usize = 1 << 24;

/// Validates a requested array length.
pub fn array_length(n: f64) -> Result<usize, JErrorType> {
    if !(0.0..=MAX_ARRAY_LENGTH).contains(&n) || n.fract() != 0.0 || n as usize > MAX_DENSE_LENGTH {
        return Err(JErrorType::RangeError("Invalid array length".to_string()));
    }
    Ok(n as usize)
}

/// Parses a canonical array index (`"0"`, `"12"`, not `"01"`). Indices stop
/// one short of the maximum length; larger keys are ordinary properties.
pub fn array_index(key: &str) -> Option<usize> {
    if key.is_empty() || (key.len() > 1 && key.starts_with('0')) {
        return None;
    }
    if !key.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let idx: u64 = key.parse().ok()?;
    if idx as f64 >= MAX_ARRAY_LENGTH {
        return None;
    }
    usize::try_from(idx).ok()
}

pub fn wrap_object(o: ObjectType) -> JsValue {
    JsValue::Object(Rc::new(RefCell::new(o)))
}

pub fn new_object() -> JsValue {
    wrap_object(ObjectType::Ordinary(ObjectBase::new()))
}

pub fn object_from_entries<K: Into<String>>(entries: impl IntoIterator<Item = (K, JsValue)>) -> JsValue {
    let mut base = ObjectBase::new();
    for (k, v) in entries {
        base.set(k, v);
    }
    wrap_object(ObjectType::Ordinary(base))
}

pub fn new_array(elements: Vec<JsValue>) -> JsValue {
    wrap_object(ObjectType::Array(ArrayObject {
        elements,
        base: ObjectBase::new(),
    }))
}

pub fn new_error(name: &str, message: &str) -> JsValue {
    let mut base = ObjectBase::new();
    base.set("name", JsValue::from(name));
    base.set("message", JsValue::from(message));
    wrap_object(ObjectType::Error(base))
}

/// Copies the elements out of an array value.
pub fn array_elements(value: &JsValue) -> Option<Vec<JsValue>> {
    match value {
        JsValue::Object(o) => match &*o.borrow() {
            ObjectType::Array(a) => Some(a.elements.clone()),
            _ => None,
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_keep_insertion_order() {
        let mut base = ObjectBase::new();
        base.set("b", JsValue::from(1));
        base.set("a", JsValue::from(2));
        base.set("b", JsValue::from(3));
        assert_eq!(base.keys(), vec!["b".to_string(), "a".to_string()]);
        assert_eq!(base.get("b"), Some(JsValue::from(3)));
    }

    #[test]
    fn test_array_properties() {
        let array = new_array(vec![JsValue::from(1), JsValue::from(2)]);
        let o = array.as_object().unwrap();
        assert_eq!(o.borrow().get_own_property("length"), Some(JsValue::from(2)));
        assert!(o.borrow_mut().set_own_property("3", JsValue::from("x")).is_ok());
        assert_eq!(o.borrow().get_own_property("2"), Some(JsValue::Undefined));
        assert_eq!(o.borrow().own_keys(), vec!["0", "1", "2", "3"]);
        assert_eq!(o.borrow().get_own_property("01"), None);
    }

    #[test]
    fn test_array_length_limits() {
        let array = new_array(vec![]);
        let o = array.as_object().unwrap();
        let too_long = o.borrow_mut().set_own_property("length", JsValue::Number(2f64.powi(60)));
        assert!(matches!(too_long, Err(JErrorType::RangeError(_))));
        let fractional = o.borrow_mut().set_own_property("length", JsValue::Number(1.5));
        assert!(matches!(fractional, Err(JErrorType::RangeError(_))));
        assert!(matches!(
            o.borrow_mut().set_own_property("16777216", JsValue::from(1)),
            Err(JErrorType::RangeError(_))
        ));
        assert!(o.borrow().own_keys().is_empty());

        // Past the index range the key is a plain property.
        assert!(o.borrow_mut().set_own_property("4294967295", JsValue::from(1)).is_ok());
        assert_eq!(o.borrow().get_own_property("length"), Some(JsValue::from(0)));
    }
}
