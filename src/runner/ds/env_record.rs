use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::value::JsValue;

struct Binding {
    /// `None` until the declaration ran.
    value: Option<JsValue>,
    mutable: bool,
}

pub struct EnvironmentRecord {
    bindings: HashMap<String, Binding>,
    outer: Option<Environment>,
}

/// A shared handle to one scope of the lexical environment chain.
#[derive(Clone)]
pub struct Environment(Rc<RefCell<EnvironmentRecord>>);

impl Environment {
    pub fn new(outer: Option<Environment>) -> Self {
        Environment(Rc::new(RefCell::new(EnvironmentRecord {
            bindings: HashMap::new(),
            outer,
        })))
    }

    pub fn new_child(&self) -> Self {
        Environment::new(Some(self.clone()))
    }

    pub fn has_own_binding(&self, name: &str) -> bool {
        self.0.borrow().bindings.contains_key(name)
    }

    pub fn has_binding(&self, name: &str) -> bool {
        if self.has_own_binding(name) {
            return true;
        }
        match &self.0.borrow().outer {
            Some(outer) => outer.has_binding(name),
            None => false,
        }
    }

    /// Creates an uninitialized binding in this record.
    pub fn create_binding(&self, name: &str, mutable: bool) {
        self.0.borrow_mut().bindings.insert(
            name.to_string(),
            Binding {
                value: None,
                mutable,
            },
        );
    }

    /// Initializes a binding of this record, creating it if missing.
    pub fn initialize_binding(&self, name: &str, value: JsValue, mutable: bool) {
        self.0.borrow_mut().bindings.insert(
            name.to_string(),
            Binding {
                value: Some(value),
                mutable,
            },
        );
    }

    pub fn get_binding_value(&self, name: &str) -> Result<JsValue, JErrorType> {
        let record = self.0.borrow();
        match record.bindings.get(name) {
            Some(Binding { value: Some(v), .. }) => Ok(v.clone()),
            Some(Binding { value: None, .. }) => Err(JErrorType::ReferenceError(format!(
                "Cannot access '{}' before initialization",
                name
            ))),
            None => match &record.outer {
                Some(outer) => outer.get_binding_value(name),
                None => Err(JErrorType::ReferenceError(format!("{} is not defined", name))),
            },
        }
    }

    pub fn set_mutable_binding(&self, name: &str, value: JsValue) -> Result<(), JErrorType> {
        let mut record = self.0.borrow_mut();
        match record.bindings.get_mut(name) {
            Some(Binding { value: None, .. }) => Err(JErrorType::ReferenceError(format!(
                "Cannot access '{}' before initialization",
                name
            ))),
            Some(Binding { mutable: false, .. }) => Err(JErrorType::TypeError(
                "Assignment to constant variable.".to_string(),
            )),
            Some(binding) => {
                binding.value = Some(value);
                Ok(())
            }
            None => match &record.outer {
                Some(outer) => outer.set_mutable_binding(name, value),
                None => Err(JErrorType::ReferenceError(format!("{} is not defined", name))),
            },
        }
    }

    /// Copies the named bindings into a fresh sibling record. Used to give
    /// every loop iteration its own `let` bindings.
    pub fn copy_for_iteration(&self, names: &[String]) -> Environment {
        let record = self.0.borrow();
        let copy = Environment::new(record.outer.clone());
        for name in names {
            if let Some(binding) = record.bindings.get(name) {
                copy.0.borrow_mut().bindings.insert(
                    name.clone(),
                    Binding {
                        value: binding.value.clone(),
                        mutable: binding.mutable,
                    },
                );
            }
        }
        copy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_walks_outer_records() {
        let global = Environment::new(None);
        global.initialize_binding("a", JsValue::from(1), true);
        let inner = global.new_child();
        inner.initialize_binding("b", JsValue::from(2), false);
        assert_eq!(inner.get_binding_value("a").unwrap(), JsValue::from(1));
        inner.set_mutable_binding("a", JsValue::from(3)).unwrap();
        assert_eq!(global.get_binding_value("a").unwrap(), JsValue::from(3));
        assert!(matches!(
            inner.set_mutable_binding("b", JsValue::Null),
            Err(JErrorType::TypeError(_))
        ));
        assert!(matches!(
            inner.get_binding_value("c"),
            Err(JErrorType::ReferenceError(_))
        ));
    }

    #[test]
    fn test_uninitialized_binding() {
        let env = Environment::new(None);
        env.create_binding("x", false);
        assert!(matches!(
            env.get_binding_value("x"),
            Err(JErrorType::ReferenceError(m)) if m.contains("before initialization")
        ));
    }
}
