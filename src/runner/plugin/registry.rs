//! Host-provided modules and tokens.
//!
//! Both maps are filled by the host before plugins run and are read-only for
//! the resolver.

use std::collections::HashMap;

use crate::runner::ds::value::JsValue;

/// Injectable tokens, one table per module, addressed as
/// `"<module>:<attribute>"`.
///
/// A token shadows the attribute of the same name on the module it belongs
/// to, whatever strategy ends up providing that module. Module identifiers
/// may themselves contain `:`, so the two parts are never joined into one
/// key.
#[derive(Default)]
pub struct TokenRegistry {
    modules: HashMap<String, HashMap<String, JsValue>>,
}

impl TokenRegistry {
    pub fn new() -> Self {
        TokenRegistry::default()
    }

    pub fn register(&mut self, module: &str, attribute: &str, value: JsValue) {
        self.modules
            .entry(module.to_string())
            .or_default()
            .insert(attribute.to_string(), value);
    }

    pub fn lookup(&self, module: &str, attribute: &str) -> Option<JsValue> {
        self.modules.get(module)?.get(attribute).cloned()
    }

    /// Whether any token belongs to `module`.
    pub fn has_module(&self, module: &str) -> bool {
        self.modules.get(module).is_some_and(|tokens| !tokens.is_empty())
    }

    pub fn len(&self) -> usize {
        self.modules.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Modules the host provides directly, by identifier.
#[derive(Default)]
pub struct KnownModules {
    modules: HashMap<String, JsValue>,
}

impl KnownModules {
    pub fn new() -> Self {
        KnownModules::default()
    }

    pub fn register(&mut self, module: impl Into<String>, value: JsValue) {
        self.modules.insert(module.into(), value);
    }

    pub fn get(&self, module: &str) -> Option<JsValue> {
        self.modules.get(module).cloned()
    }

    pub fn contains(&self, module: &str) -> bool {
        self.modules.contains_key(module)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_lookup_is_per_module() {
        let mut tokens = TokenRegistry::new();
        tokens.register("ui", "Button", JsValue::from("token"));
        assert_eq!(tokens.lookup("ui", "Button"), Some(JsValue::from("token")));
        assert_eq!(tokens.lookup("uix", "Button"), None);
        assert!(tokens.has_module("ui"));
        assert!(!tokens.has_module("u"));
        assert_eq!(tokens.len(), 1);
    }

    #[test]
    fn test_module_names_with_colons_stay_apart() {
        let mut tokens = TokenRegistry::new();
        tokens.register("a:b", "c", JsValue::from("nested"));
        assert!(tokens.has_module("a:b"));
        assert!(!tokens.has_module("a"));
        assert_eq!(tokens.lookup("a", "b:c"), None);

        tokens.register("a", "b:c", JsValue::from("plain"));
        assert_eq!(tokens.lookup("a:b", "c"), Some(JsValue::from("nested")));
        assert_eq!(tokens.lookup("a", "b:c"), Some(JsValue::from("plain")));
        assert_eq!(tokens.len(), 2);
    }

    #[test]
    fn test_known_modules() {
        let mut known = KnownModules::new();
        known.register("lodash", JsValue::from(1));
        assert!(known.contains("lodash"));
        assert_eq!(known.get("lodash"), Some(JsValue::from(1)));
        assert_eq!(known.get("react"), None);
    }
}
