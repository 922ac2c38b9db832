use std::rc::Rc;

use crate::runner::ds::object::{wrap_object, ObjectType};
use crate::runner::ds::value::JsValue;

use super::registry::TokenRegistry;

/// A module value seen through the token registry.
///
/// Attribute reads consult the registry first and fall back to the wrapped
/// value. Writes, enumeration and calls go straight to the target.
pub struct TokenProxy {
    module: String,
    target: JsValue,
    tokens: Rc<TokenRegistry>,
}

impl TokenProxy {
    pub fn new(module: &str, target: JsValue, tokens: Rc<TokenRegistry>) -> Self {
        TokenProxy {
            module: module.to_string(),
            target,
            tokens,
        }
    }

    pub fn module(&self) -> &str {
        &self.module
    }

    pub fn target(&self) -> &JsValue {
        &self.target
    }

    /// Token registered for attribute `key` of this module.
    pub fn lookup(&self, key: &str) -> Option<JsValue> {
        self.tokens.lookup(&self.module, key)
    }
}

/// Wraps `value` so that reads see the tokens of `module`.
pub fn wrap_with_tokens(module: &str, value: JsValue, tokens: &Rc<TokenRegistry>) -> JsValue {
    wrap_object(ObjectType::Proxy(TokenProxy::new(module, value, tokens.clone())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::ds::object::object_from_entries;
    use crate::runner::ds::operations::object::{get_own, own_keys, set};

    fn registry() -> Rc<TokenRegistry> {
        let mut tokens = TokenRegistry::new();
        tokens.register("m", "a", JsValue::from("token"));
        Rc::new(tokens)
    }

    #[test]
    fn test_reads_prefer_tokens() {
        let target = object_from_entries(vec![("a", JsValue::from(1)), ("b", JsValue::from(2))]);
        let proxy = wrap_with_tokens("m", target, &registry());
        assert_eq!(get_own(&proxy, "a"), Some(JsValue::from("token")));
        assert_eq!(get_own(&proxy, "b"), Some(JsValue::from(2)));
        assert_eq!(get_own(&proxy, "c"), None);
    }

    #[test]
    fn test_writes_and_enumeration_reach_target() {
        let target = object_from_entries(vec![("a", JsValue::from(1))]);
        let proxy = wrap_with_tokens("m", target.clone(), &registry());
        set(&proxy, "c", JsValue::from(3)).unwrap();
        assert_eq!(get_own(&target, "c"), Some(JsValue::from(3)));
        assert_eq!(own_keys(&proxy), vec!["a".to_string(), "c".to_string()]);
    }
}
