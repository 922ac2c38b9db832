//! Core types shared by the transpiler and the import resolver.

use serde::{Deserialize, Serialize};

/// Describes one import of a plugin.
///
/// Identity is structural: two descriptors naming the same import compare
/// equal. Descriptors are never mutated once produced; the `with_*` helpers
/// consume and return a new value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportStatement {
    /// Imported name. For named imports this is the attribute read from the
    /// module; for default and namespace imports it is the local binding.
    pub name: String,

    /// Local binding when it differs from `name`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,

    /// Module identifier as written in the source.
    pub module: String,

    /// `true` extracts attribute `name` from the module, `false` binds the
    /// whole module value.
    pub unpack: bool,

    /// The import only brings in types and is erased at runtime.
    #[serde(default)]
    pub is_type_only: bool,

    /// The import binds the module's default value.
    #[serde(default)]
    pub is_default: bool,
}

impl ImportStatement {
    /// `import { name } from "module"`
    pub fn named(module: impl Into<String>, name: impl Into<String>) -> Self {
        ImportStatement {
            name: name.into(),
            alias: None,
            module: module.into(),
            unpack: true,
            is_type_only: false,
            is_default: false,
        }
    }

    /// `import * as name from "module"`
    pub fn whole(module: impl Into<String>, name: impl Into<String>) -> Self {
        ImportStatement {
            unpack: false,
            ..ImportStatement::named(module, name)
        }
    }

    /// `import name from "module"`
    pub fn default_import(module: impl Into<String>, name: impl Into<String>) -> Self {
        ImportStatement {
            unpack: false,
            is_default: true,
            ..ImportStatement::named(module, name)
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        let alias = alias.into();
        self.alias = if alias == self.name { None } else { Some(alias) };
        self
    }

    pub fn with_type_only(mut self, is_type_only: bool) -> Self {
        self.is_type_only = is_type_only;
        self
    }

    /// Name the import is bound to inside the plugin.
    pub fn local_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }

    /// Attribute the resolver has to read from the module, if any.
    pub fn requested_attribute(&self) -> Option<&str> {
        if self.is_default {
            Some("default")
        } else if self.unpack {
            Some(&self.name)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structural_identity() {
        let a = ImportStatement::named("m", "x").with_alias("y");
        let b = ImportStatement::named("m", "x").with_alias("y");
        assert_eq!(a, b);
        assert_ne!(a, ImportStatement::named("m", "x"));
    }

    #[test]
    fn test_alias_equal_to_name_is_dropped() {
        let a = ImportStatement::named("m", "x").with_alias("x");
        assert_eq!(a.alias, None);
        assert_eq!(a.local_name(), "x");
    }

    #[test]
    fn test_requested_attribute() {
        assert_eq!(
            ImportStatement::named("m", "x").requested_attribute(),
            Some("x")
        );
        assert_eq!(
            ImportStatement::default_import("m", "d").requested_attribute(),
            Some("default")
        );
        assert_eq!(ImportStatement::whole("m", "ns").requested_attribute(), None);
    }

    #[test]
    fn test_serializes_with_camel_case_keys() {
        let json = serde_json::to_value(ImportStatement::named("m", "x")).unwrap();
        assert_eq!(json["isTypeOnly"], serde_json::Value::Bool(false));
        assert_eq!(json["unpack"], serde_json::Value::Bool(true));
        assert!(json.get("alias").is_none());
    }
}
