//! Core built-ins registration.
//!
//! Built-ins are described with [`BuiltInObject`] and installed into a
//! realm: static members land on the global binding, prototype members on
//! the realm intrinsic for the matching value kind.

use crate::runner::ds::function_object::{
    async_native_function, native_function, AsyncNativeFn, NativeFn,
};
use crate::runner::ds::object::{new_object, ObjectType};
use crate::runner::ds::operations::object::set;
use crate::runner::ds::realm::Realm;
use crate::runner::ds::value::JsValue;

use super::array;
use super::console;
use super::error;
use super::json;
use super::math;
use super::number;
use super::object;
use super::string;

/// Which realm intrinsic receives the prototype members of a built-in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PrototypeKind {
    Object,
    Array,
    String,
    Number,
    Function,
    Error,
}

/// Declarative description of one global built-in.
pub struct BuiltInObject {
    pub name: String,
    constructor: Option<NativeFn>,
    members: Vec<(String, JsValue)>,
    prototype: Option<PrototypeKind>,
    prototype_members: Vec<(String, JsValue)>,
}

impl BuiltInObject {
    pub fn new(name: &str) -> Self {
        BuiltInObject {
            name: name.to_string(),
            constructor: None,
            members: vec![],
            prototype: None,
            prototype_members: vec![],
        }
    }

    /// Makes the global binding callable (and usable with `new`).
    pub fn with_constructor(mut self, f: NativeFn) -> Self {
        self.constructor = Some(f);
        self
    }

    pub fn with_prototype(mut self, kind: PrototypeKind) -> Self {
        self.prototype = Some(kind);
        self
    }

    pub fn add_method(mut self, name: &str, f: NativeFn) -> Self {
        self.members
            .push((name.to_string(), native_function(name, f)));
        self
    }

    pub fn add_async_method(mut self, name: &str, f: AsyncNativeFn) -> Self {
        self.members
            .push((name.to_string(), async_native_function(name, f)));
        self
    }

    pub fn add_property(mut self, name: &str, value: JsValue) -> Self {
        self.members.push((name.to_string(), value));
        self
    }

    pub fn add_prototype_method(mut self, name: &str, f: NativeFn) -> Self {
        self.prototype_members
            .push((name.to_string(), native_function(name, f)));
        self
    }

    pub fn add_async_prototype_method(mut self, name: &str, f: AsyncNativeFn) -> Self {
        self.prototype_members
            .push((name.to_string(), async_native_function(name, f)));
        self
    }

    /// Installs the built-in into `realm`.
    pub fn install(self, realm: &Realm) {
        let global = match self.constructor {
            Some(f) => native_function(&self.name, f),
            None => new_object(),
        };
        for (key, value) in self.members {
            // Fresh objects and functions always accept writes.
            let _ = set(&global, &key, value);
        }
        if let Some(kind) = self.prototype {
            let intrinsics = &realm.intrinsics;
            let prototype = match kind {
                PrototypeKind::Object => &intrinsics.object_prototype,
                PrototypeKind::Array => &intrinsics.array_prototype,
                PrototypeKind::String => &intrinsics.string_prototype,
                PrototypeKind::Number => &intrinsics.number_prototype,
                PrototypeKind::Function => &intrinsics.function_prototype,
                PrototypeKind::Error => &intrinsics.error_prototype,
            };
            let mut prototype = prototype.borrow_mut();
            for (key, value) in self.prototype_members {
                if let ObjectType::Ordinary(base) = &mut *prototype {
                    base.set(key, value);
                }
            }
        }
        realm
            .global_env
            .initialize_binding(&self.name, global, true);
    }
}

/// Installs every standard built-in into `realm`.
pub fn register_core_builtins(realm: &Realm) {
    object::register(realm);
    array::register(realm);
    string::register(realm);
    number::register(realm);
    math::register(realm);
    json::register(realm);
    error::register(realm);
    console::register(realm);
}

/// Argument `idx`, or `undefined` when absent.
pub fn arg(args: &[JsValue], idx: usize) -> JsValue {
    args.get(idx).cloned().unwrap_or(JsValue::Undefined)
}
