use std::rc::Rc;

use futures::future::LocalBoxFuture;

use crate::parser::ast::FunctionData;
use crate::runner::ds::env_record::Environment;
use crate::runner::ds::object::{wrap_object, ObjectBase, ObjectType};
use crate::runner::ds::realm::Realm;
use crate::runner::ds::value::JsValue;
use crate::runner::eval::types::ValueResult;

/// Built-in function that completes without calling back into script code.
pub type NativeFn = fn(JsValue, Vec<JsValue>) -> ValueResult;

/// Built-in function that may call script functions (callbacks) and so has
/// to be awaited.
pub type AsyncNativeFn = fn(Rc<Realm>, JsValue, Vec<JsValue>) -> LocalBoxFuture<'static, ValueResult>;

/// Host closures exposed to plugins.
pub type HostFn = Rc<dyn Fn(JsValue, Vec<JsValue>) -> ValueResult>;
pub type AsyncHostFn = Rc<dyn Fn(JsValue, Vec<JsValue>) -> LocalBoxFuture<'static, ValueResult>>;

#[derive(Clone)]
pub enum FunctionKind {
    Script {
        data: Rc<FunctionData>,
        environment: Environment,
        /// `this` captured by arrow functions.
        lexical_this: Option<JsValue>,
    },
    Native(NativeFn),
    AsyncNative(AsyncNativeFn),
    Host(HostFn),
    AsyncHost(AsyncHostFn),
}

pub struct FunctionObject {
    pub name: String,
    pub kind: FunctionKind,
    pub base: ObjectBase,
}
impl FunctionObject {
    /// Only plain script functions can be used with `new`; built-ins handle
    /// `new` by being called.
    pub fn is_constructor(&self) -> bool {
        match &self.kind {
            FunctionKind::Script { data, .. } => !data.is_arrow && !data.is_async,
            _ => true,
        }
    }
}

pub fn new_function(name: &str, kind: FunctionKind) -> JsValue {
    wrap_object(ObjectType::Function(FunctionObject {
        name: name.to_string(),
        kind,
        base: ObjectBase::new(),
    }))
}

pub fn native_function(name: &str, f: NativeFn) -> JsValue {
    new_function(name, FunctionKind::Native(f))
}

pub fn async_native_function(name: &str, f: AsyncNativeFn) -> JsValue {
    new_function(name, FunctionKind::AsyncNative(f))
}

pub fn host_function<F>(name: &str, f: F) -> JsValue
where
    F: Fn(JsValue, Vec<JsValue>) -> ValueResult + 'static,
{
    new_function(name, FunctionKind::Host(Rc::new(f)))
}

pub fn async_host_function<F>(name: &str, f: F) -> JsValue
where
    F: Fn(JsValue, Vec<JsValue>) -> LocalBoxFuture<'static, ValueResult> + 'static,
{
    new_function(name, FunctionKind::AsyncHost(Rc::new(f)))
}
