//! Error constructors.

use crate::runner::ds::object::new_error;
use crate::runner::ds::operations::type_conversion::to_string;
use crate::runner::ds::realm::Realm;
use crate::runner::ds::value::JsValue;
use crate::runner::eval::ValueResult;

use super::core::{arg, BuiltInObject, PrototypeKind};

macro_rules! error_constructor {
    ($fn_name:ident, $name:expr) => {
        fn $fn_name(_this: JsValue, args: Vec<JsValue>) -> ValueResult {
            Ok(create_error($name, &args))
        }
    };
}

error_constructor!(error_constructor, "Error");
error_constructor!(type_error_constructor, "TypeError");
error_constructor!(range_error_constructor, "RangeError");
error_constructor!(reference_error_constructor, "ReferenceError");
error_constructor!(syntax_error_constructor, "SyntaxError");

/// Register `Error` and its subclasses.
pub fn register(realm: &Realm) {
    BuiltInObject::new("Error")
        .with_constructor(error_constructor)
        .with_prototype(PrototypeKind::Error)
        .add_prototype_method("toString", error_to_string)
        .install(realm);
    BuiltInObject::new("TypeError")
        .with_constructor(type_error_constructor)
        .install(realm);
    BuiltInObject::new("RangeError")
        .with_constructor(range_error_constructor)
        .install(realm);
    BuiltInObject::new("ReferenceError")
        .with_constructor(reference_error_constructor)
        .install(realm);
    BuiltInObject::new("SyntaxError")
        .with_constructor(syntax_error_constructor)
        .install(realm);
}

fn create_error(name: &str, args: &[JsValue]) -> JsValue {
    let message = match arg(args, 0) {
        JsValue::Undefined => String::new(),
        m => to_string(&m),
    };
    new_error(name, &message)
}

fn error_to_string(this: JsValue, _args: Vec<JsValue>) -> ValueResult {
    Ok(JsValue::String(to_string(&this)))
}
