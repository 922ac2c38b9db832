use std::rc::Rc;

use thiserror::Error;

use crate::runner::ds::object::new_error;
use crate::runner::ds::operations::type_conversion::to_string;
use crate::runner::ds::value::JsValue;
use crate::runner::plugin::ResolveError;

/// Runtime failures of plugin code.
///
/// Everything except `Thrown` and `Import` is raised by the interpreter
/// itself; `Import` keeps the resolver's error intact until script code
/// catches it.
#[derive(Debug, Clone, Error)]
pub enum JErrorType {
    #[error("ReferenceError: {0}")]
    ReferenceError(String),
    #[error("TypeError: {0}")]
    TypeError(String),
    #[error("RangeError: {0}")]
    RangeError(String),
    #[error("SyntaxError: {0}")]
    SyntaxError(String),
    #[error("Uncaught {}", to_string(.0))]
    Thrown(JsValue),
    #[error("ImportError: {0}")]
    Import(Rc<ResolveError>),
}

impl JErrorType {
    /// The value a `catch` clause binds for this error.
    pub fn to_value(&self) -> JsValue {
        match self {
            JErrorType::ReferenceError(m) => new_error("ReferenceError", m),
            JErrorType::TypeError(m) => new_error("TypeError", m),
            JErrorType::RangeError(m) => new_error("RangeError", m),
            JErrorType::SyntaxError(m) => new_error("SyntaxError", m),
            JErrorType::Thrown(v) => v.clone(),
            JErrorType::Import(e) => new_error("ImportError", &e.to_string()),
        }
    }
}
