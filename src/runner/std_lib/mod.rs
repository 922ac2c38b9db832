//! Standard library built-in objects.
//!
//! console, Object, Array, String, Number, Math, JSON and the Error types.

pub mod array;
pub mod console;
pub mod core;
pub mod error;
pub mod json;
pub mod math;
pub mod number;
pub mod object;
pub mod string;

pub use self::core::{register_core_builtins, BuiltInObject, PrototypeKind};
pub use json::{from_json, to_json};
