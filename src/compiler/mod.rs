pub mod codegen;
mod transform;
mod transpiler;

pub use transpiler::{Diagnostic, PluginTranspiler, TranspileError};
