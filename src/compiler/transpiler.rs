use std::fmt;

use thiserror::Error;

use crate::parser::{JsParser, Rule};
use crate::runner::plugin::ImportStatement;

use super::codegen::CodeGenerator;
use super::transform::{lower_module, EXPORTS};

#[derive(Debug, Error)]
pub enum TranspileError {
    #[error("plugin has no default export")]
    MissingDefaultExport,
    #[error("{0}")]
    Syntax(Box<pest::error::Error<Rule>>),
}

impl From<pest::error::Error<Rule>> for TranspileError {
    fn from(e: pest::error::Error<Rule>) -> Self {
        TranspileError::Syntax(Box::new(e))
    }
}

/// A non-fatal finding of the last transpilation. Offsets are byte offsets
/// into the plugin source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub message: String,
    pub start: usize,
    pub end: usize,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (at {}..{})", self.message, self.start, self.end)
    }
}

/// Compiles plugin modules into the body of an async sandbox function.
///
/// The body expects a single binding, `require`, and returns the plugin's
/// `exports` object. Findings of the last call stay available through the
/// accessors until the next call.
#[derive(Debug, Default)]
pub struct PluginTranspiler {
    diagnostics: Vec<Diagnostic>,
    imports: Vec<ImportStatement>,
    default_export: Option<String>,
}

impl PluginTranspiler {
    pub fn new() -> Self {
        PluginTranspiler::default()
    }

    pub fn transpile(
        &mut self,
        source: &str,
        require_default_export: bool,
    ) -> Result<String, TranspileError> {
        self.diagnostics.clear();
        self.imports.clear();
        self.default_export = None;

        let program = JsParser::parse_module(source)?;
        let lowered = lower_module(program, source);
        self.diagnostics = lowered.diagnostics;
        self.imports = lowered.imports;
        self.default_export = lowered.default_export;

        let mut generator = CodeGenerator::new();
        generator.line("\"use strict\";");
        generator.line(&format!("const {} = {{}};", EXPORTS));
        generator.emit_statements(&lowered.body);
        generator.line(&format!("return {};", EXPORTS));
        let output = generator.finish();

        if require_default_export && self.default_export.is_none() {
            return Err(TranspileError::MissingDefaultExport);
        }
        debug!(
            "transpiled plugin: {} import(s), {} diagnostic(s)",
            self.imports.len(),
            self.diagnostics.len()
        );
        Ok(output)
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Source text of the default export found by the last call.
    pub fn default_export(&self) -> Option<&str> {
        self.default_export.as_deref()
    }

    pub fn imports(&self) -> &[ImportStatement] {
        &self.imports
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wraps_body() {
        let mut transpiler = PluginTranspiler::new();
        let out = transpiler.transpile("export default 42;", true).unwrap();
        assert_eq!(
            out,
            "\"use strict\";\nconst exports = {};\nexports.default = 42;\nreturn exports;\n"
        );
        assert_eq!(transpiler.default_export(), Some("42"));
    }

    #[test]
    fn test_missing_default_export() {
        let mut transpiler = PluginTranspiler::new();
        assert!(matches!(
            transpiler.transpile("const a = 1;", true),
            Err(TranspileError::MissingDefaultExport)
        ));
        assert!(transpiler.transpile("const a = 1;", false).is_ok());
        assert_eq!(transpiler.default_export(), None);
    }

    #[test]
    fn test_syntax_error() {
        let mut transpiler = PluginTranspiler::new();
        assert!(matches!(
            transpiler.transpile("const = ;", false),
            Err(TranspileError::Syntax(_))
        ));
    }

    #[test]
    fn test_state_is_reset_between_calls() {
        let mut transpiler = PluginTranspiler::new();
        transpiler
            .transpile("import { a } from 'm'; export = a;", false)
            .unwrap();
        assert_eq!(transpiler.diagnostics().len(), 1);
        assert_eq!(transpiler.imports().len(), 1);
        transpiler.transpile("export default 1;", true).unwrap();
        assert!(transpiler.diagnostics().is_empty());
        assert!(transpiler.imports().is_empty());
    }
}
