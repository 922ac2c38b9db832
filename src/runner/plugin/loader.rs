use std::rc::Rc;

use thiserror::Error;

use crate::compiler::{Diagnostic, PluginTranspiler, TranspileError};
use crate::runner::ds::error::JErrorType;
use crate::runner::ds::object::array_elements;
use crate::runner::ds::operations::object::get_own;
use crate::runner::ds::value::JsValue;
use crate::runner::sandbox::{RequireHandler, Sandbox, SandboxError};

use super::error::ResolveError;
use super::resolver::ImportResolver;
use super::types::ImportStatement;

#[derive(Debug, Error)]
pub enum PluginLoadError {
    #[error("{0}")]
    Transpile(#[from] TranspileError),
    #[error("{0}")]
    Sandbox(SandboxError),
    /// An import failed and the plugin did not handle it. The resolver has
    /// already reported it.
    #[error("{0}")]
    Import(Rc<ResolveError>),
}

impl From<SandboxError> for PluginLoadError {
    fn from(e: SandboxError) -> Self {
        match e {
            SandboxError::Runtime(JErrorType::Import(e)) => PluginLoadError::Import(e),
            other => PluginLoadError::Sandbox(other),
        }
    }
}

pub struct LoadedPlugin {
    pub exports: JsValue,
    pub default_export: JsValue,
    /// The default export's elements when it is an array, otherwise the
    /// default export itself.
    pub plugins: Vec<JsValue>,
    pub imports: Vec<ImportStatement>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Transpiles and runs plugin sources against one resolver.
pub struct PluginLoader {
    resolver: ImportResolver,
}

impl PluginLoader {
    pub fn new(resolver: ImportResolver) -> Self {
        PluginLoader { resolver }
    }

    pub fn resolver(&self) -> &ImportResolver {
        &self.resolver
    }

    pub async fn load(&self, source: &str) -> Result<LoadedPlugin, PluginLoadError> {
        let mut transpiler = PluginTranspiler::new();
        let body = transpiler.transpile(source, true)?;

        let require: Rc<dyn RequireHandler> = Rc::new(self.resolver.clone());
        let exports = Sandbox::new().execute(&body, require).await?;

        let default_export = get_own(&exports, "default").unwrap_or(JsValue::Undefined);
        let plugins = array_elements(&default_export).unwrap_or_else(|| vec![default_export.clone()]);
        info!("loaded {} plugin(s)", plugins.len());
        Ok(LoadedPlugin {
            exports,
            default_export,
            plugins,
            imports: transpiler.imports().to_vec(),
            diagnostics: transpiler.diagnostics().to_vec(),
        })
    }
}
