//! Import resolution for plugins.
//!
//! Strategies are tried in a fixed order and the first one that can provide
//! the module wins:
//!
//! ```text
//! 1. token registry      "<module>:<attribute>"
//! 2. known modules       host-provided values
//! 3. local files         "./x", "../x" next to the importing document
//! 4. CDN                 remote loader, gated by the consent policy
//! ```

use std::rc::Rc;

use async_trait::async_trait;
use serde_json::Value;

use crate::compiler::PluginTranspiler;
use crate::runner::ds::error::JErrorType;
use crate::runner::ds::object::new_object;
use crate::runner::ds::operations::object::get_own;
use crate::runner::ds::value::JsValue;
use crate::runner::sandbox::{RequireHandler, Sandbox, SandboxError};
use crate::runner::std_lib::from_json;

use super::config::{InMemorySettings, SettingsStore};
use super::consent::{ConsentDialog, ConsentGate};
use super::error::ResolveError;
use super::path::{is_relative, is_script, resolve_relative};
use super::registry::{KnownModules, TokenRegistry};
use super::services::{
    DocumentService, ErrorReporter, ImportRequest, LogErrorReporter, RemoteLoader,
    IMPORT_ERROR_TITLE,
};
use super::token_proxy::wrap_with_tokens;
use super::types::ImportStatement;

/// Everything an `ImportResolver` is built from.
pub struct ResolverOptions {
    known_modules: KnownModules,
    tokens: TokenRegistry,
    base_path: Option<String>,
    documents: Option<Rc<dyn DocumentService>>,
    remote: Option<Rc<dyn RemoteLoader>>,
    settings: Rc<dyn SettingsStore>,
    dialog: Option<Rc<dyn ConsentDialog>>,
    reporter: Rc<dyn ErrorReporter>,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        ResolverOptions {
            known_modules: KnownModules::new(),
            tokens: TokenRegistry::new(),
            base_path: None,
            documents: None,
            remote: None,
            settings: Rc::new(InMemorySettings::default()),
            dialog: None,
            reporter: Rc::new(LogErrorReporter),
        }
    }
}

impl ResolverOptions {
    pub fn new() -> Self {
        ResolverOptions::default()
    }

    pub fn known_modules(mut self, known_modules: KnownModules) -> Self {
        self.known_modules = known_modules;
        self
    }

    pub fn known_module(mut self, module: &str, value: JsValue) -> Self {
        self.known_modules.register(module, value);
        self
    }

    pub fn tokens(mut self, tokens: TokenRegistry) -> Self {
        self.tokens = tokens;
        self
    }

    pub fn token(mut self, module: &str, attribute: &str, value: JsValue) -> Self {
        self.tokens.register(module, attribute, value);
        self
    }

    /// Path of the document the plugin was loaded from. Local imports are
    /// resolved against its directory.
    pub fn base_path(mut self, base_path: impl Into<String>) -> Self {
        self.base_path = Some(base_path.into());
        self
    }

    pub fn documents(mut self, documents: Rc<dyn DocumentService>) -> Self {
        self.documents = Some(documents);
        self
    }

    pub fn remote(mut self, remote: Rc<dyn RemoteLoader>) -> Self {
        self.remote = Some(remote);
        self
    }

    pub fn settings(mut self, settings: Rc<dyn SettingsStore>) -> Self {
        self.settings = settings;
        self
    }

    pub fn dialog(mut self, dialog: Rc<dyn ConsentDialog>) -> Self {
        self.dialog = Some(dialog);
        self
    }

    pub fn reporter(mut self, reporter: Rc<dyn ErrorReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn build(self) -> ImportResolver {
        ImportResolver {
            shared: Rc::new(Shared {
                known_modules: self.known_modules,
                tokens: Rc::new(self.tokens),
                documents: self.documents,
                remote: self.remote,
                reporter: self.reporter,
                consent: ConsentGate::new(self.settings, self.dialog),
            }),
            base_path: self.base_path,
            ancestors: Rc::new(vec![]),
        }
    }
}

struct Shared {
    known_modules: KnownModules,
    tokens: Rc<TokenRegistry>,
    documents: Option<Rc<dyn DocumentService>>,
    remote: Option<Rc<dyn RemoteLoader>>,
    reporter: Rc<dyn ErrorReporter>,
    consent: ConsentGate,
}

/// Resolves the imports of one plugin.
///
/// Clones and the resolvers created for nested local modules share the
/// registries, the collaborators and the consent lock.
#[derive(Clone)]
pub struct ImportResolver {
    shared: Rc<Shared>,
    base_path: Option<String>,
    /// Local modules being loaded on the way to this resolver.
    ancestors: Rc<Vec<String>>,
}

impl ImportResolver {
    pub fn base_path(&self) -> Option<&str> {
        self.base_path.as_deref()
    }

    /// Resolver for a module loaded from `path`.
    pub fn for_base_path(&self, path: &str) -> ImportResolver {
        let mut ancestors = (*self.ancestors).clone();
        if let Some(base) = &self.base_path {
            ancestors.push(base.clone());
        }
        ImportResolver {
            shared: self.shared.clone(),
            base_path: Some(path.to_string()),
            ancestors: Rc::new(ancestors),
        }
    }

    /// Resolves the whole value of `module`.
    pub async fn resolve(&self, module: &str) -> Result<JsValue, ResolveError> {
        let result = self.resolve_module(module).await;
        self.report(result, ImportRequest::Module(module.to_string()))
    }

    /// Resolves the value bound by one import declaration.
    pub async fn resolve_import(&self, import: &ImportStatement) -> Result<JsValue, ResolveError> {
        if import.is_type_only {
            return Ok(JsValue::Undefined);
        }
        let result = self.resolve_statement(import).await;
        self.report(result, ImportRequest::Statement(import.clone()))
    }

    fn report(
        &self,
        result: Result<JsValue, ResolveError>,
        request: ImportRequest,
    ) -> Result<JsValue, ResolveError> {
        if let Err(e) = &result {
            if e.needs_report() {
                let reporter = &self.shared.reporter;
                reporter.show(IMPORT_ERROR_TITLE, &reporter.format(e, &request));
            }
        }
        result
    }

    async fn resolve_statement(&self, import: &ImportStatement) -> Result<JsValue, ResolveError> {
        let module = import.module.as_str();
        let attribute = import.requested_attribute();
        if let Some(attribute) = attribute {
            if let Some(token) = self.shared.tokens.lookup(module, attribute) {
                debug!("`{}` from `{}`: token", attribute, module);
                return Ok(token);
            }
        }
        if let Some(value) = self.known_module(module) {
            return match attribute {
                None => Ok(value),
                Some(attribute) => match get_own(&value, attribute) {
                    Some(v) => Ok(v),
                    None if import.is_default => Ok(value),
                    None => Err(ResolveError::MissingAttribute {
                        module: module.to_string(),
                        attribute: attribute.to_string(),
                    }),
                },
            };
        }
        let value = self.resolve_external(module).await?;
        Ok(match attribute {
            None => value,
            Some(attribute) => match get_own(&value, attribute) {
                Some(v) => v,
                None if import.is_default => value,
                None => JsValue::Undefined,
            },
        })
    }

    async fn resolve_module(&self, module: &str) -> Result<JsValue, ResolveError> {
        match self.known_module(module) {
            Some(value) => Ok(value),
            None => self.resolve_external(module).await,
        }
    }

    fn known_module(&self, module: &str) -> Option<JsValue> {
        let value = self.shared.known_modules.get(module)?;
        debug!("`{}`: known module", module);
        Some(wrap_with_tokens(module, value, &self.shared.tokens))
    }

    /// Modules the host does not provide: tokens only, local files or the CDN.
    async fn resolve_external(&self, module: &str) -> Result<JsValue, ResolveError> {
        let tokens = &self.shared.tokens;
        let value = if is_relative(module) {
            self.load_local(module).await?
        } else if tokens.has_module(module) {
            debug!("`{}`: tokens only", module);
            new_object()
        } else {
            self.load_remote(module).await?
        };
        if tokens.has_module(module) {
            Ok(wrap_with_tokens(module, value, tokens))
        } else {
            Ok(value)
        }
    }

    async fn load_local(&self, module: &str) -> Result<JsValue, ResolveError> {
        let documents = self.shared.documents.as_ref().ok_or_else(|| {
            ResolveError::Configuration(format!(
                "no document service to load local module `{}`",
                module
            ))
        })?;
        let base_path = self.base_path.as_deref().ok_or_else(|| {
            ResolveError::Configuration(format!(
                "no base path to resolve local module `{}` against",
                module
            ))
        })?;
        let path = resolve_relative(base_path, module);
        if path == base_path || self.ancestors.contains(&path) {
            return Err(ResolveError::CircularImport { path });
        }
        debug!("`{}`: local file `{}`", module, path);
        let document = documents
            .get(&path)
            .await
            .map_err(|source| ResolveError::Document {
                path: path.clone(),
                source,
            })?;
        match document.content {
            Value::String(source) if is_script(&path) => self.run_local_module(&path, &source).await,
            content => Ok(from_json(&content)),
        }
    }

    /// Transpiles and runs a local script; its exports are the module value.
    async fn run_local_module(&self, path: &str, source: &str) -> Result<JsValue, ResolveError> {
        let mut transpiler = PluginTranspiler::new();
        let body = transpiler
            .transpile(source, false)
            .map_err(|e| ResolveError::Module {
                path: path.to_string(),
                message: e.to_string(),
            })?;
        let nested: Rc<dyn RequireHandler> = Rc::new(self.for_base_path(path));
        Sandbox::new()
            .execute(&body, nested)
            .await
            .map_err(|e| match e {
                SandboxError::Runtime(JErrorType::Import(source)) => ResolveError::Nested {
                    path: path.to_string(),
                    source,
                },
                other => ResolveError::Module {
                    path: path.to_string(),
                    message: other.to_string(),
                },
            })
    }

    async fn load_remote(&self, module: &str) -> Result<JsValue, ResolveError> {
        let remote = self
            .shared
            .remote
            .as_ref()
            .ok_or_else(|| ResolveError::UnresolvedModule {
                module: module.to_string(),
            })?;
        let cdn_url = self.shared.consent.check(module).await?;
        debug!("`{}`: CDN `{}`", module, cdn_url);
        remote
            .load(module, &cdn_url)
            .await
            .map_err(|message| ResolveError::Fetch {
                module: module.to_string(),
                message,
            })
    }
}

#[async_trait(?Send)]
impl RequireHandler for ImportResolver {
    async fn require(&self, module: &str) -> Result<JsValue, ResolveError> {
        self.resolve(module).await
    }
}
