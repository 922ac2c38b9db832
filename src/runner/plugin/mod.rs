//! Plugin loading and import resolution.
//!
//! A plugin is transpiled into a sandbox body whose imports are `require`
//! calls. [`ImportResolver`] answers them from, in order, the token registry,
//! the host's known modules, local files next to the plugin, and the CDN.
//! CDN access is gated by the persisted [`CdnPolicy`]; while it is
//! `awaiting-decision` the user is asked through a [`ConsentDialog`].
//!
//! [`PluginLoader`] ties the transpiler, the sandbox and the resolver
//! together.

pub mod config;
pub mod consent;
pub mod error;
pub mod loader;
pub mod path;
pub mod registry;
pub mod resolver;
pub mod services;
pub mod token_proxy;
pub mod types;

pub use config::{CdnPolicy, CompositeSettings, InMemorySettings, JsonFileSettings, SettingsStore};
pub use consent::{ConsentDecision, ConsentDialog, ConsentGate};
pub use error::{DocumentError, ResolveError, SettingsError};
pub use loader::{LoadedPlugin, PluginLoadError, PluginLoader};
pub use registry::{KnownModules, TokenRegistry};
pub use resolver::{ImportResolver, ResolverOptions};
pub use services::{
    format_import_error, DocumentModel, DocumentService, ErrorReporter, FileSystemDocuments,
    ImportRequest, LogErrorReporter, RemoteLoader,
};
pub use token_proxy::TokenProxy;
pub use types::ImportStatement;
