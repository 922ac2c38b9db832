use std::rc::Rc;

use thiserror::Error;

/// Failures of the settings store.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("settings I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("settings are not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// The store accepted a write but still reports the old policy.
    #[error("the CDN policy was written but did not persist")]
    NotPersisted,
    #[error("{0}")]
    Rejected(String),
}

/// Failures of the document service.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("document not found")]
    NotFound,
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Other(String),
}

/// Why an import could not be satisfied.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("could not resolve module `{module}`")]
    UnresolvedModule { module: String },

    #[error("module `{module}` has no attribute `{attribute}`")]
    MissingAttribute { module: String, attribute: String },

    #[error("loading `{module}` from the CDN is not allowed (CDN policy is `never`)")]
    ConsentDenied { module: String },

    #[error("loading `{module}` from the CDN was aborted")]
    ConsentAborted { module: String },

    #[error("resolver is not configured for this import: {0}")]
    Configuration(String),

    #[error("failed to fetch `{module}` from the CDN: {message}")]
    Fetch { module: String, message: String },

    #[error("failed to read `{path}`: {source}")]
    Document {
        path: String,
        #[source]
        source: DocumentError,
    },

    #[error("failed to persist the CDN policy: {0}")]
    Settings(#[from] SettingsError),

    #[error("circular import of `{path}`")]
    CircularImport { path: String },

    #[error("module `{path}` failed: {message}")]
    Module { path: String, message: String },

    /// An import of a local module failed. The inner error was already
    /// reported by the nested resolver.
    #[error("while loading `{path}`: {source}")]
    Nested {
        path: String,
        #[source]
        source: Rc<ResolveError>,
    },
}

impl ResolveError {
    /// Whether the error still has to be shown to the user.
    pub fn needs_report(&self) -> bool {
        !matches!(self, ResolveError::Nested { .. })
    }
}
