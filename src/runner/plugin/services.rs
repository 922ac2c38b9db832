//! Collaborators the resolver is given by its host.

use std::fs;
use std::io;
use std::path::Path;

use async_trait::async_trait;
use serde_json::Value;

use crate::runner::ds::value::JsValue;

use super::error::{DocumentError, ResolveError};
use super::types::ImportStatement;

/// A document as returned by the document service. Text documents carry a
/// string; structured ones carry their parsed value.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentModel {
    pub content: Value,
}

impl DocumentModel {
    pub fn text(content: impl Into<String>) -> Self {
        DocumentModel {
            content: Value::String(content.into()),
        }
    }

    pub fn json(content: Value) -> Self {
        DocumentModel { content }
    }
}

#[async_trait(?Send)]
pub trait DocumentService {
    async fn get(&self, path: &str) -> Result<DocumentModel, DocumentError>;
}

/// Documents read from the local file system. `.json` files are parsed,
/// everything else is returned as text.
#[derive(Debug, Default)]
pub struct FileSystemDocuments;

impl FileSystemDocuments {
    pub fn new() -> Self {
        FileSystemDocuments
    }
}

#[async_trait(?Send)]
impl DocumentService for FileSystemDocuments {
    async fn get(&self, path: &str) -> Result<DocumentModel, DocumentError> {
        let content = fs::read_to_string(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => DocumentError::NotFound,
            _ => DocumentError::Io(e),
        })?;
        let is_json = Path::new(path)
            .extension()
            .map_or(false, |ext| ext == "json");
        if is_json {
            let value = serde_json::from_str(&content)
                .map_err(|e| DocumentError::Other(format!("invalid JSON: {}", e)))?;
            Ok(DocumentModel::json(value))
        } else {
            Ok(DocumentModel::text(content))
        }
    }
}

/// Loads a module from the CDN at `cdn_url`.
#[async_trait(?Send)]
pub trait RemoteLoader {
    async fn load(&self, module: &str, cdn_url: &str) -> Result<JsValue, String>;
}

/// What a failed resolution was asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportRequest {
    Module(String),
    Statement(ImportStatement),
}

impl ImportRequest {
    pub fn module(&self) -> &str {
        match self {
            ImportRequest::Module(m) => m,
            ImportRequest::Statement(s) => &s.module,
        }
    }
}

/// Shows resolution failures to the user.
pub trait ErrorReporter {
    fn format(&self, error: &ResolveError, request: &ImportRequest) -> String {
        format_import_error(error, request)
    }

    fn show(&self, title: &str, body: &str);
}

/// Reports failures through the `log` facade.
#[derive(Debug, Default)]
pub struct LogErrorReporter;

impl ErrorReporter for LogErrorReporter {
    fn show(&self, title: &str, body: &str) {
        error!("{}: {}", title, body);
    }
}

pub const IMPORT_ERROR_TITLE: &str = "Plugin import failed";

pub fn format_import_error(error: &ResolveError, request: &ImportRequest) -> String {
    match request {
        ImportRequest::Module(module) => format!("Importing `{}` failed: {}", module, error),
        ImportRequest::Statement(statement) => format!(
            "Importing `{}` from `{}` failed: {}",
            statement.local_name(),
            statement.module,
            error
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_import_error() {
        let error = ResolveError::UnresolvedModule {
            module: "m".to_string(),
        };
        assert_eq!(
            format_import_error(&error, &ImportRequest::Module("m".to_string())),
            "Importing `m` failed: could not resolve module `m`"
        );
        let request = ImportRequest::Statement(ImportStatement::named("m", "x").with_alias("y"));
        assert_eq!(request.module(), "m");
        assert_eq!(
            format_import_error(&error, &request),
            "Importing `y` from `m` failed: could not resolve module `m`"
        );
    }
}
