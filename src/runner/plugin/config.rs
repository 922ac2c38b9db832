//! Resolver settings: the persisted CDN consent policy and the CDN base URL.

use std::cell::RefCell;
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::error::SettingsError;

/// CDN used when the settings do not name one.
pub const DEFAULT_CDN_URL: &str = "https://cdn.jsdelivr.net/npm/";

/// Persisted decision on whether modules may be fetched from the CDN.
///
/// Once the policy is `AlwaysInsecure` or `Never` no resolution prompts
/// again; only an explicit settings change moves it back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CdnPolicy {
    #[default]
    AwaitingDecision,
    AlwaysInsecure,
    Never,
}

impl fmt::Display for CdnPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CdnPolicy::AwaitingDecision => "awaiting-decision",
            CdnPolicy::AlwaysInsecure => "always-insecure",
            CdnPolicy::Never => "never",
        })
    }
}

fn default_cdn_url() -> String {
    DEFAULT_CDN_URL.to_string()
}

/// The merged view of the settings the resolver reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompositeSettings {
    #[serde(rename = "allowCDN", default)]
    pub allow_cdn: CdnPolicy,
    #[serde(rename = "requirejsCDN", default = "default_cdn_url")]
    pub requirejs_cdn: String,
}

impl Default for CompositeSettings {
    fn default() -> Self {
        CompositeSettings {
            allow_cdn: CdnPolicy::AwaitingDecision,
            requirejs_cdn: default_cdn_url(),
        }
    }
}

/// Settings persistence.
///
/// `set_allow_cdn` must not return before the new policy is durable; the
/// consent check re-reads `composite()` right after it.
#[async_trait(?Send)]
pub trait SettingsStore {
    fn composite(&self) -> CompositeSettings;

    async fn set_allow_cdn(&self, policy: CdnPolicy) -> Result<(), SettingsError>;
}

/// Settings kept in memory for the lifetime of the process.
#[derive(Debug, Default)]
pub struct InMemorySettings {
    settings: RefCell<CompositeSettings>,
}

impl InMemorySettings {
    pub fn new(settings: CompositeSettings) -> Self {
        InMemorySettings {
            settings: RefCell::new(settings),
        }
    }

    pub fn with_policy(policy: CdnPolicy) -> Self {
        InMemorySettings::new(CompositeSettings {
            allow_cdn: policy,
            ..CompositeSettings::default()
        })
    }
}

#[async_trait(?Send)]
impl SettingsStore for InMemorySettings {
    fn composite(&self) -> CompositeSettings {
        self.settings.borrow().clone()
    }

    async fn set_allow_cdn(&self, policy: CdnPolicy) -> Result<(), SettingsError> {
        self.settings.borrow_mut().allow_cdn = policy;
        Ok(())
    }
}

/// Settings stored as a JSON document on disk.
///
/// Expected format:
/// ```json
/// { "allowCDN": "awaiting-decision", "requirejsCDN": "https://cdn.jsdelivr.net/npm/" }
/// ```
/// Missing keys take their defaults; a missing file means all defaults.
#[derive(Debug)]
pub struct JsonFileSettings {
    path: PathBuf,
    settings: RefCell<CompositeSettings>,
}

impl JsonFileSettings {
    pub fn open(path: &Path) -> Result<Self, SettingsError> {
        let settings = if path.exists() {
            let content = fs::read_to_string(path)?;
            Self::parse(&content)?
        } else {
            CompositeSettings::default()
        };
        Ok(JsonFileSettings {
            path: path.to_path_buf(),
            settings: RefCell::new(settings),
        })
    }

    pub fn parse(content: &str) -> Result<CompositeSettings, SettingsError> {
        if content.trim().is_empty() {
            return Ok(CompositeSettings::default());
        }
        Ok(serde_json::from_str(content)?)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait(?Send)]
impl SettingsStore for JsonFileSettings {
    fn composite(&self) -> CompositeSettings {
        self.settings.borrow().clone()
    }

    async fn set_allow_cdn(&self, policy: CdnPolicy) -> Result<(), SettingsError> {
        let mut updated = self.composite();
        updated.allow_cdn = policy;
        let content = serde_json::to_string_pretty(&updated)?;
        let mut file = fs::File::create(&self.path)?;
        file.write_all(content.as_bytes())?;
        file.sync_all()?;
        *self.settings.borrow_mut() = updated;
        Ok(())
    }
}
