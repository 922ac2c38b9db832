//! The CDN consent state machine.
//!
//! ```text
//! awaiting-decision --allow--> always-insecure
//! awaiting-decision --forbid-> never
//! awaiting-decision --abort--> awaiting-decision (nothing persisted)
//! ```

use std::rc::Rc;

use async_trait::async_trait;
use futures::lock::Mutex;

use super::config::{CdnPolicy, SettingsStore};
use super::error::{ResolveError, SettingsError};

/// Answer of the user to the consent prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsentDecision {
    Forbid,
    Allow,
    Abort,
}

impl ConsentDecision {
    /// Policy to persist, `None` for `Abort`.
    pub fn policy(self) -> Option<CdnPolicy> {
        match self {
            ConsentDecision::Forbid => Some(CdnPolicy::Never),
            ConsentDecision::Allow => Some(CdnPolicy::AlwaysInsecure),
            ConsentDecision::Abort => None,
        }
    }
}

/// Asks the user whether modules may be loaded from the CDN.
#[async_trait(?Send)]
pub trait ConsentDialog {
    async fn ask_cdn_policy(&self, module: &str, cdn_url: &str) -> ConsentDecision;
}

/// Decides whether a module may be fetched remotely.
///
/// Clones share one lock, so at most one check runs at a time across all
/// resolvers built from the same options. A check waiting on the lock sees
/// the policy persisted by the one before it and does not prompt again.
#[derive(Clone)]
pub struct ConsentGate {
    settings: Rc<dyn SettingsStore>,
    dialog: Option<Rc<dyn ConsentDialog>>,
    lock: Rc<Mutex<()>>,
}

impl ConsentGate {
    pub fn new(settings: Rc<dyn SettingsStore>, dialog: Option<Rc<dyn ConsentDialog>>) -> Self {
        ConsentGate {
            settings,
            dialog,
            lock: Rc::new(Mutex::new(())),
        }
    }

    pub fn settings(&self) -> &Rc<dyn SettingsStore> {
        &self.settings
    }

    /// Returns the CDN base URL when `module` may be fetched.
    pub async fn check(&self, module: &str) -> Result<String, ResolveError> {
        let _guard = self.lock.lock().await;
        let mut persisted = false;
        loop {
            let settings = self.settings.composite();
            match settings.allow_cdn {
                CdnPolicy::AlwaysInsecure => return Ok(settings.requirejs_cdn),
                CdnPolicy::Never => {
                    warn!(
                        "not loading `{}` from the CDN: CDN policy is `{}`",
                        module,
                        CdnPolicy::Never
                    );
                    return Err(ResolveError::ConsentDenied {
                        module: module.to_string(),
                    });
                }
                CdnPolicy::AwaitingDecision => {
                    if persisted {
                        return Err(SettingsError::NotPersisted.into());
                    }
                    let dialog = self.dialog.as_ref().ok_or_else(|| {
                        ResolveError::Configuration(format!(
                            "no consent dialog to ask about loading `{}` from the CDN",
                            module
                        ))
                    })?;
                    let decision = dialog.ask_cdn_policy(module, &settings.requirejs_cdn).await;
                    let Some(policy) = decision.policy() else {
                        return Err(ResolveError::ConsentAborted {
                            module: module.to_string(),
                        });
                    };
                    self.settings.set_allow_cdn(policy).await?;
                    info!("CDN policy set to `{}` while loading `{}`", policy, module);
                    persisted = true;
                }
            }
        }
    }
}
