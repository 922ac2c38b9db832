//! Fakes for the resolver's collaborators.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use async_trait::async_trait;
use tokio::task::yield_now;

use playground::runner::ds::value::JsValue;
use playground::runner::plugin::{
    CdnPolicy, ConsentDecision, ConsentDialog, DocumentError, DocumentModel, DocumentService,
    ErrorReporter, ImportResolver, InMemorySettings, RemoteLoader, ResolverOptions,
};

/// Answers prompts from a script; `Abort` once the script runs out.
#[derive(Default)]
pub struct ScriptedDialog {
    decisions: RefCell<VecDeque<ConsentDecision>>,
    pub asked: RefCell<Vec<(String, String)>>,
}

impl ScriptedDialog {
    pub fn new(decisions: Vec<ConsentDecision>) -> Rc<Self> {
        Rc::new(ScriptedDialog {
            decisions: RefCell::new(decisions.into()),
            asked: RefCell::new(vec![]),
        })
    }

    pub fn times_asked(&self) -> usize {
        self.asked.borrow().len()
    }
}

#[async_trait(?Send)]
impl ConsentDialog for ScriptedDialog {
    async fn ask_cdn_policy(&self, module: &str, cdn_url: &str) -> ConsentDecision {
        self.asked
            .borrow_mut()
            .push((module.to_string(), cdn_url.to_string()));
        yield_now().await;
        self.decisions
            .borrow_mut()
            .pop_front()
            .unwrap_or(ConsentDecision::Abort)
    }
}

/// Serves registered modules and records every fetch.
#[derive(Default)]
pub struct FakeRemote {
    modules: HashMap<String, JsValue>,
    pub calls: RefCell<Vec<(String, String)>>,
}

impl FakeRemote {
    pub fn new(modules: Vec<(&str, JsValue)>) -> Rc<Self> {
        Rc::new(FakeRemote {
            modules: modules
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
            calls: RefCell::new(vec![]),
        })
    }

    pub fn fetched(&self) -> Vec<String> {
        self.calls.borrow().iter().map(|(m, _)| m.clone()).collect()
    }
}

#[async_trait(?Send)]
impl RemoteLoader for FakeRemote {
    async fn load(&self, module: &str, cdn_url: &str) -> Result<JsValue, String> {
        self.calls
            .borrow_mut()
            .push((module.to_string(), cdn_url.to_string()));
        yield_now().await;
        self.modules
            .get(module)
            .cloned()
            .ok_or_else(|| format!("404 for {}{}", cdn_url, module))
    }
}

/// Documents kept in memory, keyed by path.
#[derive(Default)]
pub struct MemoryDocuments {
    documents: HashMap<String, DocumentModel>,
    pub requested: RefCell<Vec<String>>,
}

impl MemoryDocuments {
    pub fn new(documents: Vec<(&str, DocumentModel)>) -> Rc<Self> {
        Rc::new(MemoryDocuments {
            documents: documents
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
            requested: RefCell::new(vec![]),
        })
    }
}

#[async_trait(?Send)]
impl DocumentService for MemoryDocuments {
    async fn get(&self, path: &str) -> Result<DocumentModel, DocumentError> {
        self.requested.borrow_mut().push(path.to_string());
        self.documents
            .get(path)
            .cloned()
            .ok_or(DocumentError::NotFound)
    }
}

/// Keeps everything it was asked to show.
#[derive(Default)]
pub struct RecordingReporter {
    pub shown: RefCell<Vec<(String, String)>>,
    count: Cell<usize>,
}

impl RecordingReporter {
    pub fn new() -> Rc<Self> {
        Rc::new(RecordingReporter::default())
    }

    pub fn count(&self) -> usize {
        self.count.get()
    }

    pub fn last_body(&self) -> Option<String> {
        self.shown.borrow().last().map(|(_, body)| body.clone())
    }
}

impl ErrorReporter for RecordingReporter {
    fn show(&self, title: &str, body: &str) {
        self.count.set(self.count.get() + 1);
        self.shown
            .borrow_mut()
            .push((title.to_string(), body.to_string()));
    }
}

/// All collaborators of one resolver, kept around for inspection.
pub struct Harness {
    pub settings: Rc<InMemorySettings>,
    pub dialog: Rc<ScriptedDialog>,
    pub remote: Rc<FakeRemote>,
    pub documents: Rc<MemoryDocuments>,
    pub reporter: Rc<RecordingReporter>,
}

impl Harness {
    pub fn new(policy: CdnPolicy) -> Self {
        Harness {
            settings: Rc::new(InMemorySettings::with_policy(policy)),
            dialog: ScriptedDialog::new(vec![]),
            remote: FakeRemote::new(vec![]),
            documents: MemoryDocuments::new(vec![]),
            reporter: RecordingReporter::new(),
        }
    }

    pub fn with_decisions(mut self, decisions: Vec<ConsentDecision>) -> Self {
        self.dialog = ScriptedDialog::new(decisions);
        self
    }

    pub fn with_remote(mut self, modules: Vec<(&str, JsValue)>) -> Self {
        self.remote = FakeRemote::new(modules);
        self
    }

    pub fn with_documents(mut self, documents: Vec<(&str, DocumentModel)>) -> Self {
        self.documents = MemoryDocuments::new(documents);
        self
    }

    /// Options wired to every fake, with `base_path` set.
    pub fn options(&self, base_path: &str) -> ResolverOptions {
        ResolverOptions::new()
            .base_path(base_path)
            .settings(self.settings.clone())
            .dialog(self.dialog.clone())
            .remote(self.remote.clone())
            .documents(self.documents.clone())
            .reporter(self.reporter.clone())
    }

    pub fn resolver(&self) -> ImportResolver {
        self.options("/work/plugin.ts").build()
    }
}
