//! Shared application state.

use std::sync::Arc;

use legalease_analyze::{Analyzer, HistoryStore, QaHistoryEntry, SummaryResult};
use legalease_core::{Error, LegalEaseConfig, Result};
use legalease_infer::ModelBackends;
use legalease_ingest::Document;
use parking_lot::RwLock;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::info;

/// The single user's working set.
#[derive(Default)]
pub struct Session {
    pub document: Option<Arc<Document>>,
    /// Kept across uploads for the lifetime of the process.
    pub history: HistoryStore,
    /// Summary of the current document, cleared when it is replaced.
    pub last_summary: Option<SummaryResult>,
}

/// Shared application state accessible from all route handlers.
pub struct AppState {
    pub config: LegalEaseConfig,
    pub analyzer: Analyzer,
    pub session: RwLock<Session>,
    /// Held for the whole of each user action, so actions run one at a time
    /// in arrival order.
    actions: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(config: LegalEaseConfig, backends: ModelBackends) -> Result<Self> {
        let analyzer = Analyzer::new(config.chunking, config.summary_length, backends)?;
        Ok(Self {
            config,
            analyzer,
            session: RwLock::new(Session::default()),
            actions: Arc::new(Mutex::new(())),
        })
    }

    /// Wait for the running action to finish and claim the next turn.
    ///
    /// The guard is owned so it can move into a blocking worker and be
    /// released only when the work is done.
    pub async fn begin_action(&self) -> OwnedMutexGuard<()> {
        self.actions.clone().lock_owned().await
    }

    pub fn current_document(&self) -> Result<Arc<Document>> {
        self.session.read().document.clone().ok_or(Error::NoDocument)
    }

    /// Make `document` the current one and drop the previous summary.
    pub fn replace_document(&self, document: Document) -> Arc<Document> {
        let document = Arc::new(document);
        let mut session = self.session.write();
        if let Some(previous) = &session.document {
            info!("Replacing {} with {}", previous.filename, document.filename);
        }
        session.document = Some(document.clone());
        session.last_summary = None;
        document
    }

    /// Record `summary` unless `document` was replaced while it ran.
    pub fn store_summary(&self, document: &Arc<Document>, summary: SummaryResult) {
        let mut session = self.session.write();
        if session
            .document
            .as_ref()
            .is_some_and(|current| Arc::ptr_eq(current, document))
        {
            session.last_summary = Some(summary);
        }
    }

    pub fn last_summary(&self) -> Option<SummaryResult> {
        self.session.read().last_summary.clone()
    }

    pub fn append_history(&self, entry: QaHistoryEntry) {
        self.session.write().history.append(entry);
    }

    pub fn history(&self) -> Vec<QaHistoryEntry> {
        self.session.read().history.list().to_vec()
    }
}
