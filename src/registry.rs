//! Document registry: the client-side list of known documents, the current
//! selection, and the report shown for it.
//!
//! All mutations are keyed by durable id or client id, never by list
//! position, so interleaved completions (upload ack, poll snapshots,
//! rename/delete patches) commute safely. Errors never escape the registry
//! boundary; they surface as a single user-facing error string in state.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::{debug, info, warn};

use crate::api::Backend;
use crate::models::{DocumentRecord, DocumentSnapshot, DocumentStatus, Report};
use crate::poller::{PollConfig, PollHandle, StatusPoller};
use crate::session::SessionStore;

#[derive(Default)]
struct RegistryView {
    documents: Vec<DocumentRecord>,
    /// Client id of the selected document.
    selected: Option<String>,
    report: Option<Report>,
    loading: bool,
    error: Option<String>,
    /// Current workspace scope; `None` means unscoped.
    workspace: Option<i64>,
}

/// Tracks documents through upload, processing, and report display.
pub struct DocumentRegistry {
    backend: Arc<dyn Backend>,
    session: Arc<SessionStore>,
    poller: StatusPoller,
    state: Arc<Mutex<RegistryView>>,
    pollers: Mutex<HashMap<i64, PollHandle>>,
}

impl DocumentRegistry {
    pub fn new(
        backend: Arc<dyn Backend>,
        session: Arc<SessionStore>,
        poll_config: PollConfig,
    ) -> Self {
        Self {
            poller: StatusPoller::new(backend.clone(), poll_config),
            backend,
            session,
            state: Arc::new(Mutex::new(RegistryView::default())),
            pollers: Mutex::new(HashMap::new()),
        }
    }

    // ---- state accessors -------------------------------------------------

    pub fn documents(&self) -> Vec<DocumentRecord> {
        self.state.lock().expect("registry lock").documents.clone()
    }

    pub fn selected_document(&self) -> Option<DocumentRecord> {
        let state = self.state.lock().expect("registry lock");
        let selected = state.selected.as_deref()?;
        state
            .documents
            .iter()
            .find(|d| d.client_id == selected)
            .cloned()
    }

    pub fn report(&self) -> Option<Report> {
        self.state.lock().expect("registry lock").report.clone()
    }

    pub fn error(&self) -> Option<String> {
        self.state.lock().expect("registry lock").error.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state.lock().expect("registry lock").loading
    }

    pub fn workspace_scope(&self) -> Option<i64> {
        self.state.lock().expect("registry lock").workspace
    }

    /// Re-scope the registry; the caller refreshes afterwards.
    pub fn set_workspace_scope(&self, workspace_id: Option<i64>) {
        self.state.lock().expect("registry lock").workspace = workspace_id;
    }

    // ---- operations ------------------------------------------------------

    /// Upload a document.
    ///
    /// Inserts a placeholder at the head of the list immediately. On
    /// success the placeholder receives the durable id and `processing`
    /// status, and a poll loop starts for it. On failure the placeholder
    /// stays visible with `failed` status and no id.
    ///
    /// Returns the placeholder's client id.
    pub async fn upload(&self, filename: &str, bytes: Vec<u8>) -> String {
        let placeholder = DocumentRecord::placeholder(filename, Some(bytes.len() as u64));
        let client_id = placeholder.client_id.clone();

        let workspace = {
            let mut state = self.state.lock().expect("registry lock");
            state.documents.insert(0, placeholder);
            state.error = None;
            state.workspace
        };

        let language = self.session.language();
        info!("Uploading {} (language {})", filename, language);

        match self
            .backend
            .upload_document(filename, bytes, &language, workspace)
            .await
        {
            Ok(document_id) => {
                {
                    let mut state = self.state.lock().expect("registry lock");
                    if let Some(doc) = state
                        .documents
                        .iter_mut()
                        .find(|d| d.client_id == client_id)
                    {
                        doc.id = Some(document_id);
                        doc.status = DocumentStatus::Processing;
                    }
                }
                self.start_polling(document_id);
            }
            Err(err) => {
                warn!("Upload of {} failed: {}", filename, err);
                let mut state = self.state.lock().expect("registry lock");
                if let Some(doc) = state
                    .documents
                    .iter_mut()
                    .find(|d| d.client_id == client_id)
                {
                    doc.status = DocumentStatus::Failed;
                }
                state.error = Some(err.to_string());
            }
        }

        client_id
    }

    /// Start (or restart) the poll loop for a durable document id.
    pub fn start_polling(&self, document_id: i64) {
        let state = self.state.clone();
        let handle = self.poller.spawn(document_id, move |snapshot| {
            apply_snapshot(&state, snapshot);
        });
        // A replaced handle is dropped, cancelling the previous loop.
        self.pollers
            .lock()
            .expect("pollers lock")
            .insert(document_id, handle);
    }

    /// Stop the poll loop for a document, if one is running.
    pub fn stop_polling(&self, document_id: i64) {
        self.pollers.lock().expect("pollers lock").remove(&document_id);
    }

    /// Wait until the poll loop for `document_id` finishes (terminal
    /// status or timeout). No-op when no loop is running.
    pub async fn wait_for_poll(&self, document_id: i64) {
        let handle = self
            .pollers
            .lock()
            .expect("pollers lock")
            .remove(&document_id);
        if let Some(handle) = handle {
            handle.join().await;
        }
    }

    /// Select a document by client id, or clear the selection.
    ///
    /// Clearing never touches the network. Selecting a document that has
    /// not completed clears the report view without fetching. Selecting a
    /// completed document fetches its report fresh; reports are never
    /// cached across selections.
    pub async fn select(&self, client_id: Option<&str>) {
        let to_fetch = {
            let mut state = self.state.lock().expect("registry lock");
            state.report = None;
            match client_id {
                None => {
                    state.selected = None;
                    return;
                }
                Some(cid) => {
                    let found = state
                        .documents
                        .iter()
                        .find(|d| d.client_id == cid)
                        .map(|d| (d.status.clone(), d.id));
                    let Some((status, id)) = found else {
                        state.selected = None;
                        state.error = Some("Unknown document".to_string());
                        return;
                    };
                    state.selected = Some(cid.to_string());
                    state.error = None;
                    if !status.is_success() {
                        return;
                    }
                    match id {
                        Some(id) => {
                            state.loading = true;
                            id
                        }
                        None => return,
                    }
                }
            }
        };

        debug!("Fetching report for document {}", to_fetch);
        let result = self.backend.fetch_report(to_fetch).await;

        let mut state = self.state.lock().expect("registry lock");
        state.loading = false;
        match result {
            Ok(report) => state.report = Some(report),
            // Previous report stays cleared.
            Err(err) => state.error = Some(err.to_string()),
        }
    }

    /// Refetch the document list for the current workspace scope and
    /// replace the list wholesale.
    pub async fn refresh(&self) {
        let workspace = self.workspace_scope();
        match self.backend.list_documents(workspace).await {
            Ok(snapshots) => {
                let documents: Vec<DocumentRecord> = snapshots
                    .into_iter()
                    .map(DocumentRecord::from_snapshot)
                    .collect();
                let mut state = self.state.lock().expect("registry lock");
                state.documents = documents;
                state.error = None;
            }
            Err(err) => {
                let mut state = self.state.lock().expect("registry lock");
                state.error = Some(err.to_string());
            }
        }
    }

    /// Rename a document, patching the local record on success.
    pub async fn rename(&self, document_id: i64, new_name: &str) {
        match self.backend.rename_document(document_id, new_name).await {
            Ok(()) => {
                let mut state = self.state.lock().expect("registry lock");
                if let Some(doc) = state
                    .documents
                    .iter_mut()
                    .find(|d| d.id == Some(document_id))
                {
                    doc.filename = new_name.to_string();
                }
            }
            Err(err) => {
                let mut state = self.state.lock().expect("registry lock");
                state.error = Some(err.to_string());
            }
        }
    }

    /// Delete a document, removing the local record on success. Deleting
    /// the selected document clears the selection and report.
    pub async fn delete(&self, document_id: i64) {
        match self.backend.delete_document(document_id).await {
            Ok(()) => {
                self.stop_polling(document_id);
                let mut state = self.state.lock().expect("registry lock");
                let removed_selected = state
                    .documents
                    .iter()
                    .find(|d| d.id == Some(document_id))
                    .is_some_and(|d| state.selected.as_deref() == Some(d.client_id.as_str()));
                state.documents.retain(|d| d.id != Some(document_id));
                if removed_selected {
                    state.selected = None;
                    state.report = None;
                }
            }
            Err(err) => {
                let mut state = self.state.lock().expect("registry lock");
                state.error = Some(err.to_string());
            }
        }
    }

    /// Clear all registry state and stop every poll loop. Used on logout
    /// or identity switch so no cross-session data leaks into the next
    /// view.
    pub fn reset(&self) {
        self.pollers.lock().expect("pollers lock").clear();
        let mut state = self.state.lock().expect("registry lock");
        *state = RegistryView::default();
    }
}

/// Replace the record matching the snapshot's id, preserving list position
/// and client identity.
fn apply_snapshot(state: &Arc<Mutex<RegistryView>>, snapshot: DocumentSnapshot) {
    let mut state = state.lock().expect("registry lock");
    if let Some(doc) = state
        .documents
        .iter_mut()
        .find(|d| d.id == Some(snapshot.id))
    {
        *doc = DocumentRecord::from_snapshot_keeping_identity(snapshot, &doc.client_id);
    }
}
