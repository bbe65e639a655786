//! Shared test support: an in-memory backend with scripted responses.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use docsight::api::{ApiError, Backend};
use docsight::models::{
    DocumentSnapshot, DocumentStatus, Report, UserProfile, WorkspaceMember, WorkspaceRole,
    WorkspaceSummary,
};

fn scripted_err(message: &str) -> ApiError {
    ApiError::Api {
        status: 500,
        message: message.to_string(),
    }
}

/// In-memory stand-in for the REST backend.
///
/// Responses are scripted per endpoint; call counters let tests assert
/// exactly which requests an operation issued.
#[derive(Default)]
pub struct FakeBackend {
    /// `Ok(id)` or `Err(message)` for the next upload.
    pub upload_result: Mutex<Option<Result<i64, String>>>,
    /// When set, `upload_document` waits here before answering.
    pub upload_gate: Mutex<Option<Arc<Notify>>>,
    pub upload_calls: AtomicUsize,

    /// Wholesale document list returned by `list_documents`.
    pub documents: Mutex<Vec<DocumentSnapshot>>,

    /// Statuses handed out by `get_document`, one per call; an exhausted
    /// script keeps answering `processing`.
    pub status_script: Mutex<VecDeque<DocumentStatus>>,
    /// `true` entries make the corresponding `get_document` call fail.
    pub status_fail_script: Mutex<VecDeque<bool>>,
    pub status_calls: AtomicUsize,

    pub report_result: Mutex<Option<Result<Report, String>>>,
    pub report_calls: AtomicUsize,

    pub profile: Mutex<Option<UserProfile>>,
    pub workspaces: Mutex<Vec<WorkspaceSummary>>,
    pub workspace_list_calls: AtomicUsize,

    /// Members per workspace id.
    pub members: Mutex<HashMap<i64, Vec<WorkspaceMember>>>,
    /// Workspace ids passed to `list_members`, in call order.
    pub member_list_ids: Mutex<Vec<i64>>,
    pub add_member_calls: AtomicUsize,
    pub remove_member_calls: AtomicUsize,

    pub renamed: Mutex<Vec<(i64, String)>>,
    pub deleted: Mutex<Vec<i64>>,
}

impl FakeBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn script_upload(&self, result: Result<i64, &str>) {
        *self.upload_result.lock().unwrap() = Some(result.map_err(|e| e.to_string()));
    }

    pub fn script_statuses(&self, statuses: impl IntoIterator<Item = DocumentStatus>) {
        *self.status_script.lock().unwrap() = statuses.into_iter().collect();
    }

    pub fn script_report(&self, result: Result<Report, &str>) {
        *self.report_result.lock().unwrap() = Some(result.map_err(|e| e.to_string()));
    }

    pub fn set_documents(&self, documents: Vec<DocumentSnapshot>) {
        *self.documents.lock().unwrap() = documents;
    }
}

pub fn snapshot(id: i64, filename: &str, status: DocumentStatus) -> DocumentSnapshot {
    DocumentSnapshot {
        id,
        client_id: None,
        filename: filename.to_string(),
        status,
        created_at: "2026-03-01T09:00:00Z".to_string(),
        size_bytes: Some(1024),
    }
}

pub fn member(user_id: i64, email: &str, role: WorkspaceRole) -> WorkspaceMember {
    WorkspaceMember {
        id: user_id,
        user_id,
        name: email.split('@').next().unwrap_or(email).to_string(),
        email: email.to_string(),
        role,
    }
}

pub fn profile(id: i64, email: &str) -> UserProfile {
    UserProfile {
        id,
        email: email.to_string(),
        full_name: None,
    }
}

pub fn workspace_summary(id: i64, name: &str, is_personal: bool) -> WorkspaceSummary {
    WorkspaceSummary {
        id,
        name: name.to_string(),
        is_personal,
    }
}

pub fn sample_report(document_id: i64) -> Report {
    Report {
        document_id,
        title: Some("Annual report".to_string()),
        summary: Some("Revenue grew".to_string()),
        key_figures: Vec::new(),
        sections: Vec::new(),
        conclusion: None,
        generated_at: Some("2026-03-01T10:00:00Z".to_string()),
    }
}

#[async_trait]
impl Backend for FakeBackend {
    async fn upload_document(
        &self,
        _filename: &str,
        _bytes: Vec<u8>,
        _language: &str,
        _workspace_id: Option<i64>,
    ) -> Result<i64, ApiError> {
        let gate = self.upload_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.upload_calls.fetch_add(1, Ordering::SeqCst);
        match self.upload_result.lock().unwrap().clone() {
            Some(Ok(id)) => Ok(id),
            Some(Err(message)) => Err(scripted_err(&message)),
            None => Err(scripted_err("no upload scripted")),
        }
    }

    async fn list_documents(
        &self,
        _workspace_id: Option<i64>,
    ) -> Result<Vec<DocumentSnapshot>, ApiError> {
        Ok(self.documents.lock().unwrap().clone())
    }

    async fn get_document(&self, id: i64) -> Result<DocumentSnapshot, ApiError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        let fail = self
            .status_fail_script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(false);
        if fail {
            return Err(scripted_err("poll blip"));
        }
        let status = self
            .status_script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(DocumentStatus::Processing);
        Ok(snapshot(id, "doc.pdf", status))
    }

    async fn rename_document(&self, id: i64, filename: &str) -> Result<(), ApiError> {
        self.renamed.lock().unwrap().push((id, filename.to_string()));
        Ok(())
    }

    async fn delete_document(&self, id: i64) -> Result<(), ApiError> {
        self.deleted.lock().unwrap().push(id);
        Ok(())
    }

    async fn fetch_report(&self, document_id: i64) -> Result<Report, ApiError> {
        self.report_calls.fetch_add(1, Ordering::SeqCst);
        match self.report_result.lock().unwrap().clone() {
            Some(Ok(report)) => Ok(report),
            Some(Err(message)) => Err(scripted_err(&message)),
            None => Ok(sample_report(document_id)),
        }
    }

    async fn me(&self) -> Result<UserProfile, ApiError> {
        self.profile
            .lock()
            .unwrap()
            .clone()
            .ok_or(ApiError::Unauthorized)
    }

    async fn list_workspaces(&self) -> Result<Vec<WorkspaceSummary>, ApiError> {
        self.workspace_list_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.workspaces.lock().unwrap().clone())
    }

    async fn create_workspace(&self, _name: &str) -> Result<(), ApiError> {
        Ok(())
    }

    async fn rename_workspace(&self, _id: i64, _name: &str) -> Result<(), ApiError> {
        Ok(())
    }

    async fn delete_workspace(&self, _id: i64) -> Result<(), ApiError> {
        Ok(())
    }

    async fn list_members(&self, workspace_id: i64) -> Result<Vec<WorkspaceMember>, ApiError> {
        self.member_list_ids.lock().unwrap().push(workspace_id);
        Ok(self
            .members
            .lock()
            .unwrap()
            .get(&workspace_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn add_member(&self, workspace_id: i64, email: &str) -> Result<(), ApiError> {
        self.add_member_calls.fetch_add(1, Ordering::SeqCst);
        self.members
            .lock()
            .unwrap()
            .entry(workspace_id)
            .or_default()
            .push(member(999, email, WorkspaceRole::Member));
        Ok(())
    }

    async fn remove_member(&self, workspace_id: i64, member_id: i64) -> Result<(), ApiError> {
        self.remove_member_calls.fetch_add(1, Ordering::SeqCst);
        self.members
            .lock()
            .unwrap()
            .entry(workspace_id)
            .or_default()
            .retain(|m| m.id != member_id);
        Ok(())
    }
}
