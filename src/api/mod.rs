//! REST client for the document-analysis backend.
//!
//! `ApiClient` owns the HTTP plumbing: bearer-token attachment, the global
//! 401-invalidates-session rule, non-2xx mapping, and payload decoding.
//! State modules talk to the backend through the `Backend` trait so they
//! can be driven by an in-memory fake in tests.

pub mod wire;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::json;
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::config::Settings;
use crate::models::{
    DocumentSnapshot, Report, UserProfile, WorkspaceMember, WorkspaceSummary,
};
use crate::session::SessionStore;

/// Errors from backend operations.
///
/// Callers at the state-module boundary collapse these into a single
/// user-facing string; the variants exist for logging and tests.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("HTTP {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Session expired, please log in again")]
    Unauthorized,

    #[error("Invalid base URL: {0}")]
    BaseUrl(String),
}

/// The backend REST surface consumed by the client.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Upload a document; returns the durable document id.
    async fn upload_document(
        &self,
        filename: &str,
        bytes: Vec<u8>,
        language: &str,
        workspace_id: Option<i64>,
    ) -> Result<i64, ApiError>;

    async fn list_documents(
        &self,
        workspace_id: Option<i64>,
    ) -> Result<Vec<DocumentSnapshot>, ApiError>;

    async fn get_document(&self, id: i64) -> Result<DocumentSnapshot, ApiError>;

    async fn rename_document(&self, id: i64, filename: &str) -> Result<(), ApiError>;

    async fn delete_document(&self, id: i64) -> Result<(), ApiError>;

    /// Fetch and normalize the report for a completed document.
    async fn fetch_report(&self, document_id: i64) -> Result<Report, ApiError>;

    async fn me(&self) -> Result<UserProfile, ApiError>;

    async fn list_workspaces(&self) -> Result<Vec<WorkspaceSummary>, ApiError>;

    async fn create_workspace(&self, name: &str) -> Result<(), ApiError>;

    async fn rename_workspace(&self, id: i64, name: &str) -> Result<(), ApiError>;

    async fn delete_workspace(&self, id: i64) -> Result<(), ApiError>;

    async fn list_members(&self, workspace_id: i64) -> Result<Vec<WorkspaceMember>, ApiError>;

    async fn add_member(&self, workspace_id: i64, email: &str) -> Result<(), ApiError>;

    async fn remove_member(&self, workspace_id: i64, member_id: i64) -> Result<(), ApiError>;
}

/// HTTP client for the backend API.
pub struct ApiClient {
    http: Client,
    base: Url,
    session: Arc<SessionStore>,
}

impl ApiClient {
    /// Create a client from settings and a shared session.
    pub fn new(settings: &Settings, session: Arc<SessionStore>) -> Result<Self, ApiError> {
        let mut base = Url::parse(&settings.api_base_url)
            .map_err(|err| ApiError::BaseUrl(err.to_string()))?;
        // Relative joins drop the last path segment without this.
        if !base.path().ends_with('/') {
            base.set_path(&format!("{}/", base.path()));
        }

        let http = Client::builder()
            .timeout(settings.request_timeout())
            .gzip(true)
            .brotli(true)
            .build()
            .map_err(|err| ApiError::Connection(err.to_string()))?;

        Ok(Self {
            http,
            base,
            session,
        })
    }

    /// Create a client with a custom per-request timeout, for long uploads.
    pub fn with_timeout(
        settings: &Settings,
        session: Arc<SessionStore>,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        let mut settings = settings.clone();
        settings.request_timeout_secs = timeout.as_secs().max(1);
        Self::new(&settings, session)
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        self.base
            .join(path)
            .map_err(|err| ApiError::BaseUrl(err.to_string()))
    }

    /// Attach the bearer token (when present), send, and apply the shared
    /// response rules: 401 clears the stored token, non-2xx maps to
    /// `ApiError::Api` with the backend's detail message when available.
    async fn execute(&self, builder: RequestBuilder) -> Result<Response, ApiError> {
        let builder = match self.session.token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        };

        let response = builder
            .send()
            .await
            .map_err(|err| ApiError::Connection(err.to_string()))?;

        if response.status() == StatusCode::UNAUTHORIZED {
            debug!("Received 401, invalidating stored session token");
            self.session.clear_token();
            return Err(ApiError::Unauthorized);
        }

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Api {
                status,
                message: error_detail(&body),
            });
        }

        Ok(response)
    }

    async fn decode<T: DeserializeOwned>(&self, response: Response) -> Result<T, ApiError> {
        response
            .json()
            .await
            .map_err(|err| ApiError::Parse(err.to_string()))
    }
}

/// Prefer the backend's `detail` field, fall back to a body snippet.
fn error_detail(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        if let Some(detail) = value.get("detail").and_then(|d| d.as_str()) {
            return detail.to_string();
        }
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        "Request failed".to_string()
    } else {
        trimmed.chars().take(200).collect()
    }
}

#[async_trait]
impl Backend for ApiClient {
    async fn upload_document(
        &self,
        filename: &str,
        bytes: Vec<u8>,
        language: &str,
        workspace_id: Option<i64>,
    ) -> Result<i64, ApiError> {
        let mime = mime_guess::from_path(filename)
            .first_or_octet_stream()
            .essence_str()
            .to_string();
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(filename.to_string())
            .mime_str(&mime)
            .map_err(|err| ApiError::Parse(err.to_string()))?;

        let mut form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("language", language.to_string());
        if let Some(ws) = workspace_id {
            form = form.text("workspace_id", ws.to_string());
        }

        let url = self.endpoint("documents/upload")?;
        let response = self.execute(self.http.post(url).multipart(form)).await?;
        let ack: wire::UploadAck = self.decode(response).await?;
        ack.document_id()
            .ok_or_else(|| ApiError::Parse("Upload ack carried no document id".to_string()))
    }

    async fn list_documents(
        &self,
        workspace_id: Option<i64>,
    ) -> Result<Vec<DocumentSnapshot>, ApiError> {
        let url = self.endpoint("documents/")?;
        let mut builder = self.http.get(url);
        if let Some(ws) = workspace_id {
            builder = builder.query(&[("workspace_id", ws)]);
        }
        let response = self.execute(builder).await?;
        let documents: Vec<wire::DocumentApi> = self.decode(response).await?;
        Ok(documents.into_iter().map(|d| d.into_snapshot()).collect())
    }

    async fn get_document(&self, id: i64) -> Result<DocumentSnapshot, ApiError> {
        let url = self.endpoint(&format!("documents/{id}"))?;
        let response = self.execute(self.http.get(url)).await?;
        let document: wire::DocumentApi = self.decode(response).await?;
        Ok(document.into_snapshot())
    }

    async fn rename_document(&self, id: i64, filename: &str) -> Result<(), ApiError> {
        let url = self.endpoint(&format!("documents/{id}"))?;
        self.execute(self.http.patch(url).json(&json!({ "filename": filename })))
            .await?;
        Ok(())
    }

    async fn delete_document(&self, id: i64) -> Result<(), ApiError> {
        let url = self.endpoint(&format!("documents/{id}"))?;
        self.execute(self.http.delete(url)).await?;
        Ok(())
    }

    async fn fetch_report(&self, document_id: i64) -> Result<Report, ApiError> {
        let url = self.endpoint(&format!("reports/{document_id}"))?;
        let response = self.execute(self.http.get(url)).await?;
        let report: wire::ReportApi = self.decode(response).await?;
        Ok(report.normalize())
    }

    async fn me(&self) -> Result<UserProfile, ApiError> {
        let url = self.endpoint("auth/me")?;
        let response = self.execute(self.http.get(url)).await?;
        let me: wire::MeApi = self.decode(response).await?;
        Ok(me.into_profile())
    }

    async fn list_workspaces(&self) -> Result<Vec<WorkspaceSummary>, ApiError> {
        let url = self.endpoint("workspaces")?;
        let response = self.execute(self.http.get(url)).await?;
        let workspaces: Vec<wire::WorkspaceApi> = self.decode(response).await?;
        Ok(workspaces.into_iter().map(|w| w.into_summary()).collect())
    }

    async fn create_workspace(&self, name: &str) -> Result<(), ApiError> {
        let url = self.endpoint("workspaces")?;
        self.execute(self.http.post(url).json(&json!({ "name": name })))
            .await?;
        Ok(())
    }

    async fn rename_workspace(&self, id: i64, name: &str) -> Result<(), ApiError> {
        let url = self.endpoint(&format!("workspaces/{id}"))?;
        self.execute(self.http.patch(url).json(&json!({ "name": name })))
            .await?;
        Ok(())
    }

    async fn delete_workspace(&self, id: i64) -> Result<(), ApiError> {
        let url = self.endpoint(&format!("workspaces/{id}"))?;
        self.execute(self.http.delete(url)).await?;
        Ok(())
    }

    async fn list_members(&self, workspace_id: i64) -> Result<Vec<WorkspaceMember>, ApiError> {
        let url = self.endpoint(&format!("workspaces/{workspace_id}/members"))?;
        let response = self.execute(self.http.get(url)).await?;
        let members: Vec<wire::MemberApi> = self.decode(response).await?;
        Ok(members.into_iter().map(|m| m.into_member()).collect())
    }

    async fn add_member(&self, workspace_id: i64, email: &str) -> Result<(), ApiError> {
        let url = self.endpoint(&format!("workspaces/{workspace_id}/members"))?;
        self.execute(self.http.post(url).json(&json!({ "email": email })))
            .await?;
        Ok(())
    }

    async fn remove_member(&self, workspace_id: i64, member_id: i64) -> Result<(), ApiError> {
        let url = self.endpoint(&format!("workspaces/{workspace_id}/members/{member_id}"))?;
        self.execute(self.http.delete(url)).await?;
        Ok(())
    }
}
