//! Shared CLI plumbing: context construction and display helpers.

use std::path::Path;
use std::sync::Arc;

use console::style;

use crate::api::ApiClient;
use crate::config::{load_settings, Settings};
use crate::models::{DocumentRecord, DocumentStatus};
use crate::session::SessionStore;

/// Everything a command needs to talk to the backend.
pub struct AppContext {
    pub settings: Settings,
    pub session: Arc<SessionStore>,
    pub client: Arc<ApiClient>,
}

impl AppContext {
    pub fn build(config: Option<&Path>) -> anyhow::Result<Self> {
        let settings = load_settings(config)?;
        let session = Arc::new(match SessionStore::default_path() {
            Some(path) => SessionStore::open(path),
            None => SessionStore::in_memory(),
        });
        let client = Arc::new(ApiClient::new(&settings, session.clone())?);
        Ok(Self {
            settings,
            session,
            client,
        })
    }
}

/// Colorize a status for terminal output.
pub fn styled_status(status: &DocumentStatus) -> String {
    let text = status.as_str();
    match status {
        DocumentStatus::Completed => style(text).green().to_string(),
        DocumentStatus::Failed => style(text).red().to_string(),
        DocumentStatus::ParsedEmpty => style(text).yellow().to_string(),
        _ => style(text).cyan().to_string(),
    }
}

/// Human-readable byte size.
pub fn format_size(size: Option<u64>) -> String {
    match size {
        None => "-".to_string(),
        Some(bytes) if bytes < 1024 => format!("{} B", bytes),
        Some(bytes) if bytes < 1024 * 1024 => format!("{:.1} KiB", bytes as f64 / 1024.0),
        Some(bytes) => format!("{:.1} MiB", bytes as f64 / (1024.0 * 1024.0)),
    }
}

/// One list line for a document.
pub fn document_line(doc: &DocumentRecord) -> String {
    let id = doc
        .id
        .map(|id| id.to_string())
        .unwrap_or_else(|| "-".to_string());
    format!(
        "{:>6}  {:<18}  {:>10}  {}",
        id,
        styled_status(&doc.status),
        format_size(doc.size_bytes),
        doc.filename
    )
}
