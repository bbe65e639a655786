//! Document models for upload tracking and processing lifecycle.
//!
//! A document is uploaded by the user and tracked through the backend
//! processing pipeline by polling. Until the backend assigns a durable id,
//! the record is a client-side placeholder identified by `client_id`.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Processing status of a document.
///
/// Statuses other than the terminal three are transient and expected to
/// change on the next poll. Unrecognized values from newer backends are
/// carried through as `Unknown` rather than failing deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DocumentStatus {
    Uploaded,
    Processing,
    Parsing,
    Chunking,
    Embedding,
    Blocking,
    Structuring,
    Structured,
    ReportGenerating,
    Reporting,
    Completed,
    ParsedEmpty,
    Failed,
    Unknown(String),
}

impl DocumentStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Uploaded => "uploaded",
            Self::Processing => "processing",
            Self::Parsing => "parsing",
            Self::Chunking => "chunking",
            Self::Embedding => "embedding",
            Self::Blocking => "blocking",
            Self::Structuring => "structuring",
            Self::Structured => "structured",
            Self::ReportGenerating => "report_generating",
            Self::Reporting => "reporting",
            Self::Completed => "completed",
            Self::ParsedEmpty => "parsed_empty",
            Self::Failed => "failed",
            Self::Unknown(s) => s,
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "uploaded" => Self::Uploaded,
            "processing" => Self::Processing,
            "parsing" => Self::Parsing,
            "chunking" => Self::Chunking,
            "embedding" => Self::Embedding,
            "blocking" => Self::Blocking,
            "structuring" => Self::Structuring,
            "structured" => Self::Structured,
            "report_generating" => Self::ReportGenerating,
            "reporting" => Self::Reporting,
            "completed" => Self::Completed,
            "parsed_empty" => Self::ParsedEmpty,
            "failed" => Self::Failed,
            other => Self::Unknown(other.to_string()),
        }
    }

    /// Whether no further automatic transition is expected.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::ParsedEmpty)
    }

    /// Whether the document finished processing successfully.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

impl From<String> for DocumentStatus {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl From<DocumentStatus> for String {
    fn from(s: DocumentStatus) -> Self {
        s.as_str().to_string()
    }
}

impl std::fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A document status snapshot as reported by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentSnapshot {
    pub id: i64,
    /// Client-generated token, echoed back by backends that store it.
    pub client_id: Option<String>,
    pub filename: String,
    pub status: DocumentStatus,
    /// Serialized timestamp, kept as received to avoid cross-boundary
    /// serialization ambiguity.
    pub created_at: String,
    pub size_bytes: Option<u64>,
}

/// A tracked document in the registry.
///
/// `client_id` is stable across the placeholder-to-durable transition so a
/// replacing entry keeps its list identity. `id` is `None` until the backend
/// accepts the upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub id: Option<i64>,
    pub client_id: String,
    pub filename: String,
    pub status: DocumentStatus,
    pub created_at: String,
    pub size_bytes: Option<u64>,
}

impl DocumentRecord {
    /// Create a not-yet-durable placeholder for an in-flight upload.
    pub fn placeholder(filename: &str, size_bytes: Option<u64>) -> Self {
        Self {
            id: None,
            client_id: Uuid::new_v4().to_string(),
            filename: filename.to_string(),
            status: DocumentStatus::Uploaded,
            created_at: Utc::now().to_rfc3339(),
            size_bytes,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.id.is_none()
    }

    /// Build a record from a backend snapshot.
    ///
    /// When the backend does not echo a client id, the durable id doubles
    /// as the list identity.
    pub fn from_snapshot(snapshot: DocumentSnapshot) -> Self {
        let client_id = snapshot
            .client_id
            .unwrap_or_else(|| snapshot.id.to_string());
        Self {
            id: Some(snapshot.id),
            client_id,
            filename: snapshot.filename,
            status: snapshot.status,
            created_at: snapshot.created_at,
            size_bytes: snapshot.size_bytes,
        }
    }

    /// Like `from_snapshot`, but keeps an existing client id when the
    /// backend does not supply one, so list identity survives replacement.
    pub fn from_snapshot_keeping_identity(snapshot: DocumentSnapshot, client_id: &str) -> Self {
        let snapshot = DocumentSnapshot {
            client_id: snapshot
                .client_id
                .filter(|c| !c.is_empty())
                .or_else(|| Some(client_id.to_string())),
            ..snapshot
        };
        Self::from_snapshot(snapshot)
    }
}
