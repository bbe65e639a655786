//! Wire-format payloads and their normalization into model types.
//!
//! All schema tolerance lives here: upload acks that use `document_id` or
//! `id`, section headings under `heading` or `title`, key figures as either
//! an ordered sequence or the legacy name-to-value mapping.

use serde::Deserialize;
use serde_json::Value;

use crate::models::{
    local_part, normalize_content, scalar_to_display, DocumentSnapshot, DocumentStatus, KeyFigure,
    Report, ReportSection, UserProfile, WorkspaceMember, WorkspaceRole, WorkspaceSummary,
};

/// Acknowledgement for a document upload.
///
/// Older backends return `id`, newer ones `document_id`.
#[derive(Debug, Deserialize)]
pub struct UploadAck {
    #[serde(default)]
    pub document_id: Option<i64>,
    #[serde(default)]
    pub id: Option<i64>,
}

impl UploadAck {
    pub fn document_id(&self) -> Option<i64> {
        self.document_id.or(self.id)
    }
}

/// A document as returned by list and status endpoints.
#[derive(Debug, Deserialize)]
pub struct DocumentApi {
    pub id: i64,
    #[serde(default)]
    pub client_id: Option<String>,
    pub filename: String,
    pub file_status: DocumentStatus,
    pub created_at: String,
    #[serde(default)]
    pub size: Option<u64>,
}

impl DocumentApi {
    pub fn into_snapshot(self) -> DocumentSnapshot {
        DocumentSnapshot {
            id: self.id,
            client_id: self.client_id.filter(|c| !c.is_empty()),
            filename: self.filename,
            status: self.file_status,
            created_at: self.created_at,
            size_bytes: self.size,
        }
    }
}

/// Key figures across both schema generations.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum KeyFiguresApi {
    /// Current schema: ordered sequence of figure objects.
    Ordered(Vec<KeyFigureApi>),
    /// Legacy schema: unordered name-to-value mapping.
    Named(serde_json::Map<String, Value>),
}

#[derive(Debug, Deserialize)]
pub struct KeyFigureApi {
    pub name: String,
    /// May arrive as a string or a bare number.
    #[serde(default)]
    pub value: Value,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub context: Option<String>,
}

impl KeyFiguresApi {
    pub fn normalize(self) -> Vec<KeyFigure> {
        match self {
            Self::Ordered(figures) => figures
                .into_iter()
                .map(|f| KeyFigure {
                    name: f.name,
                    value: scalar_to_display(&f.value),
                    unit: f.unit.unwrap_or_default(),
                    context: f.context,
                })
                .collect(),
            Self::Named(map) => map
                .into_iter()
                .map(|(name, value)| KeyFigure {
                    name,
                    value: scalar_to_display(&value),
                    unit: String::new(),
                    context: None,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SectionApi {
    #[serde(default)]
    pub heading: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Value,
    #[serde(default)]
    pub sources: Option<Vec<String>>,
}

impl SectionApi {
    pub fn normalize(self) -> ReportSection {
        let heading = self
            .heading
            .filter(|h| !h.is_empty())
            .or(self.title.filter(|t| !t.is_empty()))
            .unwrap_or_else(|| "Section".to_string());
        ReportSection {
            heading,
            content: normalize_content(&self.content),
            sources: self.sources.unwrap_or_default(),
        }
    }
}

/// A report payload before normalization.
#[derive(Debug, Deserialize)]
pub struct ReportApi {
    pub document_id: i64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub key_figures: Option<KeyFiguresApi>,
    #[serde(default)]
    pub sections: Vec<SectionApi>,
    #[serde(default)]
    pub conclusion: Option<String>,
    #[serde(default)]
    pub generated_at: Option<String>,
}

impl ReportApi {
    pub fn normalize(self) -> Report {
        Report {
            document_id: self.document_id,
            title: self.title,
            summary: self.summary,
            key_figures: self.key_figures.map(|k| k.normalize()).unwrap_or_default(),
            sections: self.sections.into_iter().map(|s| s.normalize()).collect(),
            conclusion: self.conclusion,
            generated_at: self.generated_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct WorkspaceApi {
    pub id: i64,
    pub name: String,
    /// `"personal"` or `"team"`.
    #[serde(rename = "type")]
    pub kind: String,
}

impl WorkspaceApi {
    pub fn into_summary(self) -> WorkspaceSummary {
        WorkspaceSummary {
            id: self.id,
            name: self.name,
            is_personal: self.kind == "personal",
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct MemberApi {
    pub user_id: i64,
    pub email: String,
    #[serde(default)]
    pub full_name: Option<String>,
    pub role: WorkspaceRole,
}

impl MemberApi {
    pub fn into_member(self) -> WorkspaceMember {
        let name = self
            .full_name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| local_part(&self.email).to_string());
        WorkspaceMember {
            id: self.user_id,
            user_id: self.user_id,
            name,
            email: self.email,
            role: self.role,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct MeApi {
    pub id: i64,
    pub email: String,
    #[serde(default)]
    pub full_name: Option<String>,
}

impl MeApi {
    pub fn into_profile(self) -> UserProfile {
        UserProfile {
            id: self.id,
            email: self.email,
            full_name: self.full_name,
        }
    }
}
