//! Workspace and membership models.
//!
//! A workspace is a tenant scope that documents are optionally partitioned
//! by. Every user has exactly one personal workspace; team workspaces carry
//! a member list with owner/member roles.

use serde::{Deserialize, Serialize};

/// Role of a user within a workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkspaceRole {
    Owner,
    Member,
}

impl WorkspaceRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Owner => "owner",
            Self::Member => "member",
        }
    }
}

impl std::fmt::Display for WorkspaceRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The authenticated user, as reported by the identity probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: i64,
    pub email: String,
    #[serde(default)]
    pub full_name: Option<String>,
}

impl UserProfile {
    /// Display name, falling back to the local part of the email.
    pub fn display_name(&self) -> String {
        self.full_name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .map(|n| n.to_string())
            .unwrap_or_else(|| local_part(&self.email).to_string())
    }
}

/// A member of a team workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceMember {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub email: String,
    pub role: WorkspaceRole,
}

/// A workspace summary as listed by the backend (no members attached).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceSummary {
    pub id: i64,
    pub name: String,
    pub is_personal: bool,
}

/// A workspace with its member list and the caller's computed role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    pub id: i64,
    pub name: String,
    pub is_personal: bool,
    pub members: Vec<WorkspaceMember>,
    pub current_user_role: WorkspaceRole,
}

impl Workspace {
    /// Start from a listing summary; members arrive from a separate fetch.
    pub fn from_summary(summary: WorkspaceSummary) -> Self {
        Self {
            id: summary.id,
            name: summary.name,
            is_personal: summary.is_personal,
            members: Vec::new(),
            current_user_role: WorkspaceRole::Member,
        }
    }
}

/// Local part of an email address, used as a fallback display name.
pub fn local_part(email: &str) -> &str {
    email.split('@').next().unwrap_or(email)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_fallback() {
        let me = UserProfile {
            id: 1,
            email: "ana@example.com".to_string(),
            full_name: None,
        };
        assert_eq!(me.display_name(), "ana");

        let named = UserProfile {
            full_name: Some("Ana Lima".to_string()),
            ..me
        };
        assert_eq!(named.display_name(), "Ana Lima");
    }

    #[test]
    fn test_role_serde() {
        let role: WorkspaceRole = serde_json::from_str("\"owner\"").unwrap();
        assert_eq!(role, WorkspaceRole::Owner);
        assert_eq!(role.as_str(), "owner");
    }
}
