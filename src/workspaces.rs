//! Workspace management: tenant switching and member administration.
//!
//! The workspace list is fetched once per reload; switching re-points the
//! current-workspace selection without refetching the list, while members
//! for the newly current workspace are fetched separately. Mutations go to
//! the backend and are followed by a full reload of the affected
//! collection; there is no optimistic patching here.

use std::sync::{Arc, Mutex, OnceLock};

use regex::Regex;
use tracing::{debug, warn};

use crate::api::Backend;
use crate::models::{UserProfile, Workspace, WorkspaceRole};

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email regex"))
}

/// Basic email shape check, to avoid a round trip for obviously invalid
/// invites.
pub fn is_valid_email(email: &str) -> bool {
    email_regex().is_match(email.trim())
}

#[derive(Default)]
struct WorkspaceView {
    me: Option<UserProfile>,
    workspaces: Vec<Workspace>,
    /// Id of the current workspace.
    current: Option<i64>,
    loading: bool,
    error: Option<String>,
}

/// Manages the caller's workspaces and their member lists.
pub struct WorkspaceManager {
    backend: Arc<dyn Backend>,
    state: Mutex<WorkspaceView>,
}

impl WorkspaceManager {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            backend,
            state: Mutex::new(WorkspaceView::default()),
        }
    }

    // ---- state accessors -------------------------------------------------

    pub fn me(&self) -> Option<UserProfile> {
        self.state.lock().expect("workspace lock").me.clone()
    }

    pub fn workspaces(&self) -> Vec<Workspace> {
        self.state.lock().expect("workspace lock").workspaces.clone()
    }

    pub fn current_workspace(&self) -> Option<Workspace> {
        let state = self.state.lock().expect("workspace lock");
        let current = state.current?;
        state.workspaces.iter().find(|w| w.id == current).cloned()
    }

    pub fn error(&self) -> Option<String> {
        self.state.lock().expect("workspace lock").error.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state.lock().expect("workspace lock").loading
    }

    /// Whether the caller owns the current workspace.
    pub fn is_owner(&self) -> bool {
        self.current_workspace()
            .map(|w| w.current_user_role == WorkspaceRole::Owner)
            .unwrap_or(false)
    }

    // ---- loading ---------------------------------------------------------

    /// Fetch identity and workspaces, select the personal workspace as
    /// default (first workspace when none is marked personal), then fetch
    /// members for the selection.
    pub async fn init(&self) {
        {
            let mut state = self.state.lock().expect("workspace lock");
            state.loading = true;
            state.error = None;
        }

        let me = match self.backend.me().await {
            Ok(me) => me,
            Err(err) => {
                warn!("Identity probe failed: {}", err);
                let mut state = self.state.lock().expect("workspace lock");
                *state = WorkspaceView {
                    error: Some(err.to_string()),
                    ..WorkspaceView::default()
                };
                return;
            }
        };

        let current = match self.backend.list_workspaces().await {
            Ok(summaries) => {
                let workspaces: Vec<Workspace> = summaries
                    .into_iter()
                    .map(Workspace::from_summary)
                    .collect();
                let current = workspaces
                    .iter()
                    .find(|w| w.is_personal)
                    .or_else(|| workspaces.first())
                    .map(|w| w.id);

                let mut state = self.state.lock().expect("workspace lock");
                state.me = Some(me);
                state.workspaces = workspaces;
                state.current = current;
                state.loading = false;
                current
            }
            Err(err) => {
                warn!("Workspace list failed: {}", err);
                let mut state = self.state.lock().expect("workspace lock");
                *state = WorkspaceView {
                    error: Some(err.to_string()),
                    ..WorkspaceView::default()
                };
                return;
            }
        };

        if let Some(workspace_id) = current {
            self.load_members(workspace_id).await;
        }
    }

    /// Fetch the member list for one workspace and recompute the caller's
    /// role there (`member` when not found). Failures are logged and leave
    /// the previous member list in place; membership is refreshed on the
    /// next switch or reload.
    pub async fn load_members(&self, workspace_id: i64) {
        let Some(me) = self.me() else {
            return;
        };

        match self.backend.list_members(workspace_id).await {
            Ok(members) => {
                let my_role = members
                    .iter()
                    .find(|m| m.user_id == me.id)
                    .map(|m| m.role)
                    .unwrap_or(WorkspaceRole::Member);
                let mut state = self.state.lock().expect("workspace lock");
                if let Some(workspace) =
                    state.workspaces.iter_mut().find(|w| w.id == workspace_id)
                {
                    workspace.members = members;
                    workspace.current_user_role = my_role;
                }
            }
            Err(err) => {
                debug!("Member list for workspace {} failed: {}", workspace_id, err);
            }
        }
    }

    /// Re-point the current workspace. Does not refetch the workspace
    /// list; does fetch members for the newly current workspace.
    pub async fn switch(&self, workspace_id: i64) -> bool {
        let known = {
            let mut state = self.state.lock().expect("workspace lock");
            let known = state.workspaces.iter().any(|w| w.id == workspace_id);
            if known {
                state.current = Some(workspace_id);
            }
            known
        };
        if known {
            self.load_members(workspace_id).await;
        }
        known
    }

    // ---- mutations -------------------------------------------------------

    pub async fn create(&self, name: &str) {
        if name.trim().is_empty() {
            self.set_error("Workspace name must not be empty");
            return;
        }
        match self.backend.create_workspace(name.trim()).await {
            Ok(()) => self.init().await,
            Err(err) => self.set_error(&err.to_string()),
        }
    }

    pub async fn rename(&self, workspace_id: i64, name: &str) {
        if self.refuse_workspace_mutation(workspace_id) {
            return;
        }
        match self.backend.rename_workspace(workspace_id, name).await {
            Ok(()) => self.init().await,
            Err(err) => self.set_error(&err.to_string()),
        }
    }

    pub async fn delete(&self, workspace_id: i64) {
        if self.refuse_workspace_mutation(workspace_id) {
            return;
        }
        match self.backend.delete_workspace(workspace_id).await {
            Ok(()) => self.init().await,
            Err(err) => self.set_error(&err.to_string()),
        }
    }

    /// Invite a member by email.
    ///
    /// Rejected client-side, without a network call, when the email shape
    /// is invalid or the email is already present among current members
    /// (case-insensitive), or when the workspace does not allow member
    /// management.
    pub async fn add_member(&self, workspace_id: i64, email: &str) {
        if self.refuse_member_mutation(workspace_id) {
            return;
        }

        let email = email.trim();
        if !is_valid_email(email) {
            self.set_error("Invalid email address");
            return;
        }

        let duplicate = {
            let state = self.state.lock().expect("workspace lock");
            state
                .workspaces
                .iter()
                .find(|w| w.id == workspace_id)
                .map(|w| {
                    w.members
                        .iter()
                        .any(|m| m.email.eq_ignore_ascii_case(email))
                })
                .unwrap_or(false)
        };
        if duplicate {
            self.set_error("This email is already a member");
            return;
        }

        match self.backend.add_member(workspace_id, email).await {
            Ok(()) => {
                self.clear_error();
                self.load_members(workspace_id).await;
            }
            Err(err) => self.set_error(&err.to_string()),
        }
    }

    pub async fn remove_member(&self, workspace_id: i64, member_id: i64) {
        if self.refuse_member_mutation(workspace_id) {
            return;
        }
        match self.backend.remove_member(workspace_id, member_id).await {
            Ok(()) => {
                self.clear_error();
                self.load_members(workspace_id).await;
            }
            Err(err) => self.set_error(&err.to_string()),
        }
    }

    /// Clear all workspace state (logout / identity switch).
    pub fn reset(&self) {
        let mut state = self.state.lock().expect("workspace lock");
        *state = WorkspaceView::default();
    }

    // ---- guards ----------------------------------------------------------

    /// Personal workspaces expose no rename/delete.
    fn refuse_workspace_mutation(&self, workspace_id: i64) -> bool {
        let state = self.state.lock().expect("workspace lock");
        let Some(workspace) = state.workspaces.iter().find(|w| w.id == workspace_id) else {
            drop(state);
            self.set_error("Unknown workspace");
            return true;
        };
        if workspace.is_personal {
            drop(state);
            self.set_error("Personal workspaces cannot be modified");
            return true;
        }
        false
    }

    /// Member management requires a team workspace and the owner role.
    fn refuse_member_mutation(&self, workspace_id: i64) -> bool {
        if self.refuse_workspace_mutation(workspace_id) {
            return true;
        }
        let state = self.state.lock().expect("workspace lock");
        let is_owner = state
            .workspaces
            .iter()
            .find(|w| w.id == workspace_id)
            .map(|w| w.current_user_role == WorkspaceRole::Owner)
            .unwrap_or(false);
        if !is_owner {
            drop(state);
            self.set_error("Only the workspace owner can manage members");
            return true;
        }
        false
    }

    fn set_error(&self, message: &str) {
        self.state.lock().expect("workspace lock").error = Some(message.to_string());
    }

    fn clear_error(&self) {
        self.state.lock().expect("workspace lock").error = None;
    }
}
