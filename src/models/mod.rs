//! Data models for docsight.

mod document;
mod report;
mod workspace;

pub use document::{DocumentRecord, DocumentSnapshot, DocumentStatus};
pub use report::{
    normalize_content, scalar_to_display, unit_symbol, KeyFigure, Report, ReportSection,
};
pub use workspace::{
    local_part, UserProfile, Workspace, WorkspaceMember, WorkspaceRole, WorkspaceSummary,
};
