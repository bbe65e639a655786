//! docsight — client for an AI document-analysis service.
//!
//! Upload documents, poll their processing status, fetch and normalize the
//! generated reports, and manage workspaces and session state. The state
//! modules (`registry`, `workspaces`) talk to the backend through the
//! [`api::Backend`] trait so they can be exercised without a server.

pub mod api;
pub mod cli;
pub mod config;
pub mod models;
pub mod poller;
pub mod registry;
pub mod session;
pub mod workspaces;
