//! Session state: bearer token and preferred report language.
//!
//! Replaces ambient browser-local storage with an explicit object that is
//! set at login, read by every request, and cleared on logout or on any
//! 401 response. Persisted as a small JSON file under the user config
//! directory; persistence failures degrade to an in-memory session.

use std::path::PathBuf;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Default report/chat output language.
pub const DEFAULT_LANGUAGE: &str = "de";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default = "default_language")]
    pub language: String,
}

fn default_language() -> String {
    DEFAULT_LANGUAGE.to_string()
}

impl Default for Session {
    fn default() -> Self {
        Self {
            token: None,
            language: default_language(),
        }
    }
}

/// Shared, persisted session state.
pub struct SessionStore {
    path: Option<PathBuf>,
    inner: RwLock<Session>,
}

impl SessionStore {
    /// A session that is never written to disk.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            inner: RwLock::new(Session::default()),
        }
    }

    /// Open (or initialize) the session file at `path`.
    ///
    /// A missing or malformed file yields a fresh default session.
    pub fn open(path: PathBuf) -> Self {
        let session = match std::fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(session) => session,
                Err(err) => {
                    warn!("Ignoring malformed session file {}: {}", path.display(), err);
                    Session::default()
                }
            },
            Err(_) => Session::default(),
        };
        Self {
            path: Some(path),
            inner: RwLock::new(session),
        }
    }

    /// Default session file location under the user config directory.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("docsight").join("session.json"))
    }

    pub fn token(&self) -> Option<String> {
        self.inner.read().expect("session lock poisoned").token.clone()
    }

    pub fn set_token(&self, token: &str) {
        let mut session = self.inner.write().expect("session lock poisoned");
        session.token = Some(token.to_string());
        self.persist(&session);
    }

    /// Drop the stored token, forcing re-authentication.
    pub fn clear_token(&self) {
        let mut session = self.inner.write().expect("session lock poisoned");
        if session.token.take().is_some() {
            debug!("Cleared stored auth token");
        }
        self.persist(&session);
    }

    pub fn is_authenticated(&self) -> bool {
        self.inner
            .read()
            .expect("session lock poisoned")
            .token
            .is_some()
    }

    /// Preferred report language; empty or whitespace values fall back to
    /// the default.
    pub fn language(&self) -> String {
        let session = self.inner.read().expect("session lock poisoned");
        let trimmed = session.language.trim();
        if trimmed.is_empty() {
            default_language()
        } else {
            trimmed.to_string()
        }
    }

    pub fn set_language(&self, language: &str) {
        let mut session = self.inner.write().expect("session lock poisoned");
        session.language = language.trim().to_string();
        self.persist(&session);
    }

    fn persist(&self, session: &Session) {
        let Some(path) = &self.path else {
            return;
        };
        if let Some(parent) = path.parent() {
            if let Err(err) = std::fs::create_dir_all(parent) {
                warn!("Failed to create session dir {}: {}", parent.display(), err);
                return;
            }
        }
        match serde_json::to_string_pretty(session) {
            Ok(raw) => {
                if let Err(err) = std::fs::write(path, raw) {
                    warn!("Failed to write session file {}: {}", path.display(), err);
                }
            }
            Err(err) => warn!("Failed to serialize session: {}", err),
        }
    }
}
