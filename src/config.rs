//! Configuration management for docsight.
//!
//! Settings come from a TOML file (explicit path, `./docsight.toml`, or the
//! user config directory) with `DOCSIGHT_*` environment variables taking
//! precedence. A `.env` file is honored by `main` before settings load.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Fixed poll interval between document status requests.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 3;
/// Maximum duration a poll loop runs before stopping unconditionally.
pub const DEFAULT_POLL_TIMEOUT_SECS: u64 = 300;

fn default_api_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_poll_interval() -> u64 {
    DEFAULT_POLL_INTERVAL_SECS
}

fn default_poll_timeout() -> u64 {
    DEFAULT_POLL_TIMEOUT_SECS
}

fn default_request_timeout() -> u64 {
    30
}

/// Client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Base URL of the document-analysis backend.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_poll_timeout")]
    pub poll_timeout_secs: u64,
    /// Per-request timeout for ordinary API calls.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            poll_interval_secs: default_poll_interval(),
            poll_timeout_secs: default_poll_timeout(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl Settings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }

    pub fn poll_timeout(&self) -> Duration {
        Duration::from_secs(self.poll_timeout_secs.max(1))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    /// Apply `DOCSIGHT_*` environment overrides.
    fn apply_env(&mut self) {
        if let Ok(url) = std::env::var("DOCSIGHT_API_BASE_URL") {
            if !url.trim().is_empty() {
                self.api_base_url = url.trim().to_string();
            }
        }
        if let Some(secs) = env_u64("DOCSIGHT_POLL_INTERVAL_SECS") {
            self.poll_interval_secs = secs;
        }
        if let Some(secs) = env_u64("DOCSIGHT_POLL_TIMEOUT_SECS") {
            self.poll_timeout_secs = secs;
        }
        if let Some(secs) = env_u64("DOCSIGHT_REQUEST_TIMEOUT_SECS") {
            self.request_timeout_secs = secs;
        }
    }
}

fn env_u64(key: &str) -> Option<u64> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

/// Candidate config file locations, in priority order.
fn candidate_paths() -> Vec<PathBuf> {
    let mut candidates = vec![PathBuf::from("docsight.toml")];
    if let Some(dir) = dirs::config_dir() {
        candidates.push(dir.join("docsight").join("config.toml"));
    }
    candidates
}

/// Load settings from `explicit` (required to exist when given), otherwise
/// from the first discovered config file, otherwise defaults. Environment
/// overrides apply last.
pub fn load_settings(explicit: Option<&Path>) -> anyhow::Result<Settings> {
    let mut settings = match explicit {
        Some(path) => {
            let raw = std::fs::read_to_string(path).map_err(|err| {
                anyhow::anyhow!("Failed to read config {}: {}", path.display(), err)
            })?;
            toml::from_str(&raw).map_err(|err| {
                anyhow::anyhow!("Failed to parse config {}: {}", path.display(), err)
            })?
        }
        None => {
            let mut found: Option<Settings> = None;
            for candidate in candidate_paths() {
                if candidate.is_file() {
                    debug!("Loading settings from {}", candidate.display());
                    let raw = std::fs::read_to_string(&candidate)?;
                    found = Some(toml::from_str(&raw).map_err(|err| {
                        anyhow::anyhow!(
                            "Failed to parse config {}: {}",
                            candidate.display(),
                            err
                        )
                    })?);
                    break;
                }
            }
            found.unwrap_or_default()
        }
    };

    settings.apply_env();
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.api_base_url, "http://localhost:8000");
        assert_eq!(settings.poll_interval(), Duration::from_secs(3));
        assert_eq!(settings.poll_timeout(), Duration::from_secs(300));
    }

    #[test]
    fn test_partial_file() {
        let settings: Settings =
            toml::from_str("api_base_url = \"https://api.example.com\"").unwrap();
        assert_eq!(settings.api_base_url, "https://api.example.com");
        assert_eq!(settings.poll_interval_secs, DEFAULT_POLL_INTERVAL_SECS);
    }

    #[test]
    fn test_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("docsight.toml");
        std::fs::write(&path, "poll_interval_secs = 10\n").unwrap();

        let settings = load_settings(Some(&path)).unwrap();
        assert_eq!(settings.poll_interval_secs, 10);

        let missing = dir.path().join("absent.toml");
        assert!(load_settings(Some(&missing)).is_err());
    }

    #[test]
    fn test_zero_intervals_clamped() {
        let settings = Settings {
            poll_interval_secs: 0,
            ..Settings::default()
        };
        assert_eq!(settings.poll_interval(), Duration::from_secs(1));
    }
}
