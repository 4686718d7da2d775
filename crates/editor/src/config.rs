// Local configuration for editor sessions.
//
// File: `~/.proforma/config.toml`
// Environment overrides: `PROFORMA_REMOTE_URL`, `PROFORMA_REQUEST_TIMEOUT_SECS`,
// `PROFORMA_LOG`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::warn;
use url::Url;

pub const ENV_REMOTE_URL: &str = "PROFORMA_REMOTE_URL";
pub const ENV_REQUEST_TIMEOUT_SECS: &str = "PROFORMA_REQUEST_TIMEOUT_SECS";
pub const ENV_LOG: &str = "PROFORMA_LOG";

/// Root directory for Proforma state: `~/.proforma/`.
pub fn config_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".proforma"))
}

/// Path to the config file: `~/.proforma/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join("config.toml"))
}

// ── Config ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EditorConfig {
    /// `tracing` filter directive used when `RUST_LOG` is unset.
    pub log_filter: String,
    pub remote: RemoteConfig,
    pub editor: BehaviorConfig,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            log_filter: "info".into(),
            remote: RemoteConfig::default(),
            editor: BehaviorConfig::default(),
        }
    }
}

/// Where the remote store lives.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RemoteConfig {
    /// Base URL of the website exposing `/api/update_template` etc.
    pub base_url: Option<String>,
    pub request_timeout_secs: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self { base_url: None, request_timeout_secs: 10 }
    }
}

impl RemoteConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Editor behaviour toggles.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct BehaviorConfig {
    /// Ask the host before deleting a persisted field.
    pub confirm_field_delete: bool,
    /// Include a dirty template in "save all changed".
    pub save_template_with_batch: bool,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self { confirm_field_delete: true, save_template_with_batch: true }
    }
}

impl EditorConfig {
    /// Load `~/.proforma/config.toml` and apply environment overrides.
    /// A missing file yields defaults; an unreadable or malformed one is an
    /// error.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match config_path() {
            Some(path) if path.exists() => Self::load_from(&path)?,
            _ => Self::default(),
        };
        config.apply_env();
        Ok(config)
    }

    /// Load from a specific path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        let config: Self = toml::from_str(&contents).map_err(ConfigError::Parse)?;
        if config.remote.request_timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        Ok(config)
    }

    /// Save to a specific path (creates parent directories).
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(ConfigError::Io)?;
        }
        let contents = toml::to_string_pretty(self).map_err(ConfigError::Serialize)?;
        std::fs::write(path, contents).map_err(ConfigError::Io)
    }

    pub fn apply_env(&mut self) {
        self.apply_env_fn(|key| std::env::var(key));
    }

    /// Testable override step that accepts an environment lookup function.
    /// A timeout that is not a positive number of seconds is logged and
    /// ignored.
    pub fn apply_env_fn<F>(&mut self, env: F)
    where
        F: Fn(&str) -> Result<String, std::env::VarError>,
    {
        if let Ok(url) = env(ENV_REMOTE_URL) {
            self.remote.base_url = Some(url);
        }
        if let Ok(raw) = env(ENV_REQUEST_TIMEOUT_SECS) {
            match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => self.remote.request_timeout_secs = secs,
                _ => warn!(
                    var = ENV_REQUEST_TIMEOUT_SECS,
                    value = %raw,
                    "ignoring timeout override, expected a positive number of seconds"
                ),
            }
        }
        if let Ok(filter) = env(ENV_LOG) {
            self.log_filter = filter;
        }
    }

    /// The validated remote base URL.
    pub fn remote_url(&self) -> Result<Url, ConfigError> {
        let raw = self.remote.base_url.as_deref().ok_or(ConfigError::MissingRemoteUrl)?;
        Url::parse(raw).map_err(|source| ConfigError::InvalidRemoteUrl { url: raw.to_string(), source })
    }
}

// ── Errors ─────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config I/O error: {0}")]
    Io(std::io::Error),
    #[error("config parse error: {0}")]
    Parse(toml::de::Error),
    #[error("config serialize error: {0}")]
    Serialize(toml::ser::Error),
    #[error("no remote configured; set [remote] base_url or {ENV_REMOTE_URL}")]
    MissingRemoteUrl,
    #[error("invalid remote url `{url}`: {source}")]
    InvalidRemoteUrl { url: String, source: url::ParseError },
    #[error("[remote] request_timeout_secs must be at least 1")]
    ZeroTimeout,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn env_from_map(
        map: HashMap<&'static str, &'static str>,
    ) -> impl Fn(&str) -> Result<String, std::env::VarError> {
        move |key: &str| map.get(key).map(|v| v.to_string()).ok_or(std::env::VarError::NotPresent)
    }

    #[test]
    fn defaults() {
        let cfg = EditorConfig::default();
        assert_eq!(cfg.log_filter, "info");
        assert!(cfg.remote.base_url.is_none());
        assert_eq!(cfg.remote.request_timeout(), Duration::from_secs(10));
        assert!(cfg.editor.confirm_field_delete);
        assert!(cfg.editor.save_template_with_batch);
    }

    #[test]
    fn roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");

        let cfg = EditorConfig {
            log_filter: "proforma_editor=debug".into(),
            remote: RemoteConfig {
                base_url: Some("https://forms.example.com".into()),
                request_timeout_secs: 3,
            },
            editor: BehaviorConfig { confirm_field_delete: false, save_template_with_batch: false },
        };
        cfg.save_to(&path).unwrap();
        assert_eq!(EditorConfig::load_from(&path).unwrap(), cfg);
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let cfg: EditorConfig = toml::from_str(
            r#"
[remote]
base_url = "http://localhost:5000"

[editor]
confirm_field_delete = false
"#,
        )
        .unwrap();
        assert_eq!(cfg.remote.base_url.as_deref(), Some("http://localhost:5000"));
        assert_eq!(cfg.remote.request_timeout_secs, 10);
        assert!(!cfg.editor.confirm_field_delete);
        assert!(cfg.editor.save_template_with_batch);
        assert_eq!(cfg.log_filter, "info");
    }

    #[test]
    fn empty_file_is_default() {
        let cfg: EditorConfig = toml::from_str("").unwrap();
        assert_eq!(cfg, EditorConfig::default());
    }

    #[test]
    fn malformed_file_is_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[remote\nbase_url = ").unwrap();
        assert!(matches!(EditorConfig::load_from(&path), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let result = EditorConfig::load_from(&dir.path().join("missing.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn env_overrides_file_values() {
        let mut cfg = EditorConfig::default();
        cfg.remote.base_url = Some("http://from-file".into());
        cfg.apply_env_fn(env_from_map(HashMap::from([
            (ENV_REMOTE_URL, "https://from-env.example.com"),
            (ENV_REQUEST_TIMEOUT_SECS, "30"),
            (ENV_LOG, "debug"),
        ])));
        assert_eq!(cfg.remote.base_url.as_deref(), Some("https://from-env.example.com"));
        assert_eq!(cfg.remote.request_timeout_secs, 30);
        assert_eq!(cfg.log_filter, "debug");
    }

    #[test]
    fn unparseable_timeout_is_ignored() {
        let mut cfg = EditorConfig::default();
        cfg.apply_env_fn(env_from_map(HashMap::from([(ENV_REQUEST_TIMEOUT_SECS, "soon")])));
        assert_eq!(cfg.remote.request_timeout_secs, 10);
    }

    #[test]
    fn zero_timeout_from_env_is_ignored() {
        let mut cfg = EditorConfig::default();
        cfg.remote.request_timeout_secs = 4;
        cfg.apply_env_fn(env_from_map(HashMap::from([(ENV_REQUEST_TIMEOUT_SECS, "0")])));
        assert_eq!(cfg.remote.request_timeout(), Duration::from_secs(4));
    }

    #[test]
    fn padded_timeout_from_env_is_accepted() {
        let mut cfg = EditorConfig::default();
        cfg.apply_env_fn(env_from_map(HashMap::from([(ENV_REQUEST_TIMEOUT_SECS, " 25 ")])));
        assert_eq!(cfg.remote.request_timeout_secs, 25);
    }

    #[test]
    fn zero_timeout_in_file_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[remote]\nrequest_timeout_secs = 0\n").unwrap();
        let err = EditorConfig::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::ZeroTimeout));
        assert!(err.to_string().contains("request_timeout_secs"));
    }

    #[test]
    fn remote_url_requires_a_value() {
        let cfg = EditorConfig::default();
        assert!(matches!(cfg.remote_url(), Err(ConfigError::MissingRemoteUrl)));
    }

    #[test]
    fn remote_url_rejects_garbage() {
        let mut cfg = EditorConfig::default();
        cfg.remote.base_url = Some("not a url".into());
        assert!(matches!(cfg.remote_url(), Err(ConfigError::InvalidRemoteUrl { .. })));

        cfg.remote.base_url = Some("http://localhost:5000/app".into());
        assert_eq!(cfg.remote_url().unwrap().as_str(), "http://localhost:5000/app");
    }

    #[test]
    fn config_dir_is_under_home() {
        let dir = config_dir().unwrap();
        assert!(dir.ends_with(".proforma"));
    }
}
