//! Client configuration: a TOML file with environment overrides.
//!
//! ```toml
//! api_base_url = "http://localhost:8070"
//! mode = "development"
//! origin = "http://192.168.1.20:5173"
//! timeout_ms = 10000
//! download_dir = "downloads"
//! session_file = "session.json"
//! ```
//!
//! Every key is optional. `LEAVE_API_BASE_URL`, `LEAVE_MODE`, `LEAVE_ORIGIN`,
//! `LEAVE_TIMEOUT_MS`, `LEAVE_DOWNLOAD_DIR` and `LEAVE_SESSION_FILE` take
//! precedence over the file.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::base_url::{BuildMode, Location};
use crate::error::{ApiError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClientConfig {
    /// Explicit API origin; resolved against `origin` and `mode` when unset.
    pub api_base_url: Option<String>,
    pub mode: BuildMode,
    /// Origin the front end is served from.
    pub origin: String,
    pub timeout_ms: u64,
    pub download_dir: PathBuf,
    /// Where the session is persisted; in memory when unset.
    pub session_file: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: None,
            mode: BuildMode::default(),
            origin: "http://localhost".to_string(),
            timeout_ms: 10_000,
            download_dir: PathBuf::from("."),
            session_file: None,
        }
    }
}

impl ClientConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| ApiError::Config(e.to_string()))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| ApiError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    /// Apply overrides from the process environment.
    pub fn with_env(self) -> Result<Self> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any variable source.
    pub fn with_overrides(mut self, var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(url) = var("LEAVE_API_BASE_URL") {
            self.api_base_url = Some(url).filter(|u| !u.is_empty());
        }
        if let Some(mode) = var("LEAVE_MODE") {
            self.mode = match mode.to_ascii_lowercase().as_str() {
                "production" => BuildMode::Production,
                "development" => BuildMode::Development,
                "other" => BuildMode::Other,
                other => return Err(ApiError::Config(format!("unknown LEAVE_MODE {other:?}"))),
            };
        }
        if let Some(origin) = var("LEAVE_ORIGIN") {
            self.origin = origin;
        }
        if let Some(timeout) = var("LEAVE_TIMEOUT_MS") {
            self.timeout_ms = timeout
                .parse()
                .map_err(|e| ApiError::Config(format!("LEAVE_TIMEOUT_MS {timeout:?}: {e}")))?;
        }
        if let Some(dir) = var("LEAVE_DOWNLOAD_DIR") {
            self.download_dir = PathBuf::from(dir);
        }
        if let Some(file) = var("LEAVE_SESSION_FILE") {
            self.session_file = Some(PathBuf::from(file)).filter(|p| !p.as_os_str().is_empty());
        }
        Ok(self)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn location(&self) -> Result<Location> {
        Location::parse(&self.origin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_when_empty() {
        let config = ClientConfig::from_toml_str("").unwrap();
        assert_eq!(config, ClientConfig::default());
        assert_eq!(config.timeout(), Duration::from_secs(10));
        assert!(config.location().unwrap().is_local());
    }

    #[test]
    fn parses_every_key() {
        let config = ClientConfig::from_toml_str(
            r#"
            api_base_url = "http://localhost:8070"
            mode = "development"
            origin = "http://192.168.1.20:5173"
            timeout_ms = 2500
            download_dir = "out"
            session_file = "session.json"
            "#,
        )
        .unwrap();
        assert_eq!(config.api_base_url.as_deref(), Some("http://localhost:8070"));
        assert_eq!(config.mode, BuildMode::Development);
        assert_eq!(config.timeout(), Duration::from_millis(2500));
        assert_eq!(config.download_dir, PathBuf::from("out"));
        assert_eq!(config.session_file, Some(PathBuf::from("session.json")));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = ClientConfig::from_toml_str("base = 1").unwrap_err();
        assert!(matches!(err, ApiError::Config(_)));
    }

    #[test]
    fn overrides_take_precedence() {
        let vars: HashMap<&str, &str> = [
            ("LEAVE_API_BASE_URL", "https://hr.example.com"),
            ("LEAVE_MODE", "Production"),
            ("LEAVE_TIMEOUT_MS", "500"),
        ]
        .into_iter()
        .collect();
        let config = ClientConfig::default()
            .with_overrides(|k| vars.get(k).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.api_base_url.as_deref(), Some("https://hr.example.com"));
        assert_eq!(config.mode, BuildMode::Production);
        assert_eq!(config.timeout_ms, 500);
    }

    #[test]
    fn bad_override_is_a_config_error() {
        let err = ClientConfig::default()
            .with_overrides(|k| (k == "LEAVE_TIMEOUT_MS").then(|| "soon".to_string()))
            .unwrap_err();
        assert!(err.to_string().starts_with("configuration error: LEAVE_TIMEOUT_MS"));
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("client.toml");
        fs::write(&path, "mode = \"production\"\n").unwrap();
        assert_eq!(ClientConfig::load(&path).unwrap().mode, BuildMode::Production);
        assert!(ClientConfig::load(dir.path().join("missing.toml")).is_err());
    }
}
