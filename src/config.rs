use std::env;
use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::api::ApiConfig;
use crate::domain::RuntimeEnvironment;

pub const APPLICATION_NAME: &str = "reel-saver";

const ENV_API_URL: &str = "REEL_SAVER_API_URL";
const ENV_USER_AGENT: &str = "REEL_SAVER_USER_AGENT";
const ENV_DOWNLOAD_DIR: &str = "REEL_SAVER_DOWNLOAD_DIR";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Settings loaded from `<config dir>/reel-saver/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Where the video resolver lives
    pub api: ApiConfig,
    /// Overrides the detected user agent (and with it the runtime environment).
    pub user_agent: Option<String>,
    /// Defaults to the system downloads folder.
    pub download_dir: Option<PathBuf>,
    /// Expose the download-manager bridge to embedded-view saves.
    pub native_bridge: bool,
    /// Offer a save dialog to embedded-view saves.
    pub file_picker: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            user_agent: None,
            download_dir: None,
            native_bridge: false,
            file_picker: true,
        }
    }
}

impl AppConfig {
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APPLICATION_NAME).join("config.toml"))
    }

    /// Load the config file if there is one, then apply environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match Self::config_path() {
            Some(path) if path.exists() => Self::from_file(path)?,
            _ => Self::default(),
        };

        config.apply_overrides(|key| env::var(key).ok());
        Ok(config)
    }

    pub fn from_file(path: PathBuf) -> Result<Self, ConfigError> {
        let data = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;

        toml::from_str(&data).map_err(|source| ConfigError::Parse { path, source })
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(ENV_API_URL).filter(|v| !v.is_empty()) {
            self.api.base_url = url;
        }
        if let Some(agent) = lookup(ENV_USER_AGENT).filter(|v| !v.is_empty()) {
            self.user_agent = Some(agent);
        }
        if let Some(dir) = lookup(ENV_DOWNLOAD_DIR).filter(|v| !v.is_empty()) {
            self.download_dir = Some(PathBuf::from(dir));
        }
    }

    pub fn resolved_download_dir(&self) -> Option<PathBuf> {
        self.download_dir.clone().or_else(dirs::download_dir)
    }

    pub fn user_agent(&self) -> String {
        self.user_agent.clone().unwrap_or_else(default_user_agent)
    }

    pub fn runtime_environment(&self) -> RuntimeEnvironment {
        RuntimeEnvironment::detect(&self.user_agent())
    }
}

fn default_user_agent() -> String {
    let platform = if cfg!(target_os = "android") {
        "Linux; Android; wv"
    } else {
        env::consts::OS
    };

    format!(
        "{}/{} ({})",
        APPLICATION_NAME,
        env!("CARGO_PKG_VERSION"),
        platform
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.api.base_url, "https://instagram-videos.vercel.app");
        assert!(cfg.file_picker);
        assert!(!cfg.native_bridge);
        assert!(cfg.user_agent.is_none());
    }

    #[test]
    fn config_toml_custom_values() {
        let toml = r#"
            user_agent = "Mozilla/5.0 (Linux; Android 14; wv)"
            download_dir = "/tmp/videos"
            native_bridge = true

            [api]
            base_url = "http://localhost:3000"
        "#;
        let cfg: AppConfig = toml::from_str(toml).unwrap();
        assert_eq!(cfg.api.base_url, "http://localhost:3000");
        assert_eq!(cfg.download_dir, Some(PathBuf::from("/tmp/videos")));
        assert!(cfg.native_bridge);
        assert!(cfg.file_picker);
        assert_eq!(
            cfg.runtime_environment(),
            RuntimeEnvironment::EmbeddedWebView
        );
    }

    #[test]
    fn config_from_file_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "native_bridge = \"yes please\"").unwrap();

        let err = AppConfig::from_file(path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn env_overrides_win() {
        let mut cfg = AppConfig::default();
        cfg.apply_overrides(|key| match key {
            ENV_API_URL => Some("http://127.0.0.1:9000".to_string()),
            ENV_DOWNLOAD_DIR => Some("/data/downloads".to_string()),
            ENV_USER_AGENT => Some(String::new()),
            _ => None,
        });

        assert_eq!(cfg.api.base_url, "http://127.0.0.1:9000");
        assert_eq!(
            cfg.resolved_download_dir(),
            Some(PathBuf::from("/data/downloads"))
        );
        assert!(cfg.user_agent.is_none());
    }

    #[test]
    fn default_user_agent_is_desktop() {
        let cfg = AppConfig::default();
        assert!(cfg.user_agent().starts_with("reel-saver/"));
        if !cfg!(target_os = "android") {
            assert_eq!(
                cfg.runtime_environment(),
                RuntimeEnvironment::StandardBrowser
            );
        }
    }
}
