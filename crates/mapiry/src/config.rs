//! File and environment configuration.
//!
//! ```toml
//! access_token = "MLY|..."
//! timeout_secs = 30
//! max_retries = 3
//! retry_backoff = 1.0
//!
//! [urls]
//! api = "https://graph.mapillary.com"
//! tiles = "https://tiles.mapillary.com/maps/vtp"
//! ```
//!
//! Every key is optional. `MAPILLARY_ACCESS_TOKEN` overrides the token.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Environment variable holding the access token.
pub const ACCESS_TOKEN_ENV: &str = "MAPILLARY_ACCESS_TOKEN";

/// Default config filename, under `<config dir>/mapiry/`.
const CONFIG_FILE: &str = "config.toml";

/// Client settings loaded from TOML and the environment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// API access token.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Extra attempts for transient failures.
    pub max_retries: u32,
    /// Backoff factor in seconds.
    pub retry_backoff: f64,
    /// Custom User-Agent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    /// Base URL overrides.
    pub urls: UrlOverrides,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            access_token: None,
            timeout_secs: 30,
            max_retries: 3,
            retry_backoff: 1.0,
            user_agent: None,
            urls: UrlOverrides::default(),
        }
    }
}

/// Base URL overrides, one per endpoint family.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UrlOverrides {
    /// Graph (metadata) API.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api: Option<String>,
    /// Per-layer vector tiles.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tiles: Option<String>,
    /// Coverage tiles.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coverage: Option<String>,
    /// Computed coverage tiles.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub computed_coverage: Option<String>,
    /// Map feature point tiles.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub map_feature_points: Option<String>,
    /// Map feature traffic sign tiles.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub map_feature_traffic_signs: Option<String>,
}

impl ClientConfig {
    /// Parse from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        toml::from_str(toml_str).map_err(|e| Error::Config(format!("invalid config: {}", e)))
    }

    /// Serialize to a TOML string.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))
    }

    /// Overlay environment values, read through `lookup`.
    pub fn apply_env<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(token) = lookup(ACCESS_TOKEN_ENV).filter(|t| !t.is_empty()) {
            self.access_token = Some(token);
        }
        self
    }

    /// Overlay the process environment.
    pub fn with_process_env(self) -> Self {
        self.apply_env(|key| std::env::var(key).ok())
    }
}

/// Path of the default config file, if a config directory exists.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("mapiry").join(CONFIG_FILE))
}

/// Load the default config file plus environment overrides.
///
/// A missing file yields the defaults.
pub fn load_config() -> Result<ClientConfig> {
    let config = match config_path() {
        Some(path) if path.exists() => load_config_file(&path)?,
        _ => ClientConfig::default(),
    };
    Ok(config.with_process_env())
}

/// Load config from a specific file (no environment overlay).
pub fn load_config_file(path: &Path) -> Result<ClientConfig> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("failed to read {}: {}", path.display(), e)))?;
    ClientConfig::from_toml(&contents)
}
