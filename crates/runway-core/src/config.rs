use crate::error::Result;
use crate::paths;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Client settings stored in `.runway/config.yaml`. Every field is optional
/// on disk; a missing file means all defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the campaign backend, without a trailing `/api`.
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Per-request timeout. Final-look synthesis routinely takes a minute.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_api_url() -> String {
    "http://127.0.0.1:8000".to_string()
}

fn default_timeout_secs() -> u64 {
    120
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Config {
    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        match crate::io::read_optional(&path)? {
            Some(data) => Ok(serde_yaml::from_str(&data)?),
            None => Ok(Self::default()),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        if !(self.api_url.starts_with("http://") || self.api_url.starts_with("https://")) {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: format!("api_url '{}' must start with http:// or https://", self.api_url),
            });
        }

        if self.api_url.trim_end_matches('/').ends_with("/api") {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "api_url should not include the /api prefix".to_string(),
            });
        }

        if self.timeout_secs == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "timeout_secs must be greater than 0".to_string(),
            });
        } else if self.timeout_secs < 30 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: format!(
                    "timeout_secs={} is likely too short for final-look synthesis",
                    self.timeout_secs
                ),
            });
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
