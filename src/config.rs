//! Configuration loading with documented defaults
//!
//! A missing or malformed config file yields the defaults; absent keys are
//! defaulted per-field so partial configs merge over the defaults.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PrivacyConfig {
    pub mask_password_fields: bool,
    pub redact_query_params: bool,
}

impl Default for PrivacyConfig {
    fn default() -> Self {
        Self {
            mask_password_fields: true,
            redact_query_params: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScribeConfig {
    /// Root directory holding one subdirectory per session
    pub sessions_root: PathBuf,

    /// Root directory for the application log file
    pub logs_root: PathBuf,

    /// Project name used when the operator does not supply one
    pub default_project_slug: String,

    /// Advisory time zone tag recorded for downstream consumers
    pub timezone: String,

    pub privacy: PrivacyConfig,
}

impl Default for ScribeConfig {
    fn default() -> Self {
        Self {
            sessions_root: PathBuf::from("sessions"),
            logs_root: PathBuf::from("logs"),
            default_project_slug: "nowa_sesja".to_string(),
            timezone: "Europe/Warsaw".to_string(),
            privacy: PrivacyConfig::default(),
        }
    }
}

impl ScribeConfig {
    /// Load the config from a JSON file, falling back to defaults
    pub fn load(path: &Path) -> Self {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(_) => {
                debug!("Config file not found: {}, using defaults", path.display());
                return Self::default();
            }
        };

        match serde_json::from_str(&text) {
            Ok(config) => config,
            Err(e) => {
                debug!("Malformed config {}: {}, using defaults", path.display(), e);
                Self::default()
            }
        }
    }
}
