use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::storage::{read_json, write_json, StoreError};

pub const DEFAULT_RPC_URL: &str = "http://localhost:8008";
const DEFAULT_REPLY_TIMEOUT_SECS: f64 = 3.0;
const SETTINGS_VERSION: u32 = 1;

fn default_rpc_url() -> String {
    DEFAULT_RPC_URL.to_string()
}

fn default_reply_timeout() -> f64 {
    DEFAULT_REPLY_TIMEOUT_SECS
}

/// Dashboard settings stored in the OS config directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSettings {
    pub version: u32,
    /// Base URL of the agorpc HTTP server; `/jsonrpc` is appended.
    #[serde(default = "default_rpc_url")]
    pub rpc_url: String,
    /// How long the controller may take to answer a request, in seconds.
    #[serde(default = "default_reply_timeout")]
    pub reply_timeout_secs: f64,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            version: SETTINGS_VERSION,
            rpc_url: default_rpc_url(),
            reply_timeout_secs: DEFAULT_REPLY_TIMEOUT_SECS,
        }
    }
}

impl DashboardSettings {
    pub fn reply_timeout(&self) -> std::time::Duration {
        if self.reply_timeout_secs.is_finite() && self.reply_timeout_secs > 0.0 {
            std::time::Duration::from_secs_f64(self.reply_timeout_secs)
        } else {
            std::time::Duration::from_secs_f64(DEFAULT_REPLY_TIMEOUT_SECS)
        }
    }
}

/// Load settings from the app config directory. Returns None if no settings file exists
/// or it cannot be parsed.
pub fn load_settings(app_config_dir: &Path) -> Option<DashboardSettings> {
    let path = crate::paths::settings_path(app_config_dir);
    if !path.exists() {
        return None;
    }
    match read_json::<DashboardSettings>(&path) {
        Ok(settings) => Some(settings),
        Err(e) => {
            tracing::warn!(path = %path.display(), "ignoring unreadable settings: {e}");
            None
        }
    }
}

/// Save settings to the app config directory.
pub fn save_settings(app_config_dir: &Path, settings: &DashboardSettings) -> Result<(), StoreError> {
    std::fs::create_dir_all(app_config_dir)?;
    write_json(&crate::paths::settings_path(app_config_dir), settings)
}
