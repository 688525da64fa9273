//! User settings: loading, saving and the handful of values the
//! orchestration core reads.
//!
//! Stored as a JSON file. A missing file yields defaults; a corrupt file
//! yields defaults plus a warning, since failing to parse settings must
//! never keep the browser from starting.

use std::fs;
use std::path::{Path, PathBuf};

use log::warn;
use serde::{Deserialize, Serialize};

use crate::types::errors::SettingsError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Ask for confirmation before closing a window with multiple tabs.
    pub warn_on_quit: bool,
    /// Directory downloads are saved into.
    pub downloads_path: PathBuf,
    /// Show the downloads dialog when a download starts.
    pub downloads_dialog: bool,
    pub extensions_enabled: bool,
    pub theme: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            warn_on_quit: true,
            downloads_path: dirs::download_dir().unwrap_or_else(|| PathBuf::from(".")),
            downloads_dialog: true,
            extensions_enabled: true,
            theme: "system".to_string(),
        }
    }
}

pub struct SettingsStore {
    path: PathBuf,
    pub settings: Settings,
}

impl SettingsStore {
    /// Loads settings from `path`. Unreadable or unparseable content falls
    /// back to defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let settings = match fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(settings) => settings,
                Err(e) => {
                    warn!("corrupt settings at {}: {}", path.display(), e);
                    Settings::default()
                }
            },
            Err(_) => Settings::default(),
        };
        Self { path, settings }
    }

    /// Writes the current settings to disk, creating parent directories as
    /// needed.
    pub fn save(&self) -> Result<(), SettingsError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| SettingsError::IoError(e.to_string()))?;
        }
        let json = serde_json::to_string_pretty(&self.settings)
            .map_err(|e| SettingsError::SerializationError(e.to_string()))?;
        fs::write(&self.path, json).map_err(|e| SettingsError::IoError(e.to_string()))
    }
}
