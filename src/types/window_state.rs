use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::types::geometry::Rect;

/// Persisted geometry for one window, written at close and read at
/// construction. A missing or corrupt file forfeits restoration but must
/// never fail window creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowState {
    pub bounds: Rect,
    pub maximized: bool,
    pub fullscreen: bool,
}

impl Default for WindowState {
    fn default() -> Self {
        Self {
            bounds: Rect::new(0, 0, 900, 700),
            maximized: false,
            fullscreen: false,
        }
    }
}

impl WindowState {
    /// Loads window state from a JSON file, falling back to defaults on any
    /// read or parse failure.
    pub fn load<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(path.as_ref()) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(state) => state,
                Err(e) => {
                    log::warn!(
                        "corrupt window state at {}: {}",
                        path.as_ref().display(),
                        e
                    );
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        }
    }

    /// Writes the state as JSON, creating parent directories as needed.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string());
        fs::write(path, json)
    }
}
