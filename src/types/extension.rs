use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::host::SurfaceId;

/// The subset of `manifest.json` the orchestration layer consults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtensionManifest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub manifest_version: u32,
    #[serde(default)]
    pub background: Option<BackgroundSpec>,
    /// Public key injected after a packaged install so the id stays stable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BackgroundSpec {
    #[serde(default)]
    pub service_worker: Option<String>,
}

/// A registered extension within one session partition.
#[derive(Debug, Clone)]
pub struct Extension {
    /// 32-character lowercase id, matching the extension's directory name.
    pub id: String,
    pub manifest: ExtensionManifest,
    pub path: PathBuf,
    /// Surface id of the background page, when the manifest declares a
    /// service worker and the host managed to start one.
    pub background_page: Option<SurfaceId>,
}
