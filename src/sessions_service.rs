//! Session-level services: the permission mediator, the download pipeline
//! and the extension registry for the normal and incognito partitions.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use log::{debug, info, warn};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::crx;
use crate::host::{ContentHost, SurfaceHandle, SurfaceId, WindowId};
use crate::storage::Storage;
use crate::types::download::DownloadRecord;
use crate::types::errors::{DialogError, ExtensionError};
use crate::types::extension::{Extension, ExtensionManifest};
use crate::types::permission::PermissionDecision;
use crate::view_manager::{TabTracker, PARTITION_VIEW, PARTITION_VIEW_INCOGNITO};
use crate::windows_service::WindowsService;

/// Asks the user to allow or deny a permission request. Implemented over a
/// dialog surface in the running app and scripted in tests.
pub trait PermissionPrompt {
    fn prompt(
        &mut self,
        window: WindowId,
        hostname: &str,
        permission: &str,
        media_types: &[String],
    ) -> Result<bool, DialogError>;
}

pub struct SessionsService {
    downloads: HashMap<String, DownloadRecord>,
    extensions: HashMap<String, Extension>,
    incognito_extensions: HashMap<String, Extension>,
    extensions_loaded: bool,
    incognito_extensions_loaded: bool,
    background_pages: HashMap<String, SurfaceHandle>,
    tabs: HashMap<SurfaceId, WindowId>,
    extensions_dir: PathBuf,
}

impl SessionsService {
    /// Sets up the session layer. Incognito storage is always wiped at
    /// startup: nothing from an earlier run may survive into a new one.
    pub fn new(host: &mut dyn ContentHost, extensions_dir: PathBuf) -> Self {
        host.clear_partition_storage(PARTITION_VIEW_INCOGNITO);
        Self {
            downloads: HashMap::new(),
            extensions: HashMap::new(),
            incognito_extensions: HashMap::new(),
            extensions_loaded: false,
            incognito_extensions_loaded: false,
            background_pages: HashMap::new(),
            tabs: HashMap::new(),
            extensions_dir,
        }
    }

    // === Permissions ===

    /// Resolves a permission request for `hostname`. Fullscreen is always
    /// granted. Otherwise a stored decision wins; without one the user is
    /// prompted and the answer is persisted. A prompt that cannot be shown
    /// denies without persisting anything.
    pub fn request_permission(
        &mut self,
        storage: &mut Storage,
        prompt: &mut dyn PermissionPrompt,
        window: WindowId,
        hostname: &str,
        permission: &str,
        media_types: &[String],
    ) -> bool {
        if permission == "fullscreen" {
            return true;
        }

        match storage.find_permission(hostname, permission) {
            Ok(Some(decision)) => return decision.granted(),
            Ok(None) => {}
            Err(e) => {
                warn!("permission lookup failed for {}: {}", hostname, e);
            }
        }

        let granted = match prompt.prompt(window, hostname, permission, media_types) {
            Ok(answer) => answer,
            Err(e) => {
                warn!("permission prompt failed for {}: {}", hostname, e);
                return false;
            }
        };

        let decision = if granted {
            PermissionDecision::Granted
        } else {
            PermissionDecision::Denied
        };
        if let Err(e) =
            storage.save_permission(hostname, permission, decision, &media_types.join(","))
        {
            warn!("failed to persist permission decision for {}: {}", hostname, e);
        }
        granted
    }

    // === Downloads ===

    /// Registers a new download. With `auto_name` set and no pre-chosen
    /// location, the target name is made collision-free by appending ` (n)`
    /// before the extension; otherwise the naming is left to whoever drives
    /// the download (the downloads dialog's save flow). Returns the record's
    /// payload for forwarding to the downloads dialog.
    pub fn download_started(
        &mut self,
        windows: &mut WindowsService,
        file_name: &str,
        total_bytes: u64,
        downloads_path: &Path,
        chosen_path: Option<PathBuf>,
        auto_name: bool,
    ) -> (String, Value) {
        let save_path = match chosen_path {
            Some(path) => path,
            None if auto_name => unique_save_path(downloads_path, file_name),
            None => downloads_path.join(file_name),
        };
        let id = Uuid::new_v4().simple().to_string();
        let record = DownloadRecord {
            id: id.clone(),
            file_name: save_path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| file_name.to_string()),
            received_bytes: 0,
            total_bytes,
            save_path,
            completed: false,
        };
        let payload = download_payload(&record);
        self.downloads.insert(id.clone(), record);
        windows.broadcast("download-started", payload.clone());
        (id, payload)
    }

    /// Progress update. Ignored for unknown ids and for downloads that have
    /// already completed.
    pub fn download_progress(
        &mut self,
        windows: &mut WindowsService,
        id: &str,
        received_bytes: u64,
    ) -> Option<Value> {
        let record = self.downloads.get_mut(id)?;
        if record.completed {
            return None;
        }
        record.received_bytes = received_bytes;
        let payload = download_payload(record);
        windows.broadcast("download-progress", payload.clone());
        Some(payload)
    }

    /// Marks a download finished. A completed `.crx` artifact triggers the
    /// extension install pipeline when extensions are enabled; install
    /// failures are logged, never surfaced.
    pub fn download_completed(
        &mut self,
        windows: &mut WindowsService,
        host: &mut dyn ContentHost,
        id: &str,
        extensions_enabled: bool,
    ) -> Option<Value> {
        let record = self.downloads.get_mut(id)?;
        if record.completed {
            return None;
        }
        record.completed = true;
        record.received_bytes = record.total_bytes;
        let payload = download_payload(record);
        let crx_path = record.save_path.clone();
        windows.broadcast("download-completed", payload.clone());

        let is_package = crx_path
            .extension()
            .map(|e| e.eq_ignore_ascii_case("crx"))
            .unwrap_or(false);
        if is_package && extensions_enabled {
            match self.install_packaged_extension(host, windows, &crx_path) {
                Ok(ext_id) => info!("installed extension {} from {}", ext_id, crx_path.display()),
                Err(e) => warn!("extension install from {} failed: {}", crx_path.display(), e),
            }
        }
        Some(payload)
    }

    /// The host interrupted a download. The record stays tracked: the host
    /// may still resume it, and the chrome UI keeps listing it.
    pub fn download_interrupted(&mut self, windows: &mut WindowsService, id: &str) -> Option<Value> {
        let record = self.downloads.get(id)?;
        debug!("download {} interrupted, may be resumed", id);
        let payload = download_payload(record);
        windows.broadcast("download-interrupted", payload.clone());
        Some(payload)
    }

    pub fn download(&self, id: &str) -> Option<&DownloadRecord> {
        self.downloads.get(id)
    }

    pub fn downloads(&self) -> Vec<&DownloadRecord> {
        let mut list: Vec<&DownloadRecord> = self.downloads.values().collect();
        list.sort_by(|a, b| a.id.cmp(&b.id));
        list
    }

    /// Tracked downloads as chrome-UI payloads, ordered by id.
    pub fn download_list(&self) -> Value {
        let list: Vec<Value> = self.downloads().into_iter().map(download_payload).collect();
        json!(list)
    }

    // === Extensions ===

    /// Installs an extension from a packaged archive: parse, derive (or
    /// generate) the id, extract into the extensions directory, patch the
    /// signing key into the manifest, and register in the normal partition.
    pub fn install_packaged_extension(
        &mut self,
        host: &mut dyn ContentHost,
        windows: &mut WindowsService,
        path: &Path,
    ) -> Result<String, ExtensionError> {
        let data = fs::read(path).map_err(|e| ExtensionError::LoadError(e.to_string()))?;
        let package = crx::parse(&data).map_err(|e| ExtensionError::LoadError(e.to_string()))?;

        let id = match &package.public_key {
            Some(key) => crx::derive_id(key),
            None => Uuid::new_v4().simple().to_string(),
        };
        if self.extensions.contains_key(&id) {
            return Err(ExtensionError::AlreadyInstalled(id));
        }

        let dest = self.extensions_dir.join(&id);
        crx::extract_payload(&package, &dest)
            .map_err(|e| ExtensionError::LoadError(e.to_string()))?;

        if let Some(key) = &package.public_key {
            patch_manifest_key(&dest, key)?;
        }

        let manifest = read_manifest(&dest)?;
        self.register(host, windows, false, id.clone(), manifest, dest)?;
        Ok(id)
    }

    /// Loads every unpacked extension under the extensions directory into
    /// one partition. Idempotent per partition. Manifests that are missing,
    /// unparseable, or not manifest version 3 are skipped with a warning.
    pub fn load_extensions(
        &mut self,
        host: &mut dyn ContentHost,
        windows: &mut WindowsService,
        incognito: bool,
    ) {
        let loaded = if incognito {
            self.incognito_extensions_loaded
        } else {
            self.extensions_loaded
        };
        if loaded {
            return;
        }

        let entries = match fs::read_dir(&self.extensions_dir) {
            Ok(entries) => entries,
            Err(e) => {
                debug!(
                    "no extensions directory at {}: {}",
                    self.extensions_dir.display(),
                    e
                );
                if incognito {
                    self.incognito_extensions_loaded = true;
                } else {
                    self.extensions_loaded = true;
                }
                return;
            }
        };

        for entry in entries.flatten() {
            let dir = entry.path();
            if !dir.is_dir() {
                continue;
            }
            let id = entry.file_name().to_string_lossy().to_string();
            let manifest = match read_manifest(&dir) {
                Ok(manifest) => manifest,
                Err(e) => {
                    warn!("skipping extension at {}: {}", dir.display(), e);
                    continue;
                }
            };
            if manifest.manifest_version != 3 {
                warn!(
                    "skipping extension {}: manifest version {} unsupported",
                    id, manifest.manifest_version
                );
                continue;
            }
            if let Err(e) = self.register(host, windows, incognito, id.clone(), manifest, dir) {
                warn!("failed to register extension {}: {}", id, e);
            }
        }

        if incognito {
            self.incognito_extensions_loaded = true;
        } else {
            self.extensions_loaded = true;
        }
    }

    fn register(
        &mut self,
        host: &mut dyn ContentHost,
        windows: &mut WindowsService,
        incognito: bool,
        id: String,
        manifest: ExtensionManifest,
        path: PathBuf,
    ) -> Result<(), ExtensionError> {
        let registry = if incognito {
            &mut self.incognito_extensions
        } else {
            &mut self.extensions
        };
        if registry.contains_key(&id) {
            return Err(ExtensionError::AlreadyInstalled(id));
        }

        let mut extension = Extension {
            id: id.clone(),
            manifest,
            path,
            background_page: None,
        };

        let worker = extension
            .manifest
            .background
            .as_ref()
            .and_then(|b| b.service_worker.clone());
        if let Some(worker) = worker {
            let partition = if incognito {
                PARTITION_VIEW_INCOGNITO
            } else {
                PARTITION_VIEW
            };
            let url = format!("extension://{}/{}", id, worker);
            let surface = host.create_surface(partition, &url);
            extension.background_page = Some(surface.borrow().id());
            self.background_pages.insert(background_key(&id, incognito), surface);
        }

        let registry = if incognito {
            &mut self.incognito_extensions
        } else {
            &mut self.extensions
        };
        registry.insert(id, extension);
        windows.broadcast("load-browserAction", json!(null));
        Ok(())
    }

    /// Removes an extension from whichever partitions have it and deletes
    /// its on-disk directory. Not an error when only one partition (or no
    /// directory) knows the id.
    pub fn uninstall_extension(&mut self, id: &str) -> Result<(), ExtensionError> {
        let normal = self.extensions.remove(id);
        let incognito = self.incognito_extensions.remove(id);
        if normal.is_none() && incognito.is_none() {
            return Err(ExtensionError::NotFound(id.to_string()));
        }

        for key in [background_key(id, false), background_key(id, true)] {
            if let Some(surface) = self.background_pages.remove(&key) {
                surface.borrow_mut().destroy();
            }
        }

        let dir = self.extensions_dir.join(id);
        if dir.exists() {
            if let Err(e) = fs::remove_dir_all(&dir) {
                warn!("failed to remove extension directory {}: {}", dir.display(), e);
            }
        }
        Ok(())
    }

    /// Tears down the incognito partition's extensions. Individual teardown
    /// problems are logged and skipped; the registry and the loaded flag are
    /// reset no matter what.
    pub fn unload_incognito_extensions(&mut self) {
        let ids: Vec<String> = self.incognito_extensions.keys().cloned().collect();
        for id in ids {
            if let Some(surface) = self.background_pages.remove(&background_key(&id, true)) {
                let mut surface = surface.borrow_mut();
                if surface.is_live() {
                    surface.destroy();
                } else {
                    debug!("background page of {} already gone", id);
                }
            }
        }
        self.incognito_extensions.clear();
        self.incognito_extensions_loaded = false;
    }

    pub fn extension(&self, id: &str) -> Option<&Extension> {
        self.extensions.get(id)
    }

    pub fn incognito_extension(&self, id: &str) -> Option<&Extension> {
        self.incognito_extensions.get(id)
    }

    pub fn extensions_loaded(&self, incognito: bool) -> bool {
        if incognito {
            self.incognito_extensions_loaded
        } else {
            self.extensions_loaded
        }
    }

    /// Installed extensions of the normal partition, as chrome-UI payloads.
    pub fn extension_list(&self) -> Value {
        let mut list: Vec<Value> = self
            .extensions
            .values()
            .map(|e| {
                json!({
                    "id": e.id,
                    "name": e.manifest.name,
                    "version": e.manifest.version,
                    "path": e.path.to_string_lossy(),
                })
            })
            .collect();
        list.sort_by_key(|v| v["id"].as_str().map(|s| s.to_string()));
        json!(list)
    }

    // === Session teardown ===

    /// Called when the last incognito window closes: wipe the partition's
    /// storage and drop its extensions.
    pub fn on_last_incognito_closed(&mut self, host: &mut dyn ContentHost) {
        host.clear_partition_storage(PARTITION_VIEW_INCOGNITO);
        self.unload_incognito_extensions();
    }

    /// Clears the normal partition's cookies, caches and storage, plus the
    /// stored permission decisions.
    pub fn clear_browsing_data(&mut self, host: &mut dyn ContentHost, storage: &mut Storage) {
        host.clear_partition_storage(PARTITION_VIEW);
        if let Err(e) = storage.clear_permissions() {
            warn!("failed to clear permission decisions: {}", e);
        }
    }

    pub fn tab_window(&self, surface: SurfaceId) -> Option<WindowId> {
        self.tabs.get(&surface).copied()
    }
}

impl TabTracker for SessionsService {
    fn track_tab(&mut self, surface: SurfaceId, window: WindowId) -> Result<(), ExtensionError> {
        self.tabs.insert(surface, window);
        Ok(())
    }

    fn untrack_tab(&mut self, surface: SurfaceId) {
        self.tabs.remove(&surface);
    }
}

fn background_key(id: &str, incognito: bool) -> String {
    if incognito {
        format!("{}#incognito", id)
    } else {
        id.to_string()
    }
}

fn download_payload(record: &DownloadRecord) -> Value {
    json!({
        "id": record.id,
        "fileName": record.file_name,
        "receivedBytes": record.received_bytes,
        "totalBytes": record.total_bytes,
        "savePath": record.save_path.to_string_lossy(),
        "completed": record.completed,
    })
}

/// Picks a path under `dir` for `file_name` that does not collide with an
/// existing file, appending ` (n)` before the extension as needed.
pub fn unique_save_path(dir: &Path, file_name: &str) -> PathBuf {
    let candidate = dir.join(file_name);
    if !candidate.exists() {
        return candidate;
    }

    let path = Path::new(file_name);
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| file_name.to_string());
    let ext = path.extension().map(|e| e.to_string_lossy().to_string());

    let mut n = 1u32;
    loop {
        let name = match &ext {
            Some(ext) => format!("{} ({}).{}", stem, n, ext),
            None => format!("{} ({})", stem, n),
        };
        let candidate = dir.join(name);
        if !candidate.exists() {
            return candidate;
        }
        n += 1;
    }
}

fn read_manifest(dir: &Path) -> Result<ExtensionManifest, ExtensionError> {
    let path = dir.join("manifest.json");
    let content =
        fs::read_to_string(&path).map_err(|e| ExtensionError::InvalidManifest(e.to_string()))?;
    serde_json::from_str(&content).map_err(|e| ExtensionError::InvalidManifest(e.to_string()))
}

/// Writes the package's signing key into the extracted manifest so the id
/// stays stable across reloads.
fn patch_manifest_key(dir: &Path, public_key: &[u8]) -> Result<(), ExtensionError> {
    let path = dir.join("manifest.json");
    let content =
        fs::read_to_string(&path).map_err(|e| ExtensionError::InvalidManifest(e.to_string()))?;
    let mut manifest: Value = serde_json::from_str(&content)
        .map_err(|e| ExtensionError::InvalidManifest(e.to_string()))?;
    if let Some(obj) = manifest.as_object_mut() {
        obj.insert("key".to_string(), json!(BASE64.encode(public_key)));
    }
    let serialized = serde_json::to_string_pretty(&manifest)
        .map_err(|e| ExtensionError::InvalidManifest(e.to_string()))?;
    fs::write(&path, serialized).map_err(|e| ExtensionError::LoadError(e.to_string()))
}
