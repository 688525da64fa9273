//! Application root: owns the host, the services and the dialog registry,
//! and routes control messages and host events between them.

use std::path::PathBuf;
use std::time::Instant;

use log::{debug, info, warn};
use serde_json::{json, Value};

use crate::dialogs::DialogsService;
use crate::host::{ContentHost, HostEvent, SurfaceId, WindowId};
use crate::ipc::{Channel, ControlMessage};
use crate::sessions_service::{PermissionPrompt, SessionsService};
use crate::settings::SettingsStore;
use crate::storage::Storage;
use crate::types::errors::StorageError;
use crate::types::geometry::Rect;
use crate::windows_service::WindowsService;

/// Filesystem layout under the user-data directory.
pub struct AppPaths {
    pub user_data: PathBuf,
}

impl AppPaths {
    pub fn new(user_data: PathBuf) -> Self {
        Self { user_data }
    }

    pub fn settings_file(&self) -> PathBuf {
        self.user_data.join("settings.json")
    }

    pub fn storage_file(&self) -> PathBuf {
        self.user_data.join("storage.db")
    }

    pub fn extensions_dir(&self) -> PathBuf {
        self.user_data.join("extensions")
    }
}

/// The explicitly constructed application root. Collaborators receive it
/// by reference; nothing here is process-global.
pub struct Application<H: ContentHost> {
    pub host: H,
    pub settings: SettingsStore,
    pub storage: Storage,
    pub windows: WindowsService,
    pub sessions: SessionsService,
    pub dialogs: DialogsService,
    prompt: Box<dyn PermissionPrompt>,
}

impl<H: ContentHost> Application<H> {
    pub fn new(
        mut host: H,
        paths: &AppPaths,
        prompt: Box<dyn PermissionPrompt>,
    ) -> Result<Self, StorageError> {
        let settings = SettingsStore::load(paths.settings_file());
        let storage = Storage::open(paths.storage_file())?;
        let windows = WindowsService::new(paths.user_data.clone());
        let sessions = SessionsService::new(&mut host, paths.extensions_dir());
        Ok(Self {
            host,
            settings,
            storage,
            windows,
            sessions,
            dialogs: DialogsService::new(),
            prompt,
        })
    }

    /// In-memory variant for tests: no files are touched except under the
    /// given user-data directory.
    pub fn new_in_memory(
        mut host: H,
        paths: &AppPaths,
        prompt: Box<dyn PermissionPrompt>,
    ) -> Result<Self, StorageError> {
        let settings = SettingsStore::load(paths.settings_file());
        let storage = Storage::open_in_memory()?;
        let windows = WindowsService::new(paths.user_data.clone());
        let sessions = SessionsService::new(&mut host, paths.extensions_dir());
        Ok(Self {
            host,
            settings,
            storage,
            windows,
            sessions,
            dialogs: DialogsService::new(),
            prompt,
        })
    }

    /// Startup sequence: persistent dialogs, extension load, first window.
    pub fn start(&mut self) -> WindowId {
        self.dialogs.run(&mut self.host);
        if self.settings.settings.extensions_enabled {
            self.sessions
                .load_extensions(&mut self.host, &mut self.windows, false);
        }
        let id = self.windows.open(&mut self.host, false);
        info!("opened initial window {}", id);
        id
    }

    /// Periodic work driven by the event loop: deferred bounds refits and
    /// dialog hide deadlines.
    pub fn tick(&mut self, now: Instant) {
        self.windows.flush_deferred();
        self.dialogs.process_timeouts(now);
    }

    /// Decodes and routes one control-channel message. Queries return a
    /// payload; unknown channels are dropped with a debug log.
    pub fn dispatch(&mut self, raw_channel: &str, payload: Value) -> Option<Value> {
        let channel = Channel::parse(raw_channel);
        let Some(message) = ControlMessage::decode(&channel, &payload) else {
            debug!("ignoring unknown control channel {}", raw_channel);
            return None;
        };
        let owner = channel.owner.or(self.windows.current_id());
        self.route(message, owner)
    }

    fn route(&mut self, message: ControlMessage, owner: Option<WindowId>) -> Option<Value> {
        match message {
            ControlMessage::WindowMinimize => {
                let window = self.windows.get(owner?)?;
                let handle = window.handle();
                let mut win = handle.borrow_mut();
                if win.is_live() {
                    win.minimize();
                }
                None
            }
            ControlMessage::WindowToggleMaximize => {
                let window = self.windows.get(owner?)?;
                let handle = window.handle();
                let mut win = handle.borrow_mut();
                if win.is_live() {
                    if win.maximized() {
                        win.unmaximize();
                    } else {
                        win.maximize();
                    }
                }
                None
            }
            ControlMessage::WindowClose => {
                self.close_window(owner?);
                None
            }
            ControlMessage::WindowFocus => {
                let window = self.windows.get(owner?)?;
                let handle = window.handle();
                let mut win = handle.borrow_mut();
                if win.is_live() {
                    win.focus();
                }
                None
            }

            ControlMessage::ViewCreate { url, active } => {
                let window = self.windows.get_mut(owner?)?;
                let id = window.view_manager.create(
                    &mut self.host,
                    &url,
                    active,
                    Some(&mut self.sessions),
                );
                Some(json!(id))
            }
            ControlMessage::ViewsCreate { urls } => {
                let window = self.windows.get_mut(owner?)?;
                let ids = window
                    .view_manager
                    .create_many(&mut self.host, &urls, Some(&mut self.sessions));
                Some(json!(ids))
            }
            ControlMessage::ViewSelect { id, focus } => {
                let window = self.windows.get_mut(owner?)?;
                if let Err(e) = window.view_manager.select(id, focus) {
                    warn!("select failed: {}", e);
                }
                None
            }
            ControlMessage::ViewDestroy { id } => {
                let window = self.windows.get_mut(owner?)?;
                window.view_manager.destroy(id, Some(&mut self.sessions));
                None
            }
            ControlMessage::ViewMute { id } => {
                let window = self.windows.get_mut(owner?)?;
                if let Err(e) = window.view_manager.set_muted(id, true) {
                    warn!("mute failed: {}", e);
                }
                None
            }
            ControlMessage::ViewUnmute { id } => {
                let window = self.windows.get_mut(owner?)?;
                if let Err(e) = window.view_manager.set_muted(id, false) {
                    warn!("unmute failed: {}", e);
                }
                None
            }

            ControlMessage::ChangeZoom(direction) => {
                let window = self.windows.get_mut(owner?)?;
                window.view_manager.change_zoom(direction);
                None
            }
            ControlMessage::ResetZoom => {
                let window = self.windows.get_mut(owner?)?;
                window.view_manager.reset_zoom();
                None
            }

            ControlMessage::DialogShow { name, payload } => {
                let window = self.windows.get(owner?)?;
                let handle = window.handle();
                let result = if payload.get("rect").is_some() || payload.get("button").is_some() {
                    self.dialogs
                        .show_popup(&mut self.host, &name, &handle, &payload)
                } else {
                    let bounds = explicit_bounds(&payload)
                        .unwrap_or_else(|| default_dialog_bounds(&handle));
                    self.dialogs
                        .show(&mut self.host, &name, &handle, bounds, true, true)
                };
                if let Err(e) = result {
                    warn!("failed to show dialog {}: {}", name, e);
                }
                None
            }
            ControlMessage::DialogHide { name } => {
                self.dialogs.hide(&name, Instant::now());
                None
            }

            ControlMessage::CreateWindow { incognito } => {
                let id = self.windows.open(&mut self.host, incognito);
                if incognito && self.settings.settings.extensions_enabled {
                    self.sessions
                        .load_extensions(&mut self.host, &mut self.windows, true);
                }
                Some(json!(id))
            }
            ControlMessage::ClearBrowsingData => {
                self.sessions
                    .clear_browsing_data(&mut self.host, &mut self.storage);
                None
            }
            ControlMessage::UninstallExtension { id } => {
                if let Err(e) = self.sessions.uninstall_extension(&id) {
                    warn!("uninstall of {} failed: {}", id, e);
                }
                None
            }

            ControlMessage::GetDownloads => Some(self.sessions.download_list()),
            ControlMessage::GetExtensions => Some(self.sessions.extension_list()),
            ControlMessage::GetPermissions => match self.storage.list_permissions() {
                Ok(records) => Some(json!(records)),
                Err(e) => {
                    warn!("permission listing failed: {}", e);
                    Some(json!([]))
                }
            },
            ControlMessage::GetDialogVisibility { name } => {
                Some(json!(self.dialogs.visible(&name)))
            }
            ControlMessage::GetZoom => {
                let window = self.windows.get(owner?)?;
                let factor = window
                    .view_manager
                    .selected()
                    .map(|v| v.zoom_factor())
                    .unwrap_or(1.0);
                Some(json!(factor))
            }
            ControlMessage::IsIncognito => {
                let window = self.windows.get(owner?)?;
                Some(json!(window.incognito()))
            }
            ControlMessage::GetTheme => Some(json!(self.settings.settings.theme)),
        }
    }

    /// Applies one host notification.
    pub fn handle_host_event(&mut self, event: HostEvent) {
        match event {
            HostEvent::SurfaceDestroyed(surface) => {
                if let Some(window_id) = self.windows.find_by_surface(surface) {
                    if let Some(window) = self.windows.get_mut(window_id) {
                        window
                            .view_manager
                            .surface_destroyed(surface, Some(&mut self.sessions));
                    }
                }
            }
            HostEvent::TitleChanged(surface, title) => {
                if let Some(window_id) = self.windows.find_by_surface(surface) {
                    if let Some(window) = self.windows.get_mut(window_id) {
                        window.view_manager.title_changed(surface, &title);
                    }
                }
            }
            HostEvent::FaviconChanged(surface, favicon) => {
                if let Some(window_id) = self.windows.find_by_surface(surface) {
                    if let Some(window) = self.windows.get_mut(window_id) {
                        window.view_manager.favicon_changed(surface, favicon);
                    }
                }
            }
            HostEvent::NavigationChanged(surface, url) => {
                if let Some(window_id) = self.windows.find_by_surface(surface) {
                    if let Some(window) = self.windows.get_mut(window_id) {
                        window.view_manager.navigation_changed(surface, &url);
                    }
                }
            }
            HostEvent::SurfaceLoaded(surface) => {
                self.dialogs.notify_loaded(surface);
            }
            HostEvent::WindowResized(id) => {
                if let Some(window) = self.windows.get_mut(id) {
                    window.on_resized();
                }
            }
            HostEvent::WindowMoved(id) => {
                if let Some(window) = self.windows.get_mut(id) {
                    window.on_moved();
                }
            }
            HostEvent::WindowMaximized(id) => {
                if let Some(window) = self.windows.get_mut(id) {
                    window.on_maximized();
                }
            }
            HostEvent::WindowUnmaximized(id) => {
                if let Some(window) = self.windows.get_mut(id) {
                    window.on_unmaximized();
                }
            }
            HostEvent::WindowFocused(id) => {
                self.windows.on_focused(id);
            }
            HostEvent::FullscreenChanged(id, fullscreen) => {
                if let Some(window) = self.windows.get_mut(id) {
                    window.on_fullscreen(fullscreen);
                }
            }
            HostEvent::HtmlFullscreenChanged(id, fullscreen) => {
                if let Some(window) = self.windows.get_mut(id) {
                    window.on_html_fullscreen(fullscreen);
                }
            }
            HostEvent::ChromeResized(id) => {
                if let Some(window) = self.windows.get_mut(id) {
                    window.on_chrome_resized();
                }
            }
            HostEvent::CloseRequested(id) => {
                self.close_window(id);
            }
        }
    }

    /// Registers a download reported by the host and forwards the record to
    /// the downloads dialog (when open) and every window. Auto-naming runs
    /// only when the downloads dialog is disabled and no location was
    /// pre-chosen; otherwise the dialog's save flow owns the path.
    pub fn download_started(
        &mut self,
        file_name: &str,
        total_bytes: u64,
        chosen_path: Option<PathBuf>,
    ) -> String {
        let downloads_path = self.settings.settings.downloads_path.clone();
        let auto_name = !self.settings.settings.downloads_dialog;
        let (id, payload) = self.sessions.download_started(
            &mut self.windows,
            file_name,
            total_bytes,
            &downloads_path,
            chosen_path,
            auto_name,
        );
        self.dialogs
            .send_to("downloads-dialog", "download-started", payload);
        id
    }

    pub fn download_progress(&mut self, id: &str, received_bytes: u64) {
        if let Some(payload) = self
            .sessions
            .download_progress(&mut self.windows, id, received_bytes)
        {
            self.dialogs
                .send_to("downloads-dialog", "download-progress", payload);
        }
    }

    pub fn download_completed(&mut self, id: &str) {
        let extensions_enabled = self.settings.settings.extensions_enabled;
        if let Some(payload) = self.sessions.download_completed(
            &mut self.windows,
            &mut self.host,
            id,
            extensions_enabled,
        ) {
            self.dialogs
                .send_to("downloads-dialog", "download-completed", payload);
        }
    }

    pub fn download_interrupted(&mut self, id: &str) {
        if let Some(payload) = self.sessions.download_interrupted(&mut self.windows, id) {
            self.dialogs
                .send_to("downloads-dialog", "download-interrupted", payload);
        }
    }

    /// Mediates a permission request from a content surface. Only the
    /// selected surface of the window owning it may prompt; requests from
    /// anything else are denied outright.
    pub fn handle_permission_request(
        &mut self,
        surface: SurfaceId,
        hostname: &str,
        permission: &str,
        media_types: &[String],
    ) -> bool {
        let Some(window_id) = self.windows.find_by_surface(surface) else {
            return false;
        };
        let selected = self
            .windows
            .get(window_id)
            .and_then(|w| w.view_manager.selected_id());
        if selected != Some(surface) {
            return false;
        }
        self.sessions.request_permission(
            &mut self.storage,
            self.prompt.as_mut(),
            window_id,
            hostname,
            permission,
            media_types,
        )
    }

    /// Closes a window: confirm when configured, persist geometry, destroy
    /// views, tear down dialogs with the last window, and wipe the incognito
    /// session with the last incognito window. Returns `false` when the
    /// user cancelled.
    pub fn close_window(&mut self, id: WindowId) -> bool {
        let Some(window) = self.windows.get(id) else {
            return false;
        };
        if self.settings.settings.warn_on_quit && !window.confirm_close() {
            return false;
        }

        if let Some(window) = self.windows.get_mut(id) {
            window.persist_state();
            window.clear_views(Some(&mut self.sessions));
        }

        let Some(mut window) = self.windows.remove(id) else {
            return false;
        };

        if self.windows.is_empty() {
            self.dialogs.destroy_all();
        }
        if window.incognito() && self.windows.incognito_count() == 0 {
            self.sessions.on_last_incognito_closed(&mut self.host);
        }
        window.close_native();
        true
    }
}

fn explicit_bounds(payload: &Value) -> Option<Rect> {
    Some(Rect::new(
        payload.get("x")?.as_i64()? as i32,
        payload.get("y")?.as_i64()? as i32,
        payload.get("width")?.as_i64()? as i32,
        payload.get("height")?.as_i64()? as i32,
    ))
}

/// Full-width strip under the chrome, for dialogs shown without placement.
fn default_dialog_bounds(handle: &crate::host::WindowHandle) -> Rect {
    let win = handle.borrow();
    let (width, height) = win.content_size();
    let top = win.chrome_height();
    Rect::new(0, top, width, height - top)
}
