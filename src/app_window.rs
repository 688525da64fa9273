//! One top-level browser window: native handle, its view manager and the
//! persisted window geometry.

use std::path::PathBuf;

use log::warn;
use serde_json::{json, Value};

use crate::host::{ContentHost, SurfaceId, WindowHandle, WindowId};
use crate::types::window_state::WindowState;
use crate::view_manager::{TabTracker, ViewManager};

pub struct AppWindow {
    window: WindowHandle,
    id: WindowId,
    pub view_manager: ViewManager,
    incognito: bool,
    state: WindowState,
    state_path: PathBuf,
    /// Set by resize/move handlers; the actual refit runs on the next tick.
    pending_bounds_fix: bool,
}

impl AppWindow {
    /// Creates the native window and restores its persisted geometry. A
    /// missing or unreadable state file falls back to defaults.
    pub fn new(host: &mut dyn ContentHost, incognito: bool, state_path: PathBuf) -> Self {
        let state = WindowState::load(&state_path);
        let window = host.create_window(incognito);
        let id = {
            let mut w = window.borrow_mut();
            w.set_bounds(state.bounds);
            if state.maximized {
                w.maximize();
            }
            if state.fullscreen {
                w.set_fullscreen(true);
            }
            w.id()
        };
        let view_manager = ViewManager::new(window.clone(), incognito);
        let mut this = Self {
            window,
            id,
            view_manager,
            incognito,
            state,
            state_path,
            pending_bounds_fix: false,
        };
        this.update_title();
        this
    }

    pub fn id(&self) -> WindowId {
        self.id
    }

    pub fn incognito(&self) -> bool {
        self.incognito
    }

    pub fn handle(&self) -> WindowHandle {
        self.window.clone()
    }

    pub fn is_live(&self) -> bool {
        self.window.borrow().is_live()
    }

    /// True when `surface` is one of this window's views.
    pub fn owns_surface(&self, surface: SurfaceId) -> bool {
        self.view_manager.get(surface).is_some()
    }

    /// Message to this window's chrome UI.
    pub fn send(&self, channel: &str, payload: Value) {
        let mut window = self.window.borrow_mut();
        if window.is_live() {
            window.send(channel, payload);
        }
    }

    /// Window resized by the user. Geometry is only recorded while not
    /// maximized, so that unmaximizing restores the earlier floating bounds.
    pub fn on_resized(&mut self) {
        self.record_bounds();
        self.pending_bounds_fix = true;
    }

    pub fn on_moved(&mut self) {
        self.record_bounds();
    }

    fn record_bounds(&mut self) {
        let window = self.window.borrow();
        if !window.is_live() || window.maximized() {
            return;
        }
        self.state.bounds = window.bounds();
    }

    pub fn on_maximized(&mut self) {
        self.state.maximized = true;
        self.pending_bounds_fix = true;
    }

    pub fn on_unmaximized(&mut self) {
        self.state.maximized = false;
        self.pending_bounds_fix = true;
    }

    /// Native fullscreen toggled; the chrome UI hides itself in response.
    pub fn on_fullscreen(&mut self, fullscreen: bool) {
        self.state.fullscreen = fullscreen;
        self.send("fullscreen", json!(fullscreen));
        self.view_manager.set_fullscreen(fullscreen);
    }

    /// Content entered or left HTML fullscreen (e.g. a video player).
    pub fn on_html_fullscreen(&mut self, fullscreen: bool) {
        self.send("html-fullscreen", json!(fullscreen));
        self.view_manager.set_fullscreen(fullscreen);
    }

    /// The chrome UI reported a new measured height (bookmarks bar toggled,
    /// find bar opened); the selected view must be refit immediately.
    pub fn on_chrome_resized(&mut self) {
        self.view_manager.fix_bounds();
    }

    /// Runs the bounds refit queued by resize handlers, if any.
    pub fn flush_deferred(&mut self) {
        if self.pending_bounds_fix {
            self.pending_bounds_fix = false;
            self.view_manager.fix_bounds();
        }
    }

    pub fn update_title(&mut self) {
        self.view_manager.update_window_title();
    }

    /// Writes the window's geometry to its state file.
    pub fn persist_state(&self) {
        if let Err(e) = self.state.save(&self.state_path) {
            warn!(
                "failed to persist window state to {}: {}",
                self.state_path.display(),
                e
            );
        }
    }

    /// Destroys every view in the window.
    pub fn clear_views(&mut self, tracker: Option<&mut dyn TabTracker>) {
        self.view_manager.clear(tracker);
    }

    /// Asks the user to confirm closing a window with multiple open tabs.
    /// Returns `true` when the close should proceed.
    pub fn confirm_close(&self) -> bool {
        let tabs = self.view_manager.len();
        if tabs <= 1 {
            return true;
        }
        let mut window = self.window.borrow_mut();
        if !window.is_live() {
            return true;
        }
        window.confirm(
            "Close window?",
            &format!("{} tabs are open and will be closed.", tabs),
        )
    }

    /// Destroys the native window. Idempotent.
    pub fn close_native(&mut self) {
        let mut window = self.window.borrow_mut();
        if window.is_live() {
            window.close();
        }
    }
}
