//! Registry of open browser windows.

use std::path::PathBuf;

use log::debug;
use serde_json::Value;

use crate::app_window::AppWindow;
use crate::host::{ContentHost, SurfaceId, WindowId};

/// Owns every open [`AppWindow`] and tracks which one was focused last.
pub struct WindowsService {
    windows: Vec<AppWindow>,
    current_id: Option<WindowId>,
    state_dir: PathBuf,
}

impl WindowsService {
    pub fn new(state_dir: PathBuf) -> Self {
        Self {
            windows: Vec::new(),
            current_id: None,
            state_dir,
        }
    }

    /// Opens a new window and makes it current.
    pub fn open(&mut self, host: &mut dyn ContentHost, incognito: bool) -> WindowId {
        let state_path = self.state_dir.join("window-state.json");
        let window = AppWindow::new(host, incognito, state_path);
        let id = window.id();
        self.windows.push(window);
        self.current_id = Some(id);
        id
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    pub fn incognito_count(&self) -> usize {
        self.windows.iter().filter(|w| w.incognito()).count()
    }

    pub fn ids(&self) -> Vec<WindowId> {
        self.windows.iter().map(|w| w.id()).collect()
    }

    pub fn get(&self, id: WindowId) -> Option<&AppWindow> {
        self.windows.iter().find(|w| w.id() == id)
    }

    pub fn get_mut(&mut self, id: WindowId) -> Option<&mut AppWindow> {
        self.windows.iter_mut().find(|w| w.id() == id)
    }

    /// The window owning the given content surface.
    pub fn find_by_surface(&self, surface: SurfaceId) -> Option<WindowId> {
        self.windows
            .iter()
            .find(|w| w.owns_surface(surface))
            .map(|w| w.id())
    }

    /// The last-focused window.
    pub fn current(&self) -> Option<&AppWindow> {
        self.current_id.and_then(|id| self.get(id))
    }

    pub fn current_mut(&mut self) -> Option<&mut AppWindow> {
        match self.current_id {
            Some(id) => self.get_mut(id),
            None => None,
        }
    }

    pub fn current_id(&self) -> Option<WindowId> {
        self.current_id
    }

    pub fn on_focused(&mut self, id: WindowId) {
        if self.get(id).is_some() {
            self.current_id = Some(id);
        }
    }

    /// Sends a message to every window's chrome UI. Windows whose native
    /// handle has died are dropped from the registry on the way.
    pub fn broadcast(&mut self, channel: &str, payload: Value) {
        self.windows.retain(|w| {
            let live = w.is_live();
            if !live {
                debug!("dropping dead window {} from registry", w.id());
            }
            live
        });
        for window in &mut self.windows {
            window.send(channel, payload.clone());
        }
    }

    /// Removes a window from the registry, handing it to the caller for
    /// teardown.
    pub fn remove(&mut self, id: WindowId) -> Option<AppWindow> {
        let pos = self.windows.iter().position(|w| w.id() == id)?;
        let window = self.windows.remove(pos);
        if self.current_id == Some(id) {
            self.current_id = self.windows.last().map(|w| w.id());
        }
        Some(window)
    }

    /// Runs deferred per-window work (queued bounds refits).
    pub fn flush_deferred(&mut self) {
        for window in &mut self.windows {
            window.flush_deferred();
        }
    }
}
