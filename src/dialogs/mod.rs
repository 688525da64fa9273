//! Overlay dialog management: persistent dialogs created at startup and
//! dynamic popups created on first show.

pub mod anchor;
pub mod dialog;

use std::collections::HashMap;
use std::time::Instant;

use log::debug;
use serde_json::Value;

use crate::constants::PERSISTENT_DIALOGS;
use crate::host::{ContentHost, SurfaceId, WindowHandle};
use crate::types::errors::DialogError;
use crate::types::events::{DialogEvent, EventHub};
use crate::types::geometry::Rect;

use anchor::{position_popup, AnchorProvider, ButtonBoundsAnchor, RectFieldAnchor};
use dialog::{DialogSurface, BOOT_PAGE};

/// Session partition dialog surfaces are created under.
pub const PARTITION_UI: &str = "ui";

fn content_url(name: &str) -> String {
    format!("app://{}", name)
}

/// Registry of overlay dialogs, keyed by name.
pub struct DialogsService {
    dialogs: HashMap<String, DialogSurface>,
    anchors: HashMap<&'static str, Box<dyn AnchorProvider>>,
    hub: EventHub<DialogEvent>,
}

impl Default for DialogsService {
    fn default() -> Self {
        Self::new()
    }
}

impl DialogsService {
    pub fn new() -> Self {
        let mut anchors: HashMap<&'static str, Box<dyn AnchorProvider>> = HashMap::new();
        anchors.insert("extension-popup", Box::new(ButtonBoundsAnchor));
        anchors.insert("menu", Box::new(RectFieldAnchor));
        anchors.insert("zoom", Box::new(RectFieldAnchor));
        anchors.insert("tabgroup", Box::new(RectFieldAnchor));
        anchors.insert("downloads-dialog", Box::new(RectFieldAnchor));
        Self {
            dialogs: HashMap::new(),
            anchors,
            hub: EventHub::new(),
        }
    }

    /// Creates the persistent dialogs. They boot hidden and stay registered
    /// for the lifetime of the app.
    pub fn run(&mut self, host: &mut dyn ContentHost) {
        for name in PERSISTENT_DIALOGS {
            if !self.dialogs.contains_key(*name) {
                self.create(host, name, true);
            }
        }
    }

    fn create(&mut self, host: &mut dyn ContentHost, name: &str, persistent: bool) {
        let surface = host.create_surface(PARTITION_UI, BOOT_PAGE);
        let dialog = DialogSurface::new(name, surface, &content_url(name), persistent);
        self.dialogs.insert(name.to_string(), dialog);
    }

    pub fn get(&self, name: &str) -> Option<&DialogSurface> {
        self.dialogs.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut DialogSurface> {
        self.dialogs.get_mut(name)
    }

    pub fn visible(&self, name: &str) -> bool {
        self.dialogs.get(name).map(|d| d.visible()).unwrap_or(false)
    }

    pub fn events(&mut self) -> &mut EventHub<DialogEvent> {
        &mut self.hub
    }

    /// Shows a dialog over `window` at explicit bounds, creating it first
    /// when it is a dynamic one.
    pub fn show(
        &mut self,
        host: &mut dyn ContentHost,
        name: &str,
        window: &WindowHandle,
        bounds: Rect,
        focus: bool,
        wait_for_load: bool,
    ) -> Result<(), DialogError> {
        if !self.dialogs.contains_key(name) {
            self.create(host, name, false);
        }
        // Just inserted above when missing.
        let dialog = self
            .dialogs
            .get_mut(name)
            .ok_or_else(|| DialogError::NotFound(name.to_string()))?;
        let became_visible = dialog.show(window, bounds, focus, wait_for_load)?;
        if became_visible {
            self.hub
                .publish(DialogEvent::VisibilityChanged(name.to_string(), true));
        }
        Ok(())
    }

    /// Shows an anchored popup. The anchor rectangle comes out of `payload`
    /// via the provider registered for this popup's shape; the popup size is
    /// taken from the payload's `width`/`height` when present.
    pub fn show_popup(
        &mut self,
        host: &mut dyn ContentHost,
        name: &str,
        window: &WindowHandle,
        payload: &Value,
    ) -> Result<(), DialogError> {
        let provider = self
            .anchors
            .get(name)
            .ok_or_else(|| DialogError::NotFound(name.to_string()))?;
        let anchor = provider
            .anchor_rect(payload)
            .ok_or_else(|| DialogError::PromptFailed(format!("bad anchor payload for {}", name)))?;

        let width = payload.get("width").and_then(Value::as_i64).unwrap_or(360) as i32;
        let height = payload.get("height").and_then(Value::as_i64).unwrap_or(400) as i32;
        let (content_width, content_height) = window.borrow().content_size();
        let bounds = position_popup(anchor, width, height, content_width, content_height);

        self.show(host, name, window, bounds, true, true)
    }

    /// Hides a dialog. Its detach runs after the grace period, from
    /// [`DialogsService::process_timeouts`]. Unknown names are ignored.
    pub fn hide(&mut self, name: &str, now: Instant) {
        let Some(dialog) = self.dialogs.get_mut(name) else {
            return;
        };
        if dialog.hide(now) {
            self.hub
                .publish(DialogEvent::VisibilityChanged(name.to_string(), false));
        }
    }

    /// Routes a host load notification to the dialog owning the surface.
    pub fn notify_loaded(&mut self, surface: SurfaceId) {
        let mut ready: Option<String> = None;
        for (name, dialog) in self.dialogs.iter_mut() {
            if dialog.surface_id() == surface {
                if dialog.notify_loaded() {
                    ready = Some(name.clone());
                }
                break;
            }
        }
        if let Some(name) = ready {
            self.hub.publish(DialogEvent::Loaded(name));
        }
    }

    /// Runs expired hide deadlines. Dynamic dialogs whose grace period
    /// elapsed are destroyed and dropped from the registry.
    pub fn process_timeouts(&mut self, now: Instant) {
        let mut expired_dynamic = Vec::new();
        for (name, dialog) in self.dialogs.iter_mut() {
            if dialog.expire(now) && !dialog.persistent() {
                expired_dynamic.push(name.clone());
            }
        }
        for name in expired_dynamic {
            debug!("destroying dynamic dialog {}", name);
            if let Some(mut dialog) = self.dialogs.remove(&name) {
                dialog.destroy();
            }
        }
    }

    pub fn send_to(&mut self, name: &str, channel: &str, payload: Value) {
        if let Some(dialog) = self.dialogs.get_mut(name) {
            dialog.send(channel, payload);
        }
    }

    /// Destroys one dialog and forgets it.
    pub fn destroy(&mut self, name: &str) {
        if let Some(mut dialog) = self.dialogs.remove(name) {
            dialog.destroy();
        }
    }

    /// Tears every dialog down. Runs when the last window closes.
    pub fn destroy_all(&mut self) {
        for (_, mut dialog) in self.dialogs.drain() {
            dialog.destroy();
        }
    }
}
