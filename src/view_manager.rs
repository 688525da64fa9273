//! Per-window registry of content views and the select/attach state machine.

use std::collections::HashMap;

use log::{debug, warn};
use serde_json::json;

use crate::constants::{APP_NAME, ZOOM_FACTOR_INCREMENT, ZOOM_FACTOR_MAX, ZOOM_FACTOR_MIN};
use crate::host::{ContentHost, SurfaceId, WindowHandle, WindowId};
use crate::types::errors::{ExtensionError, ViewError};
use crate::types::events::{EventHub, ViewEvent};
use crate::view::ContentView;

/// Session partition for regular views.
pub const PARTITION_VIEW: &str = "view";
/// Session partition for incognito views.
pub const PARTITION_VIEW_INCOGNITO: &str = "view_incognito";

/// Direction of a zoom request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoomDirection {
    In,
    Out,
}

/// Extension-facing tab bookkeeping. Implemented by the sessions layer;
/// failures here must never prevent a view from being created.
pub trait TabTracker {
    fn track_tab(&mut self, surface: SurfaceId, window: WindowId) -> Result<(), ExtensionError>;
    fn untrack_tab(&mut self, surface: SurfaceId);
}

/// Owns every content view of one window and tracks which one is selected.
///
/// At most one view is attached to the window at a time; selecting a view
/// detaches the previous one first. Note that destroying the selected view
/// does not clear the selection: `selected_id` keeps pointing at the removed
/// surface until the next select or `clear`, and callers resolving it through
/// the registry get `None`.
pub struct ViewManager {
    window: WindowHandle,
    window_id: WindowId,
    views: HashMap<SurfaceId, ContentView>,
    selected_id: Option<SurfaceId>,
    incognito: bool,
    fullscreen: bool,
    hub: EventHub<ViewEvent>,
}

impl ViewManager {
    pub fn new(window: WindowHandle, incognito: bool) -> Self {
        let window_id = window.borrow().id();
        Self {
            window,
            window_id,
            views: HashMap::new(),
            selected_id: None,
            incognito,
            fullscreen: false,
            hub: EventHub::new(),
        }
    }

    pub fn incognito(&self) -> bool {
        self.incognito
    }

    pub fn selected_id(&self) -> Option<SurfaceId> {
        self.selected_id
    }

    pub fn len(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }

    pub fn get(&self, id: SurfaceId) -> Option<&ContentView> {
        self.views.get(&id)
    }

    pub fn get_mut(&mut self, id: SurfaceId) -> Option<&mut ContentView> {
        self.views.get_mut(&id)
    }

    /// The selected view, if the selection still resolves to a registered
    /// view.
    pub fn selected(&self) -> Option<&ContentView> {
        self.selected_id.and_then(|id| self.views.get(&id))
    }

    pub fn selected_mut(&mut self) -> Option<&mut ContentView> {
        match self.selected_id {
            Some(id) => self.views.get_mut(&id),
            None => None,
        }
    }

    pub fn ids(&self) -> Vec<SurfaceId> {
        self.views.keys().copied().collect()
    }

    pub fn events(&mut self) -> &mut EventHub<ViewEvent> {
        &mut self.hub
    }

    /// Creates a view in this window's session partition. Tab tracking is
    /// best-effort: a tracker failure is logged and the view is kept.
    pub fn create(
        &mut self,
        host: &mut dyn ContentHost,
        url: &str,
        select: bool,
        tracker: Option<&mut dyn TabTracker>,
    ) -> SurfaceId {
        let partition = if self.incognito {
            PARTITION_VIEW_INCOGNITO
        } else {
            PARTITION_VIEW
        };
        let surface = host.create_surface(partition, url);
        let view = ContentView::new(surface, self.incognito);
        let id = view.id();
        self.views.insert(id, view);

        if let Some(tracker) = tracker {
            if let Err(err) = tracker.track_tab(id, self.window_id) {
                warn!("tab tracking failed for surface {}: {}", id, err);
            }
        }

        if select {
            // A freshly created surface cannot be missing from the registry.
            let _ = self.select(id, true);
        }
        id
    }

    /// Creates one view per url, selecting the last. Returns the new ids in
    /// order.
    pub fn create_many(
        &mut self,
        host: &mut dyn ContentHost,
        urls: &[String],
        mut tracker: Option<&mut dyn TabTracker>,
    ) -> Vec<SurfaceId> {
        let mut ids = Vec::with_capacity(urls.len());
        for (i, url) in urls.iter().enumerate() {
            let select = i + 1 == urls.len();
            let t = match tracker {
                Some(ref mut t) => Some(&mut **t as &mut dyn TabTracker),
                None => None,
            };
            ids.push(self.create(host, url, select, t));
        }
        ids
    }

    /// Makes `id` the window's visible view: detaches the previous selection,
    /// notifies the chrome UI, attaches and raises the surface, moves focus,
    /// refreshes the window title and refits bounds.
    pub fn select(&mut self, id: SurfaceId, focus: bool) -> Result<(), ViewError> {
        if !self.views.contains_key(&id) {
            return Err(ViewError::NotFound(id));
        }

        if let Some(prev) = self.selected_id {
            if prev != id && self.views.contains_key(&prev) {
                let mut window = self.window.borrow_mut();
                if window.is_live() {
                    window.detach(prev);
                }
            }
        }

        self.selected_id = Some(id);

        {
            let mut window = self.window.borrow_mut();
            if window.is_live() {
                window.send("select-tab", json!(id));
                window.attach(id);
                window.raise(id);
            }
        }

        if focus {
            if let Some(view) = self.views.get_mut(&id) {
                view.focus();
            }
        } else {
            let mut window = self.window.borrow_mut();
            if window.is_live() {
                window.focus_chrome();
            }
        }

        self.update_window_title();
        self.fix_bounds();
        self.hub.publish(ViewEvent::Activated(id));
        Ok(())
    }

    /// Destroys a view and removes it from the registry. A second destroy of
    /// the same id is a no-op. The selection is deliberately left untouched.
    pub fn destroy(&mut self, id: SurfaceId, tracker: Option<&mut dyn TabTracker>) {
        let Some(mut view) = self.views.remove(&id) else {
            debug!("destroy of unknown surface {} ignored", id);
            return;
        };

        {
            let mut window = self.window.borrow_mut();
            if window.is_live() {
                window.detach(id);
            }
        }
        view.destroy();

        if let Some(tracker) = tracker {
            tracker.untrack_tab(id);
        }
        self.hub.publish(ViewEvent::Removed(id));
    }

    /// Destroys every view and resets the selection.
    pub fn clear(&mut self, mut tracker: Option<&mut dyn TabTracker>) {
        let ids: Vec<SurfaceId> = self.views.keys().copied().collect();
        for id in ids {
            let t = match tracker {
                Some(ref mut t) => Some(&mut **t as &mut dyn TabTracker),
                None => None,
            };
            self.destroy(id, t);
        }
        self.selected_id = None;
    }

    /// Refits the selected view below the chrome UI, or over the full
    /// content area in fullscreen.
    pub fn fix_bounds(&mut self) {
        let (live, width, height, chrome_height) = {
            let window = self.window.borrow();
            let (w, h) = window.content_size();
            (window.is_live(), w, h, window.chrome_height())
        };
        if !live {
            return;
        }
        let fullscreen = self.fullscreen;
        if let Some(view) = self.selected_mut() {
            view.fix_bounds(width, height, chrome_height, fullscreen);
        }
    }

    pub fn fullscreen(&self) -> bool {
        self.fullscreen
    }

    /// HTML fullscreen entered or left by the selected view's content.
    pub fn set_fullscreen(&mut self, fullscreen: bool) {
        self.fullscreen = fullscreen;
        self.fix_bounds();
    }

    /// Steps the selected view's zoom by one increment. A step that would
    /// leave the allowed range is rejected without touching the factor, but
    /// the chrome UI is always told the factor in effect.
    pub fn change_zoom(&mut self, direction: ZoomDirection) {
        let Some(id) = self.selected_id else {
            return;
        };
        let Some(view) = self.views.get_mut(&id) else {
            return;
        };

        let current = view.zoom_factor();
        let target = match direction {
            ZoomDirection::In => current + ZOOM_FACTOR_INCREMENT,
            ZoomDirection::Out => current - ZOOM_FACTOR_INCREMENT,
        };
        if target >= ZOOM_FACTOR_MIN && target <= ZOOM_FACTOR_MAX {
            view.set_zoom_factor(target);
        }
        self.broadcast_zoom(id);
    }

    /// Resets the selected view's zoom to 1.0.
    pub fn reset_zoom(&mut self) {
        let Some(id) = self.selected_id else {
            return;
        };
        let Some(view) = self.views.get_mut(&id) else {
            return;
        };
        view.set_zoom_factor(1.0);
        self.broadcast_zoom(id);
    }

    fn broadcast_zoom(&mut self, id: SurfaceId) {
        let factor = match self.views.get(&id) {
            Some(view) => view.zoom_factor(),
            None => return,
        };
        {
            let mut window = self.window.borrow_mut();
            if window.is_live() {
                window.send("zoom-factor-updated", json!(factor));
            }
        }
        self.hub.publish(ViewEvent::ZoomUpdated(id, factor));
    }

    pub fn set_muted(&mut self, id: SurfaceId, muted: bool) -> Result<(), ViewError> {
        let view = self.views.get_mut(&id).ok_or(ViewError::NotFound(id))?;
        view.set_muted(muted);
        Ok(())
    }

    /// Sets the native window title from the selected view: the bare app
    /// name when the view has no title, `"{title} - {app name}"` otherwise.
    pub fn update_window_title(&mut self) {
        let title = match self.selected() {
            Some(view) if !view.title().is_empty() => {
                format!("{} - {}", view.title(), APP_NAME)
            }
            _ => APP_NAME.to_string(),
        };
        let mut window = self.window.borrow_mut();
        if window.is_live() {
            window.set_title(&title);
        }
    }

    /// Applies a host title change and refreshes window title and chrome UI
    /// when the changed view is selected.
    pub fn title_changed(&mut self, id: SurfaceId, title: &str) {
        let Some(view) = self.views.get_mut(&id) else {
            return;
        };
        if !view.update_title(title) {
            return;
        }
        {
            let mut window = self.window.borrow_mut();
            if window.is_live() {
                window.send("tab-title-changed", json!({ "id": id, "title": title }));
            }
        }
        if self.selected_id == Some(id) {
            self.update_window_title();
        }
    }

    /// Applies a host favicon change.
    pub fn favicon_changed(&mut self, id: SurfaceId, favicon: Option<String>) {
        let Some(view) = self.views.get_mut(&id) else {
            return;
        };
        view.set_favicon(favicon.clone());
        let mut window = self.window.borrow_mut();
        if window.is_live() {
            window.send("tab-favicon-updated", json!({ "id": id, "favicon": favicon }));
        }
    }

    /// Applies a host navigation change.
    pub fn navigation_changed(&mut self, id: SurfaceId, url: &str) {
        let Some(view) = self.views.get_mut(&id) else {
            return;
        };
        view.update_url(url);
        let mut window = self.window.borrow_mut();
        if window.is_live() {
            window.send("tab-url-changed", json!({ "id": id, "url": url }));
        }
    }

    /// The host reported the surface's process gone: drop the registry entry
    /// without touching the (possibly stale) selection.
    pub fn surface_destroyed(&mut self, id: SurfaceId, tracker: Option<&mut dyn TabTracker>) {
        if self.views.contains_key(&id) {
            self.destroy(id, tracker);
        }
    }
}
