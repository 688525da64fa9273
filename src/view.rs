//! One content view: a surface handle plus the metadata the shell tracks
//! for it (title, url, favicon, cached bounds).

use serde_json::Value;

use crate::host::{SurfaceHandle, SurfaceId};
use crate::types::geometry::Rect;

/// A tab's content surface together with its shell-side metadata.
pub struct ContentView {
    surface: SurfaceHandle,
    id: SurfaceId,
    url: String,
    title: String,
    favicon: Option<String>,
    bounds: Rect,
    incognito: bool,
}

impl ContentView {
    pub fn new(surface: SurfaceHandle, incognito: bool) -> Self {
        let (id, url) = {
            let s = surface.borrow();
            (s.id(), s.url())
        };
        Self {
            surface,
            id,
            url,
            title: String::new(),
            favicon: None,
            bounds: Rect::new(0, 0, 0, 0),
            incognito,
        }
    }

    pub fn id(&self) -> SurfaceId {
        self.id
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn favicon(&self) -> Option<&str> {
        self.favicon.as_deref()
    }

    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    pub fn incognito(&self) -> bool {
        self.incognito
    }

    pub fn is_live(&self) -> bool {
        self.surface.borrow().is_live()
    }

    /// Applies a title change from the host. Returns true when the title
    /// actually changed.
    pub fn update_title(&mut self, title: &str) -> bool {
        if self.title == title {
            return false;
        }
        self.title = title.to_string();
        true
    }

    /// Applies a navigation from the host.
    pub fn update_url(&mut self, url: &str) {
        self.url = url.to_string();
    }

    pub fn set_favicon(&mut self, favicon: Option<String>) {
        self.favicon = favicon;
    }

    /// Fits the view into the window's content area below the chrome UI.
    /// In fullscreen the chrome is hidden and the view takes the whole
    /// content area.
    pub fn fix_bounds(
        &mut self,
        content_width: i32,
        content_height: i32,
        chrome_height: i32,
        fullscreen: bool,
    ) {
        let top = if fullscreen { 0 } else { chrome_height };
        let bounds = Rect::new(0, top, content_width, content_height - top);
        self.bounds = bounds;
        let mut surface = self.surface.borrow_mut();
        if surface.is_live() {
            surface.set_bounds(bounds);
        }
    }

    pub fn focus(&mut self) {
        let mut surface = self.surface.borrow_mut();
        if surface.is_live() {
            surface.focus();
        }
    }

    pub fn navigate(&mut self, url: &str) {
        let mut surface = self.surface.borrow_mut();
        if surface.is_live() {
            surface.navigate(url);
        }
        self.url = url.to_string();
    }

    pub fn set_muted(&mut self, muted: bool) {
        let mut surface = self.surface.borrow_mut();
        if surface.is_live() {
            surface.set_audio_muted(muted);
        }
    }

    pub fn muted(&self) -> bool {
        self.surface.borrow().audio_muted()
    }

    pub fn zoom_factor(&self) -> f64 {
        self.surface.borrow().zoom_factor()
    }

    pub fn set_zoom_factor(&mut self, factor: f64) {
        let mut surface = self.surface.borrow_mut();
        if surface.is_live() {
            surface.set_zoom_factor(factor);
        }
    }

    /// Message to this view's renderer preload.
    pub fn send(&mut self, channel: &str, payload: Value) {
        let mut surface = self.surface.borrow_mut();
        if surface.is_live() {
            surface.send(channel, payload);
        }
    }

    /// Releases the underlying surface. Safe to call repeatedly and after
    /// the surface has already died.
    pub fn destroy(&mut self) {
        let mut surface = self.surface.borrow_mut();
        if surface.is_live() {
            surface.destroy();
        }
    }
}
