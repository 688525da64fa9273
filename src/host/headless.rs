//! In-process host used by the test suite and by `--headless` runs.
//!
//! Windows and surfaces are plain structs that record everything done to
//! them: messages sent, attach/detach order, navigations. Tests script the
//! parts that would normally come from the platform (chrome height, confirm
//! answers, surface death).

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use serde_json::Value;

use super::{ContentHost, ContentSurface, NativeWindow, SurfaceHandle, SurfaceId, WindowHandle, WindowId};
use crate::types::geometry::Rect;

/// A recording stand-in for a native top-level window.
pub struct HeadlessWindow {
    id: WindowId,
    live: bool,
    bounds: Rect,
    maximized: bool,
    fullscreen: bool,
    title: String,
    /// Scripted by tests; a real window measures this from its UI surface.
    pub chrome_height: i32,
    /// Attach order, bottom to top of the z-order.
    pub attached: Vec<SurfaceId>,
    /// Every `(channel, payload)` sent to the chrome UI.
    pub sent: Vec<(String, Value)>,
    /// Answer returned by the next `confirm` call.
    pub confirm_answer: bool,
    /// `(title, message)` of every confirm prompt shown.
    pub confirms: Vec<(String, String)>,
    pub focus_count: u32,
    pub chrome_focus_count: u32,
}

impl HeadlessWindow {
    fn new(id: WindowId) -> Self {
        Self {
            id,
            live: true,
            bounds: Rect::new(0, 0, 1280, 800),
            maximized: false,
            fullscreen: false,
            title: String::new(),
            chrome_height: 80,
            attached: Vec::new(),
            sent: Vec::new(),
            confirm_answer: true,
            confirms: Vec::new(),
            focus_count: 0,
            chrome_focus_count: 0,
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Simulates the platform tearing the window down out from under us.
    pub fn kill(&mut self) {
        self.live = false;
    }
}

impl NativeWindow for HeadlessWindow {
    fn id(&self) -> WindowId {
        self.id
    }

    fn is_live(&self) -> bool {
        self.live
    }

    fn bounds(&self) -> Rect {
        self.bounds
    }

    fn set_bounds(&mut self, bounds: Rect) {
        self.bounds = bounds;
    }

    fn content_size(&self) -> (i32, i32) {
        (self.bounds.width, self.bounds.height)
    }

    fn chrome_height(&self) -> i32 {
        self.chrome_height
    }

    fn attach(&mut self, surface: SurfaceId) {
        if !self.attached.contains(&surface) {
            self.attached.push(surface);
        }
    }

    fn detach(&mut self, surface: SurfaceId) {
        self.attached.retain(|s| *s != surface);
    }

    fn raise(&mut self, surface: SurfaceId) {
        if let Some(pos) = self.attached.iter().position(|s| *s == surface) {
            let id = self.attached.remove(pos);
            self.attached.push(id);
        }
    }

    fn set_title(&mut self, title: &str) {
        self.title = title.to_string();
    }

    fn focus(&mut self) {
        self.focus_count += 1;
    }

    fn focus_chrome(&mut self) {
        self.chrome_focus_count += 1;
    }

    fn minimize(&mut self) {}

    fn maximize(&mut self) {
        self.maximized = true;
    }

    fn unmaximize(&mut self) {
        self.maximized = false;
    }

    fn maximized(&self) -> bool {
        self.maximized
    }

    fn fullscreen(&self) -> bool {
        self.fullscreen
    }

    fn set_fullscreen(&mut self, fullscreen: bool) {
        self.fullscreen = fullscreen;
    }

    fn send(&mut self, channel: &str, payload: Value) {
        self.sent.push((channel.to_string(), payload));
    }

    fn confirm(&mut self, title: &str, message: &str) -> bool {
        self.confirms.push((title.to_string(), message.to_string()));
        self.confirm_answer
    }

    fn close(&mut self) {
        self.live = false;
    }
}

/// A recording stand-in for a content surface.
pub struct HeadlessSurface {
    id: SurfaceId,
    live: bool,
    url: String,
    muted: bool,
    zoom: f64,
    pub bounds: Rect,
    /// Session partition the surface was created under.
    pub partition: String,
    /// Every URL passed to `navigate`, in order.
    pub navigations: Vec<String>,
    /// Every `(channel, payload)` sent to the renderer.
    pub sent: Vec<(String, Value)>,
    pub focus_count: u32,
}

impl HeadlessSurface {
    fn new(id: SurfaceId, partition: &str, url: &str) -> Self {
        Self {
            id,
            live: true,
            url: url.to_string(),
            muted: false,
            zoom: 1.0,
            bounds: Rect::new(0, 0, 0, 0),
            partition: partition.to_string(),
            navigations: vec![url.to_string()],
            sent: Vec::new(),
            focus_count: 0,
        }
    }

    /// Simulates the renderer process dying.
    pub fn kill(&mut self) {
        self.live = false;
    }
}

impl ContentSurface for HeadlessSurface {
    fn id(&self) -> SurfaceId {
        self.id
    }

    fn is_live(&self) -> bool {
        self.live
    }

    fn url(&self) -> String {
        self.url.clone()
    }

    fn navigate(&mut self, url: &str) {
        self.url = url.to_string();
        self.navigations.push(url.to_string());
    }

    fn focus(&mut self) {
        self.focus_count += 1;
    }

    fn set_audio_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    fn audio_muted(&self) -> bool {
        self.muted
    }

    fn zoom_factor(&self) -> f64 {
        self.zoom
    }

    fn set_zoom_factor(&mut self, factor: f64) {
        self.zoom = factor;
    }

    fn set_bounds(&mut self, bounds: Rect) {
        self.bounds = bounds;
    }

    fn send(&mut self, channel: &str, payload: Value) {
        self.sent.push((channel.to_string(), payload));
    }

    fn destroy(&mut self) {
        self.live = false;
    }
}

/// Host implementation that fabricates windows and surfaces in-process.
#[derive(Default)]
pub struct HeadlessHost {
    next_window_id: WindowId,
    next_surface_id: SurfaceId,
    windows: HashMap<WindowId, Rc<RefCell<HeadlessWindow>>>,
    surfaces: HashMap<SurfaceId, Rc<RefCell<HeadlessSurface>>>,
    /// Partitions whose storage was cleared, in order.
    pub cleared_partitions: Vec<String>,
}

impl HeadlessHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Concrete handle to a created window, for inspection in tests.
    pub fn window(&self, id: WindowId) -> Option<Rc<RefCell<HeadlessWindow>>> {
        self.windows.get(&id).cloned()
    }

    /// Concrete handle to a created surface, for inspection in tests.
    pub fn surface(&self, id: SurfaceId) -> Option<Rc<RefCell<HeadlessSurface>>> {
        self.surfaces.get(&id).cloned()
    }

    pub fn surface_count(&self) -> usize {
        self.surfaces.len()
    }
}

impl ContentHost for HeadlessHost {
    fn create_window(&mut self, _incognito: bool) -> WindowHandle {
        self.next_window_id += 1;
        let id = self.next_window_id;
        let window = Rc::new(RefCell::new(HeadlessWindow::new(id)));
        self.windows.insert(id, window.clone());
        window
    }

    fn create_surface(&mut self, partition: &str, url: &str) -> SurfaceHandle {
        self.next_surface_id += 1;
        let id = self.next_surface_id;
        let surface = Rc::new(RefCell::new(HeadlessSurface::new(id, partition, url)));
        self.surfaces.insert(id, surface.clone());
        surface
    }

    fn clear_partition_storage(&mut self, partition: &str) {
        self.cleared_partitions.push(partition.to_string());
    }
}
