//! Capability seam to the windowing/compositing host and the
//! content-rendering engine.
//!
//! The coordinating process never talks to a real compositor or renderer
//! directly; it holds opaque handles implementing these traits. Every
//! mutating call site is expected to check [`NativeWindow::is_live`] /
//! [`ContentSurface::is_live`] first and no-op otherwise — window teardown
//! races with deferred bounds fitting, and a destroyed handle must never
//! fault the shell.

pub mod headless;

use std::cell::RefCell;
use std::rc::Rc;

use serde_json::Value;

use crate::types::geometry::Rect;

/// Stable identity of a native top-level window.
pub type WindowId = u32;
/// Stable identity of one content surface (the underlying process binding).
pub type SurfaceId = u32;

/// Shared handle to a native window. The coordinating process is a
/// single-threaded cooperative event loop, so `Rc<RefCell<…>>` is the
/// ownership model; an implementer on a multi-threaded runtime must replace
/// this with an actor boundary or mutex.
pub type WindowHandle = Rc<RefCell<dyn NativeWindow>>;
/// Shared handle to one content surface.
pub type SurfaceHandle = Rc<RefCell<dyn ContentSurface>>;

/// One native top-level window with an attachable stack of content surfaces.
pub trait NativeWindow {
    fn id(&self) -> WindowId;
    fn is_live(&self) -> bool;

    fn bounds(&self) -> Rect;
    fn set_bounds(&mut self, bounds: Rect);
    /// Width and height of the content area (excludes native frame).
    fn content_size(&self) -> (i32, i32);
    /// Measured height of the chrome UI (toolbar, bookmarks bar, …) as
    /// reported by the window's UI surface.
    fn chrome_height(&self) -> i32;

    /// Inserts a surface into the window's visible view stack.
    fn attach(&mut self, surface: SurfaceId);
    /// Removes a surface from the view stack. Must tolerate ids that are
    /// not attached.
    fn detach(&mut self, surface: SurfaceId);
    /// Moves an attached surface to the top of the z-order.
    fn raise(&mut self, surface: SurfaceId);

    fn set_title(&mut self, title: &str);
    fn focus(&mut self);
    /// Moves input focus to the chrome UI rather than any content surface.
    fn focus_chrome(&mut self);

    fn minimize(&mut self);
    fn maximize(&mut self);
    fn unmaximize(&mut self);
    fn maximized(&self) -> bool;
    fn fullscreen(&self) -> bool;
    fn set_fullscreen(&mut self, fullscreen: bool);

    /// Fire-and-forget message to the window's chrome UI surface.
    fn send(&mut self, channel: &str, payload: Value);
    /// Blocking native confirmation; `true` means proceed.
    fn confirm(&mut self, title: &str, message: &str) -> bool;

    /// Destroys the native window. Idempotent.
    fn close(&mut self);
}

/// One isolated, navigable content surface (a tab or a dialog's renderer).
pub trait ContentSurface {
    fn id(&self) -> SurfaceId;
    fn is_live(&self) -> bool;

    fn url(&self) -> String;
    fn navigate(&mut self, url: &str);
    fn focus(&mut self);

    fn set_audio_muted(&mut self, muted: bool);
    fn audio_muted(&self) -> bool;

    fn zoom_factor(&self) -> f64;
    fn set_zoom_factor(&mut self, factor: f64);

    fn set_bounds(&mut self, bounds: Rect);

    /// Fire-and-forget message to the surface's renderer.
    fn send(&mut self, channel: &str, payload: Value);

    /// Releases the surface's process resources. Idempotent.
    fn destroy(&mut self);
}

/// The content-rendering engine: creates windows and surfaces and owns the
/// storage behind each session partition.
pub trait ContentHost {
    fn create_window(&mut self, incognito: bool) -> WindowHandle;
    /// Creates a surface bound to the given session partition, already
    /// navigating to `url`.
    fn create_surface(&mut self, partition: &str, url: &str) -> SurfaceHandle;
    /// Clears cookies, caches and storage for one partition.
    fn clear_partition_storage(&mut self, partition: &str);
}

/// Notifications from the host, delivered on the coordinating event loop.
#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    /// A surface's underlying process went away.
    SurfaceDestroyed(SurfaceId),
    TitleChanged(SurfaceId, String),
    NavigationChanged(SurfaceId, String),
    /// The page's favicon changed; `None` when the page has none.
    FaviconChanged(SurfaceId, Option<String>),
    /// A surface finished its initial content load.
    SurfaceLoaded(SurfaceId),
    WindowResized(WindowId),
    WindowMoved(WindowId),
    WindowMaximized(WindowId),
    WindowUnmaximized(WindowId),
    WindowFocused(WindowId),
    /// Native fullscreen toggled.
    FullscreenChanged(WindowId, bool),
    /// Content requested HTML fullscreen (video player etc).
    HtmlFullscreenChanged(WindowId, bool),
    /// The chrome UI reported a new measured height.
    ChromeResized(WindowId),
    /// The user asked the window to close.
    CloseRequested(WindowId),
}
