//! One overlay dialog surface and its lifecycle state machine.

use std::rc::Rc;
use std::time::{Duration, Instant};

use serde_json::Value;

use crate::constants::DIALOG_HIDE_TIMEOUT_MS;
use crate::host::{SurfaceHandle, SurfaceId, WindowHandle};
use crate::types::errors::DialogError;
use crate::types::geometry::Rect;

/// Blank page loaded while the surface boots, before the real content URL.
pub const BOOT_PAGE: &str = "data:text/html,";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogState {
    /// Navigating the transparent boot page.
    BootLoading,
    /// Boot finished, navigating the real content.
    ContentLoading,
    Ready,
    Destroyed,
}

/// A show request deferred until the dialog's content has loaded.
struct QueuedShow {
    window: WindowHandle,
    focus: bool,
    bounds: Rect,
}

/// An overlay surface attached on top of a window's view stack.
///
/// Hiding detaches lazily: the surface stays attached for a short grace
/// period so a closing animation can play, then [`DialogSurface::expire`]
/// detaches it. Showing again within the grace period cancels the pending
/// detach.
pub struct DialogSurface {
    name: String,
    surface: SurfaceHandle,
    content_url: String,
    state: DialogState,
    visible: bool,
    persistent: bool,
    bounds: Rect,
    attached_to: Option<WindowHandle>,
    queued_show: Option<QueuedShow>,
    hide_deadline: Option<Instant>,
}

impl DialogSurface {
    /// Wraps a surface created on [`BOOT_PAGE`]. The first load notification
    /// swaps it to the real content URL.
    pub fn new(name: &str, surface: SurfaceHandle, content_url: &str, persistent: bool) -> Self {
        Self {
            name: name.to_string(),
            surface,
            content_url: content_url.to_string(),
            state: DialogState::BootLoading,
            visible: false,
            persistent,
            bounds: Rect::default(),
            attached_to: None,
            queued_show: None,
            hide_deadline: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn surface_id(&self) -> SurfaceId {
        self.surface.borrow().id()
    }

    pub fn state(&self) -> DialogState {
        self.state
    }

    pub fn visible(&self) -> bool {
        self.visible
    }

    pub fn persistent(&self) -> bool {
        self.persistent
    }

    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    /// The surface finished a load. Advances boot → content → ready, and
    /// runs a queued show once ready. Returns `true` when the dialog just
    /// became ready.
    pub fn notify_loaded(&mut self) -> bool {
        match self.state {
            DialogState::BootLoading => {
                self.state = DialogState::ContentLoading;
                let mut surface = self.surface.borrow_mut();
                if surface.is_live() {
                    surface.navigate(&self.content_url);
                }
                false
            }
            DialogState::ContentLoading => {
                self.state = DialogState::Ready;
                if let Some(queued) = self.queued_show.take() {
                    self.attach(&queued.window, queued.focus, queued.bounds);
                }
                true
            }
            DialogState::Ready | DialogState::Destroyed => false,
        }
    }

    /// Shows the dialog over `window` at `bounds`. When the content has not
    /// loaded yet and `wait_for_load` is set, the show is queued and happens
    /// from [`DialogSurface::notify_loaded`]. Returns `true` when the dialog
    /// became visible now.
    pub fn show(
        &mut self,
        window: &WindowHandle,
        bounds: Rect,
        focus: bool,
        wait_for_load: bool,
    ) -> Result<bool, DialogError> {
        if self.state == DialogState::Destroyed {
            return Err(DialogError::Destroyed(self.name.clone()));
        }
        if self.state != DialogState::Ready && wait_for_load {
            self.queued_show = Some(QueuedShow {
                window: window.clone(),
                focus,
                bounds,
            });
            return Ok(false);
        }
        Ok(self.attach(window, focus, bounds))
    }

    fn attach(&mut self, window: &WindowHandle, focus: bool, bounds: Rect) -> bool {
        self.hide_deadline = None;
        if self.visible {
            if let Some(attached) = &self.attached_to {
                // Already showing over this window; just move focus back.
                if Rc::ptr_eq(attached, window) {
                    if focus {
                        self.surface.borrow_mut().focus();
                    }
                    return false;
                }
            }
        }
        self.bounds = bounds;
        let id = self.surface_id();
        {
            let mut surface = self.surface.borrow_mut();
            if !surface.is_live() {
                return false;
            }
            surface.set_bounds(bounds);
        }
        {
            let mut win = window.borrow_mut();
            if !win.is_live() {
                return false;
            }
            win.attach(id);
            win.raise(id);
        }
        self.attached_to = Some(window.clone());
        if focus {
            self.surface.borrow_mut().focus();
        }
        let became_visible = !self.visible;
        self.visible = true;
        became_visible
    }

    /// Hides the dialog. The detach is deferred by a grace period measured
    /// from `now`. Returns `true` when the dialog was visible.
    pub fn hide(&mut self, now: Instant) -> bool {
        if !self.visible {
            return false;
        }
        self.visible = false;
        self.queued_show = None;
        self.hide_deadline = Some(now + Duration::from_millis(DIALOG_HIDE_TIMEOUT_MS));
        true
    }

    /// Runs the deferred detach when its deadline has passed and the dialog
    /// was not re-shown meanwhile. Returns `true` when the detach ran.
    pub fn expire(&mut self, now: Instant) -> bool {
        let Some(deadline) = self.hide_deadline else {
            return false;
        };
        if now < deadline || self.visible {
            return false;
        }
        self.hide_deadline = None;
        self.detach();
        true
    }

    fn detach(&mut self) {
        let id = self.surface_id();
        if let Some(window) = self.attached_to.take() {
            let mut win = window.borrow_mut();
            if win.is_live() {
                win.detach(id);
            }
        }
    }

    /// Message to the dialog's renderer.
    pub fn send(&mut self, channel: &str, payload: Value) {
        let mut surface = self.surface.borrow_mut();
        if surface.is_live() {
            surface.send(channel, payload);
        }
    }

    /// Detaches, blanks and releases the surface. Idempotent.
    pub fn destroy(&mut self) {
        if self.state == DialogState::Destroyed {
            return;
        }
        self.detach();
        {
            let mut surface = self.surface.borrow_mut();
            if surface.is_live() {
                surface.navigate("about:blank");
                surface.destroy();
            }
        }
        self.visible = false;
        self.queued_show = None;
        self.hide_deadline = None;
        self.state = DialogState::Destroyed;
    }
}
