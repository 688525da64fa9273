//! Typed per-component event publishing.
//!
//! Each stateful component owns an [`EventHub`] for its own event enum;
//! subscribers register callbacks scoped to that instance. There is no
//! global event bus.

use crate::host::SurfaceId;

/// Events emitted by a `ViewManager` instance.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewEvent {
    /// A view became the selected (attached) surface of its window.
    Activated(SurfaceId),
    /// A view was destroyed and removed from the manager.
    Removed(SurfaceId),
    /// The selected view's zoom factor was (re-)broadcast. Carries the
    /// factor in effect, which is unchanged when a request was clamped.
    ZoomUpdated(SurfaceId, f64),
}

/// Events emitted by a `DialogSurface`.
#[derive(Debug, Clone, PartialEq)]
pub enum DialogEvent {
    /// The dialog's real content finished loading.
    Loaded(String),
    /// Visibility changed; carries the dialog name and the new state.
    VisibilityChanged(String, bool),
}

/// Instance-scoped publish/subscribe hub for one event type.
pub struct EventHub<E> {
    subscribers: Vec<Box<dyn FnMut(&E)>>,
}

impl<E> Default for EventHub<E> {
    fn default() -> Self {
        Self {
            subscribers: Vec::new(),
        }
    }
}

impl<E> EventHub<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a subscriber. Subscribers live as long as the hub.
    pub fn subscribe<F: FnMut(&E) + 'static>(&mut self, callback: F) {
        self.subscribers.push(Box::new(callback));
    }

    /// Delivers an event to every subscriber, in registration order.
    pub fn publish(&mut self, event: E) {
        for sub in &mut self.subscribers {
            sub(&event);
        }
    }
}

impl<E> std::fmt::Debug for EventHub<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventHub")
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}
