//! Design and web-contents constants shared across the shell.

/// Application name used for window titles and prompts.
pub const APP_NAME: &str = "Cormorant";

/// Lower bound for a content surface's zoom factor.
pub const ZOOM_FACTOR_MIN: f64 = 0.25;
/// Upper bound for a content surface's zoom factor.
pub const ZOOM_FACTOR_MAX: f64 = 5.0;
/// Step applied per zoom-in/zoom-out request.
pub const ZOOM_FACTOR_INCREMENT: f64 = 0.1;

/// Horizontal margin around positioned dialog surfaces.
pub const DIALOG_MARGIN: i32 = 16;
/// Top margin for dialog surfaces anchored to a toolbar element.
pub const DIALOG_MARGIN_TOP: i32 = 8;
/// Y offset of dialogs that hang below the address bar.
pub const DIALOG_TOP: i32 = 8;

/// Grace delay, in milliseconds, before a hidden dialog surface is detached
/// from the window's view stack so its closing animation can finish.
pub const DIALOG_HIDE_TIMEOUT_MS: u64 = 150;

/// Names of dialog surfaces that are created once and reused.
pub const PERSISTENT_DIALOGS: &[&str] = &["search", "preview", "credentials"];
