//! Cormorant — view/window/session orchestration for a multi-process
//! browser shell.
//!
//! Entry point. Without a real compositor linked in, this runs the
//! orchestration core against the in-process headless host and walks the
//! major flows: window and view lifecycle, zoom, dialogs, downloads and
//! the permission store.

use std::time::{Duration, Instant};

use serde_json::json;

use cormorant::app::{AppPaths, Application};
use cormorant::host::headless::HeadlessHost;
use cormorant::host::{HostEvent, WindowId};
use cormorant::sessions_service::PermissionPrompt;
use cormorant::types::errors::DialogError;

/// Stand-in for the dialog-backed prompt: without a user present, every
/// undecided permission request is denied.
struct DenyPrompt;

impl PermissionPrompt for DenyPrompt {
    fn prompt(
        &mut self,
        _window: WindowId,
        _hostname: &str,
        _permission: &str,
        _media_types: &[String],
    ) -> Result<bool, DialogError> {
        Ok(false)
    }
}

fn main() {
    env_logger::init();

    let user_data = dirs::data_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("cormorant");
    let paths = AppPaths::new(user_data);

    let host = HeadlessHost::new();
    let mut app = match Application::new(host, &paths, Box::new(DenyPrompt)) {
        Ok(app) => app,
        Err(e) => {
            eprintln!("failed to initialize: {}", e);
            std::process::exit(1);
        }
    };

    println!("cormorant v{} — headless demo", env!("CARGO_PKG_VERSION"));
    println!();

    let window_id = app.start();
    println!("opened window {}", window_id);

    let first = app.dispatch(
        &format!("view-create-{}", window_id),
        json!({ "url": "https://example.com", "active": true }),
    );
    let second = app.dispatch(
        &format!("view-create-{}", window_id),
        json!({ "url": "https://example.org", "active": true }),
    );
    println!("created views {:?} and {:?}", first, second);

    app.dispatch(&format!("change-zoom-{}", window_id), json!({ "zoomDirection": "in" }));
    let zoom = app.dispatch(&format!("get-zoom-{}", window_id), json!({}));
    println!("zoom after one step in: {:?}", zoom);

    app.dispatch(
        &format!("dialog-show-{}", window_id),
        json!({ "name": "search" }),
    );
    println!(
        "search dialog visible: {:?}",
        app.dispatch("get-dialog-visibility", json!({ "name": "search" }))
    );
    app.dispatch(
        &format!("dialog-hide-{}", window_id),
        json!({ "name": "search" }),
    );
    app.tick(Instant::now() + Duration::from_millis(500));

    let granted =
        app.handle_permission_request(second.and_then(|v| v.as_u64()).unwrap_or(0) as u32, "example.org", "notifications", &[]);
    println!("notifications for example.org: {}", granted);

    app.handle_host_event(HostEvent::ChromeResized(window_id));
    app.handle_host_event(HostEvent::CloseRequested(window_id));
    println!("windows remaining: {}", app.windows.len());
}
