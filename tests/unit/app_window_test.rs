use std::path::PathBuf;

use cormorant::app_window::AppWindow;
use cormorant::host::headless::HeadlessHost;
use cormorant::host::{ContentHost, NativeWindow};
use cormorant::types::geometry::Rect;
use cormorant::types::window_state::WindowState;

fn state_path(dir: &tempfile::TempDir) -> PathBuf {
    dir.path().join("window-state.json")
}

#[test]
fn test_restores_persisted_geometry() {
    let dir = tempfile::tempdir().unwrap();
    let path = state_path(&dir);
    WindowState {
        bounds: Rect::new(10, 20, 1000, 600),
        maximized: false,
        fullscreen: false,
    }
    .save(&path)
    .unwrap();

    let mut host = HeadlessHost::new();
    let window = AppWindow::new(&mut host, false, path);
    let concrete = host.window(window.id()).unwrap();
    assert_eq!(concrete.borrow().bounds(), Rect::new(10, 20, 1000, 600));
}

#[test]
fn test_corrupt_state_file_falls_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = state_path(&dir);
    std::fs::write(&path, "{ not json").unwrap();

    let mut host = HeadlessHost::new();
    let window = AppWindow::new(&mut host, false, path);
    let concrete = host.window(window.id()).unwrap();
    assert_eq!(concrete.borrow().bounds(), Rect::new(0, 0, 900, 700));
}

#[test]
fn test_restores_maximized_flag() {
    let dir = tempfile::tempdir().unwrap();
    let path = state_path(&dir);
    WindowState {
        bounds: Rect::new(0, 0, 900, 700),
        maximized: true,
        fullscreen: false,
    }
    .save(&path)
    .unwrap();

    let mut host = HeadlessHost::new();
    let window = AppWindow::new(&mut host, false, path);
    let concrete = host.window(window.id()).unwrap();
    assert!(concrete.borrow().maximized());
}

#[test]
fn test_resize_persists_new_bounds() {
    let dir = tempfile::tempdir().unwrap();
    let path = state_path(&dir);

    let mut host = HeadlessHost::new();
    let mut window = AppWindow::new(&mut host, false, path.clone());
    let concrete = host.window(window.id()).unwrap();

    concrete.borrow_mut().set_bounds(Rect::new(5, 5, 800, 500));
    window.on_resized();
    window.persist_state();

    let restored = WindowState::load(&path);
    assert_eq!(restored.bounds, Rect::new(5, 5, 800, 500));
}

#[test]
fn test_maximized_resize_keeps_floating_bounds() {
    let dir = tempfile::tempdir().unwrap();
    let path = state_path(&dir);

    let mut host = HeadlessHost::new();
    let mut window = AppWindow::new(&mut host, false, path.clone());
    let concrete = host.window(window.id()).unwrap();

    concrete.borrow_mut().set_bounds(Rect::new(5, 5, 800, 500));
    window.on_resized();

    // Maximizing changes native bounds, but the recorded floating
    // geometry must survive.
    concrete.borrow_mut().maximize();
    concrete.borrow_mut().set_bounds(Rect::new(0, 0, 1920, 1080));
    window.on_resized();
    window.on_maximized();
    window.persist_state();

    let restored = WindowState::load(&path);
    assert_eq!(restored.bounds, Rect::new(5, 5, 800, 500));
    assert!(restored.maximized);
}

#[test]
fn test_resize_defers_bounds_fix_until_flush() {
    let dir = tempfile::tempdir().unwrap();
    let mut host = HeadlessHost::new();
    let mut window = AppWindow::new(&mut host, false, state_path(&dir));
    let concrete = host.window(window.id()).unwrap();
    concrete.borrow_mut().chrome_height = 80;

    let view = window
        .view_manager
        .create(&mut host, "https://example.com", true, None);
    concrete.borrow_mut().set_bounds(Rect::new(0, 0, 640, 480));
    window.on_resized();

    // Not refit yet: still sized for the restored 900x700 window.
    let bounds = host.surface(view).unwrap().borrow().bounds;
    assert_eq!(bounds.width, 900);

    window.flush_deferred();
    let bounds = host.surface(view).unwrap().borrow().bounds;
    assert_eq!(bounds.width, 640);
    assert_eq!(bounds.height, 400);
}

#[test]
fn test_html_fullscreen_notifies_chrome_and_refits() {
    let dir = tempfile::tempdir().unwrap();
    let mut host = HeadlessHost::new();
    let mut window = AppWindow::new(&mut host, false, state_path(&dir));
    let concrete = host.window(window.id()).unwrap();
    concrete.borrow_mut().chrome_height = 80;

    let view = window
        .view_manager
        .create(&mut host, "https://example.com", true, None);
    window.on_html_fullscreen(true);

    let sent = concrete.borrow().sent.clone();
    assert!(sent
        .iter()
        .any(|(channel, payload)| channel == "html-fullscreen" && payload == &serde_json::json!(true)));
    assert_eq!(host.surface(view).unwrap().borrow().bounds.y, 0);
}

#[test]
fn test_chrome_resize_refits_immediately() {
    let dir = tempfile::tempdir().unwrap();
    let mut host = HeadlessHost::new();
    let mut window = AppWindow::new(&mut host, false, state_path(&dir));
    let concrete = host.window(window.id()).unwrap();
    concrete.borrow_mut().chrome_height = 80;

    let view = window
        .view_manager
        .create(&mut host, "https://example.com", true, None);
    concrete.borrow_mut().chrome_height = 110;
    window.on_chrome_resized();

    assert_eq!(host.surface(view).unwrap().borrow().bounds.y, 110);
}

#[test]
fn test_confirm_close_single_tab_skips_prompt() {
    let dir = tempfile::tempdir().unwrap();
    let mut host = HeadlessHost::new();
    let mut window = AppWindow::new(&mut host, false, state_path(&dir));
    window
        .view_manager
        .create(&mut host, "https://example.com", true, None);

    let concrete = host.window(window.id()).unwrap();
    concrete.borrow_mut().confirm_answer = false;

    assert!(window.confirm_close());
    assert!(concrete.borrow().confirms.is_empty());
}

#[test]
fn test_confirm_close_multiple_tabs_respects_answer() {
    let dir = tempfile::tempdir().unwrap();
    let mut host = HeadlessHost::new();
    let mut window = AppWindow::new(&mut host, false, state_path(&dir));
    window
        .view_manager
        .create(&mut host, "https://a.com", true, None);
    window
        .view_manager
        .create(&mut host, "https://b.com", false, None);

    let concrete = host.window(window.id()).unwrap();
    concrete.borrow_mut().confirm_answer = false;
    assert!(!window.confirm_close());

    concrete.borrow_mut().confirm_answer = true;
    assert!(window.confirm_close());
    assert_eq!(concrete.borrow().confirms.len(), 2);
}
