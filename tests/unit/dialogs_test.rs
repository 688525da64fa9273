use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant};

use cormorant::dialogs::anchor::position_popup;
use cormorant::dialogs::dialog::DialogState;
use cormorant::dialogs::DialogsService;
use cormorant::host::headless::{HeadlessHost, HeadlessWindow};
use cormorant::host::{ContentHost, ContentSurface, NativeWindow, SurfaceId, WindowHandle};
use cormorant::types::events::DialogEvent;
use cormorant::types::geometry::Rect;
use rstest::rstest;

struct Fixture {
    host: HeadlessHost,
    dialogs: DialogsService,
    window: WindowHandle,
    concrete: Rc<RefCell<HeadlessWindow>>,
}

fn setup() -> Fixture {
    let mut host = HeadlessHost::new();
    let window = host.create_window(false);
    let id = window.borrow().id();
    let concrete = host.window(id).unwrap();
    let mut dialogs = DialogsService::new();
    dialogs.run(&mut host);
    Fixture {
        host,
        dialogs,
        window,
        concrete,
    }
}

fn drive_to_ready(f: &mut Fixture, name: &str) {
    let surface = f.dialogs.get(name).unwrap().surface_id();
    f.dialogs.notify_loaded(surface);
    f.dialogs.notify_loaded(surface);
}

#[test]
fn test_run_creates_persistent_dialogs() {
    let f = setup();
    for name in ["search", "preview", "credentials"] {
        let dialog = f.dialogs.get(name).expect(name);
        assert!(dialog.persistent());
        assert!(!dialog.visible());
    }
}

#[test]
fn test_boot_page_loads_before_content() {
    let mut f = setup();
    let surface_id = f.dialogs.get("search").unwrap().surface_id();
    let surface = f.host.surface(surface_id).unwrap();

    assert_eq!(f.dialogs.get("search").unwrap().state(), DialogState::BootLoading);
    assert_eq!(surface.borrow().navigations, vec!["data:text/html,"]);

    f.dialogs.notify_loaded(surface_id);
    assert_eq!(
        f.dialogs.get("search").unwrap().state(),
        DialogState::ContentLoading
    );
    assert_eq!(surface.borrow().navigations.last().unwrap(), "app://search");

    f.dialogs.notify_loaded(surface_id);
    assert_eq!(f.dialogs.get("search").unwrap().state(), DialogState::Ready);
}

#[test]
fn test_show_waits_for_load() {
    let mut f = setup();
    let bounds = Rect::new(0, 80, 400, 300);
    let surface_id = f.dialogs.get("search").unwrap().surface_id();

    let window = f.window.clone();
    f.dialogs
        .show(&mut f.host, "search", &window, bounds, true, true)
        .unwrap();
    // Still loading, so nothing is attached yet.
    assert!(f.concrete.borrow().attached.is_empty());
    assert!(!f.dialogs.visible("search"));

    drive_to_ready(&mut f, "search");
    assert_eq!(f.concrete.borrow().attached, vec![surface_id]);
    assert!(f.dialogs.visible("search"));
}

#[test]
fn test_show_hide_round_trip() {
    let mut f = setup();
    drive_to_ready(&mut f, "search");
    let surface_id = f.dialogs.get("search").unwrap().surface_id();
    let bounds = Rect::new(0, 80, 400, 300);

    let window = f.window.clone();
    f.dialogs
        .show(&mut f.host, "search", &window, bounds, true, true)
        .unwrap();
    assert!(f.dialogs.visible("search"));
    assert_eq!(f.concrete.borrow().attached, vec![surface_id]);
    let dialog = f.dialogs.get("search").unwrap();
    assert_eq!(dialog.name(), "search");
    assert_eq!(dialog.bounds(), bounds);

    let now = Instant::now();
    f.dialogs.hide("search", now);
    assert!(!f.dialogs.visible("search"));
    // Detach is deferred for the closing animation.
    assert_eq!(f.concrete.borrow().attached, vec![surface_id]);

    f.dialogs.process_timeouts(now + Duration::from_millis(200));
    assert!(f.concrete.borrow().attached.is_empty());
    // Persistent dialogs survive the hide.
    assert!(f.dialogs.get("search").is_some());
}

#[test]
fn test_reshow_cancels_pending_detach() {
    let mut f = setup();
    drive_to_ready(&mut f, "search");
    let surface_id = f.dialogs.get("search").unwrap().surface_id();
    let bounds = Rect::new(0, 80, 400, 300);
    let window = f.window.clone();

    f.dialogs
        .show(&mut f.host, "search", &window, bounds, true, true)
        .unwrap();
    let now = Instant::now();
    f.dialogs.hide("search", now);
    f.dialogs
        .show(&mut f.host, "search", &window, bounds, true, true)
        .unwrap();

    f.dialogs.process_timeouts(now + Duration::from_millis(200));
    assert_eq!(f.concrete.borrow().attached, vec![surface_id]);
    assert!(f.dialogs.visible("search"));
}

#[test]
fn test_reshow_of_visible_dialog_only_refocuses() {
    let mut f = setup();
    drive_to_ready(&mut f, "search");
    let surface_id = f.dialogs.get("search").unwrap().surface_id();
    let bounds = Rect::new(0, 80, 400, 300);
    let window = f.window.clone();

    f.dialogs
        .show(&mut f.host, "search", &window, bounds, true, true)
        .unwrap();
    let surface = f.host.surface(surface_id).unwrap();
    let focus_before = surface.borrow().focus_count;

    f.dialogs
        .show(&mut f.host, "search", &window, Rect::new(0, 80, 500, 500), true, true)
        .unwrap();

    assert_eq!(surface.borrow().focus_count, focus_before + 1);
    // Geometry is untouched; the visible dialog was only refocused.
    assert_eq!(f.dialogs.get("search").unwrap().bounds(), bounds);
    assert_eq!(surface.borrow().bounds, bounds);
}

#[test]
fn test_dynamic_dialog_destroyed_after_hide() {
    let mut f = setup();
    let window = f.window.clone();
    let payload = serde_json::json!({
        "rect": { "x": 100, "y": 40, "width": 24, "height": 24 }
    });
    f.dialogs
        .show_popup(&mut f.host, "menu", &window, &payload)
        .unwrap();
    assert!(f.dialogs.get("menu").is_some());
    drive_to_ready(&mut f, "menu");
    assert!(f.dialogs.visible("menu"));
    let surface_id = f.dialogs.get("menu").unwrap().surface_id();

    let now = Instant::now();
    f.dialogs.hide("menu", now);
    f.dialogs.process_timeouts(now + Duration::from_millis(200));

    assert!(f.dialogs.get("menu").is_none());
    assert!(!f.host.surface(surface_id).unwrap().borrow().is_live());
}

#[test]
fn test_destroy_blanks_and_releases_surface() {
    let mut f = setup();
    drive_to_ready(&mut f, "preview");
    let surface_id = f.dialogs.get("preview").unwrap().surface_id();
    let surface = f.host.surface(surface_id).unwrap();

    f.dialogs.destroy("preview");
    assert!(f.dialogs.get("preview").is_none());
    assert_eq!(surface.borrow().navigations.last().unwrap(), "about:blank");
    assert!(!surface.borrow().is_live());
}

#[test]
fn test_destroy_all_on_last_window() {
    let mut f = setup();
    f.dialogs.destroy_all();
    for name in ["search", "preview", "credentials"] {
        assert!(f.dialogs.get(name).is_none());
    }
}

#[test]
fn test_visibility_events_published() {
    let mut f = setup();
    let events: Rc<RefCell<Vec<DialogEvent>>> = Rc::new(RefCell::new(Vec::new()));
    let sink = events.clone();
    f.dialogs
        .events()
        .subscribe(move |e| sink.borrow_mut().push(e.clone()));

    drive_to_ready(&mut f, "search");
    let window = f.window.clone();
    f.dialogs
        .show(&mut f.host, "search", &window, Rect::new(0, 80, 400, 300), true, true)
        .unwrap();
    f.dialogs.hide("search", Instant::now());

    let events = events.borrow();
    assert!(events.contains(&DialogEvent::Loaded("search".to_string())));
    assert!(events.contains(&DialogEvent::VisibilityChanged("search".to_string(), true)));
    assert!(events.contains(&DialogEvent::VisibilityChanged("search".to_string(), false)));
}

#[test]
fn test_send_reaches_dialog_renderer() {
    let mut f = setup();
    let surface_id = f.dialogs.get("search").unwrap().surface_id();
    f.dialogs
        .send_to("search", "search-query", serde_json::json!("rust"));
    let surface = f.host.surface(surface_id).unwrap();
    assert!(surface
        .borrow()
        .sent
        .iter()
        .any(|(channel, _)| channel == "search-query"));
}

// === Popup placement ===
//
// All cases run in a 1280x800 content area.

#[rstest]
#[case::below_the_anchor(Rect::new(500, 40, 24, 24), 360, 400, 500, 72)]
#[case::flipped_above_when_no_room_below(Rect::new(500, 700, 24, 24), 360, 400, 500, 292)]
#[case::clamped_to_right_margin(Rect::new(1270, 40, 24, 24), 360, 400, 904, 72)]
#[case::clamped_to_left_margin(Rect::new(2, 40, 24, 24), 360, 400, 16, 72)]
#[case::too_tall_pinned_to_top_margin(Rect::new(100, 300, 24, 24), 360, 780, 100, 8)]
fn test_popup_placement(
    #[case] anchor: Rect,
    #[case] width: i32,
    #[case] height: i32,
    #[case] expected_x: i32,
    #[case] expected_y: i32,
) {
    let bounds = position_popup(anchor, width, height, 1280, 800);
    assert_eq!(bounds.x, expected_x);
    assert_eq!(bounds.y, expected_y);
    assert_eq!(bounds.width, width);
    assert_eq!(bounds.height, height);
}

#[test]
fn test_unknown_surface_load_is_ignored() {
    let mut f = setup();
    f.dialogs.notify_loaded(SurfaceId::MAX);
    assert_eq!(f.dialogs.get("search").unwrap().state(), DialogState::BootLoading);
}
