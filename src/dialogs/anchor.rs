//! Anchoring for popup dialogs: where on the chrome a popup hangs from,
//! and the clamp math that keeps it on screen.

use serde_json::Value;

use crate::constants::{DIALOG_MARGIN, DIALOG_MARGIN_TOP, DIALOG_TOP};
use crate::types::geometry::Rect;

/// Extracts the anchor rectangle from a show-request payload. Each popup
/// shape gets its own provider, chosen when the dialog is configured, so
/// the payload layout is explicit instead of duck-typed.
pub trait AnchorProvider {
    fn anchor_rect(&self, payload: &Value) -> Option<Rect>;
}

fn rect_from(value: &Value) -> Option<Rect> {
    Some(Rect::new(
        value.get("x")?.as_i64()? as i32,
        value.get("y")?.as_i64()? as i32,
        value.get("width")?.as_i64()? as i32,
        value.get("height")?.as_i64()? as i32,
    ))
}

/// Payload carries the anchor under an explicit `rect` field.
pub struct RectFieldAnchor;

impl AnchorProvider for RectFieldAnchor {
    fn anchor_rect(&self, payload: &Value) -> Option<Rect> {
        rect_from(payload.get("rect")?)
    }
}

/// Payload carries the bounds of the toolbar button that opened the popup.
pub struct ButtonBoundsAnchor;

impl AnchorProvider for ButtonBoundsAnchor {
    fn anchor_rect(&self, payload: &Value) -> Option<Rect> {
        rect_from(payload.get("button")?)
    }
}

/// Places a popup of the given size relative to `anchor` inside a window
/// content area of `content_width` x `content_height`: below the anchor
/// when it fits, above otherwise, clamped to the margins either way.
pub fn position_popup(
    anchor: Rect,
    popup_width: i32,
    popup_height: i32,
    content_width: i32,
    content_height: i32,
) -> Rect {
    let max_x = (content_width - popup_width - DIALOG_MARGIN).max(DIALOG_MARGIN);
    let x = anchor.x.clamp(DIALOG_MARGIN.min(max_x), max_x);

    let below = anchor.y + anchor.height + DIALOG_MARGIN_TOP;
    let y = if below + popup_height <= content_height {
        below
    } else {
        (anchor.y - popup_height - DIALOG_MARGIN_TOP).max(DIALOG_TOP)
    };

    Rect::new(x, y, popup_width, popup_height)
}
