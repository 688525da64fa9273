//! Control-channel addressing and message decoding.
//!
//! Chrome UI surfaces talk to the coordinating process over named channels
//! of the form `"{action}-{owner}"`, where the owner suffix is the id of
//! the window the action targets. App-global actions carry no owner.

use serde_json::Value;

use crate::host::WindowId;
use crate::view_manager::ZoomDirection;

/// A parsed channel name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channel {
    pub action: String,
    pub owner: Option<WindowId>,
}

impl Channel {
    /// Renders the channel name for an action owned by one window.
    pub fn format(action: &str, owner: WindowId) -> String {
        format!("{}-{}", action, owner)
    }

    /// Splits a raw channel name into action and owner. The owner is the
    /// trailing `-<number>` segment; actions themselves may contain dashes.
    pub fn parse(raw: &str) -> Self {
        if let Some((action, owner)) = raw.rsplit_once('-') {
            if let Ok(id) = owner.parse::<WindowId>() {
                return Self {
                    action: action.to_string(),
                    owner: Some(id),
                };
            }
        }
        Self {
            action: raw.to_string(),
            owner: None,
        }
    }
}

/// A decoded control message. Unknown channels decode to `None` and are
/// dropped with a debug log by the dispatcher.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlMessage {
    WindowMinimize,
    WindowToggleMaximize,
    WindowClose,
    WindowFocus,

    ViewCreate { url: String, active: bool },
    ViewsCreate { urls: Vec<String> },
    ViewSelect { id: u32, focus: bool },
    ViewDestroy { id: u32 },
    ViewMute { id: u32 },
    ViewUnmute { id: u32 },

    ChangeZoom(ZoomDirection),
    ResetZoom,

    DialogShow { name: String, payload: Value },
    DialogHide { name: String },

    CreateWindow { incognito: bool },
    ClearBrowsingData,
    UninstallExtension { id: String },

    GetDownloads,
    GetExtensions,
    GetPermissions,
    GetDialogVisibility { name: String },
    GetZoom,
    GetTheme,
    IsIncognito,
}

fn str_field(payload: &Value, key: &str) -> Option<String> {
    payload.get(key)?.as_str().map(|s| s.to_string())
}

fn u32_field(payload: &Value, key: &str) -> Option<u32> {
    payload.get(key)?.as_u64().map(|v| v as u32)
}

fn bool_field(payload: &Value, key: &str, default: bool) -> bool {
    payload.get(key).and_then(Value::as_bool).unwrap_or(default)
}

impl ControlMessage {
    pub fn decode(channel: &Channel, payload: &Value) -> Option<Self> {
        let msg = match channel.action.as_str() {
            "window-minimize" => ControlMessage::WindowMinimize,
            "window-toggle-maximize" => ControlMessage::WindowToggleMaximize,
            "window-close" => ControlMessage::WindowClose,
            "window-focus" => ControlMessage::WindowFocus,

            "view-create" => ControlMessage::ViewCreate {
                url: str_field(payload, "url")?,
                active: bool_field(payload, "active", true),
            },
            "views-create" => {
                let urls = payload
                    .get("urls")?
                    .as_array()?
                    .iter()
                    .filter_map(|v| v.as_str().map(|s| s.to_string()))
                    .collect();
                ControlMessage::ViewsCreate { urls }
            }
            "view-select" => ControlMessage::ViewSelect {
                id: u32_field(payload, "id")?,
                focus: bool_field(payload, "focus", true),
            },
            "view-destroy" => ControlMessage::ViewDestroy {
                id: u32_field(payload, "id")?,
            },
            "mute-view" => ControlMessage::ViewMute {
                id: u32_field(payload, "id")?,
            },
            "unmute-view" => ControlMessage::ViewUnmute {
                id: u32_field(payload, "id")?,
            },

            "change-zoom" => match payload.get("zoomDirection").and_then(Value::as_str) {
                Some("in") => ControlMessage::ChangeZoom(ZoomDirection::In),
                Some("out") => ControlMessage::ChangeZoom(ZoomDirection::Out),
                _ => return None,
            },
            "reset-zoom" => ControlMessage::ResetZoom,

            "dialog-show" => ControlMessage::DialogShow {
                name: str_field(payload, "name")?,
                payload: payload.clone(),
            },
            "dialog-hide" => ControlMessage::DialogHide {
                name: str_field(payload, "name")?,
            },

            "create-window" => ControlMessage::CreateWindow {
                incognito: bool_field(payload, "incognito", false),
            },
            "clear-browsing-data" => ControlMessage::ClearBrowsingData,
            "uninstall-extension" => ControlMessage::UninstallExtension {
                id: str_field(payload, "id")?,
            },

            "get-downloads" => ControlMessage::GetDownloads,
            "get-extensions" => ControlMessage::GetExtensions,
            "get-permissions" => ControlMessage::GetPermissions,
            "get-dialog-visibility" => ControlMessage::GetDialogVisibility {
                name: str_field(payload, "name")?,
            },
            "get-zoom" => ControlMessage::GetZoom,
            "get-theme" => ControlMessage::GetTheme,
            "is-incognito" => ControlMessage::IsIncognito,

            _ => return None,
        };
        Some(msg)
    }
}
