use serde::{Deserialize, Serialize};

/// Persisted outcome of a permission prompt: granted is stored as `1`,
/// denied as `2`. Decisions have no expiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PermissionDecision {
    Granted = 1,
    Denied = 2,
}

impl PermissionDecision {
    pub fn granted(self) -> bool {
        matches!(self, PermissionDecision::Granted)
    }

    /// Maps a stored value back to a decision; unknown values are treated
    /// as no decision at all.
    pub fn from_i64(value: i64) -> Option<Self> {
        match value {
            1 => Some(PermissionDecision::Granted),
            2 => Some(PermissionDecision::Denied),
            _ => None,
        }
    }

    pub fn as_i64(self) -> i64 {
        match self {
            PermissionDecision::Granted => 1,
            PermissionDecision::Denied => 2,
        }
    }
}

/// One row of the permission-decision store, keyed by `(url, permission)`
/// exact match. `url` holds a bare hostname.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermissionRecord {
    pub url: String,
    pub permission: String,
    pub decision: PermissionDecision,
    pub media_types: String,
}
