use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// One tracked download. Created when the session reports a download start,
/// mutated on progress events, immutable once `completed` is set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadRecord {
    pub id: String,
    pub file_name: String,
    pub received_bytes: u64,
    pub total_bytes: u64,
    pub save_path: PathBuf,
    pub completed: bool,
}
