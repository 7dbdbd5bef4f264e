use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SyncResult {
    pub synced_count: u32,
    pub failed_count: u32,
    pub orphaned_count: u32,
    pub skipped_count: u32,
    pub evicted_count: u32,
    pub pending_count: u32,
}

impl SyncResult {
    pub fn attempted(&self) -> u32 {
        self.synced_count + self.failed_count
    }
}
