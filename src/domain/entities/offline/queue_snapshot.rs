use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SyncQueueSnapshot {
    pub total: u64,
    pub pending: u64,
    pub failed: u64,
    pub eligible: u64,
    pub max_retry_count: u32,
    pub oldest_created_at: Option<DateTime<Utc>>,
}
