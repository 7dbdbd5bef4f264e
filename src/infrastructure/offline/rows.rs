use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PendingItemRow {
    pub id: i64,
    pub payload: String,
    pub submitted: bool,
    pub submitted_at: Option<i64>,
    pub created_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SyncQueueItemRow {
    pub id: i64,
    pub item_kind: String,
    pub item_id: i64,
    pub status: String,
    pub priority: i64,
    pub retry_count: i64,
    pub last_error: Option<String>,
    pub next_retry_at: Option<i64>,
    pub claim_token: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, FromRow)]
pub struct QueueSnapshotRow {
    pub total: i64,
    pub pending: i64,
    pub failed: i64,
    pub eligible: i64,
    pub max_retry_count: i64,
    pub oldest_created_at: Option<i64>,
}
