use crate::domain::value_objects::{PendingItemId, PendingItemKind, SyncQueueId, SyncQueueStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SyncQueueItem {
    pub id: SyncQueueId,
    pub item_kind: PendingItemKind,
    pub item_id: PendingItemId,
    pub status: SyncQueueStatus,
    pub priority: u8,
    pub retry_count: u32,
    pub last_error: Option<String>,
    pub next_retry_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SyncQueueItem {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: SyncQueueId,
        item_kind: PendingItemKind,
        item_id: PendingItemId,
        status: SyncQueueStatus,
        priority: u8,
        retry_count: u32,
        last_error: Option<String>,
        next_retry_at: Option<DateTime<Utc>>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            item_kind,
            item_id,
            status,
            priority,
            retry_count,
            last_error,
            next_retry_at,
            created_at,
            updated_at,
        }
    }

    /// Both statuses are retryable; only the retry time gates an attempt.
    pub fn is_eligible(&self, now: DateTime<Utc>) -> bool {
        matches!(
            self.status,
            SyncQueueStatus::Pending | SyncQueueStatus::Failed
        ) && self.next_retry_at.is_none_or(|at| at <= now)
    }
}
