use crate::domain::value_objects::{PendingItemId, PendingItemKind, SyncQueueId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Rows written by one enqueue transaction.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct EnqueuedItem {
    pub kind: PendingItemKind,
    pub item_id: PendingItemId,
    pub queue_id: SyncQueueId,
    pub created_at: DateTime<Utc>,
}
