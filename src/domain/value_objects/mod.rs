pub mod offline;

pub use offline::{PendingItemId, PendingItemKind, SyncQueueId, SyncQueueStatus};
