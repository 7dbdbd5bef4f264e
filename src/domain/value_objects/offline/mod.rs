pub mod item_kind;
pub mod pending_item_id;
pub mod sync_queue_id;
pub mod sync_queue_status;

pub use item_kind::PendingItemKind;
pub use pending_item_id::PendingItemId;
pub use sync_queue_id::SyncQueueId;
pub use sync_queue_status::SyncQueueStatus;
