pub mod catch_report;
pub mod claim;
pub mod enqueued_item;
pub mod pending_item;
pub mod queue_snapshot;
pub mod sync_queue_item;
pub mod sync_result;
pub mod waypoint;

pub use catch_report::CatchReport;
pub use claim::{ClaimOutcome, ClaimedEntry, OrphanReason, UndecodableEntry};
pub use enqueued_item::EnqueuedItem;
pub use pending_item::{PendingItem, PendingItemDraft, PendingItemFilter, PendingPayload};
pub use queue_snapshot::SyncQueueSnapshot;
pub use sync_queue_item::SyncQueueItem;
pub use sync_result::SyncResult;
pub use waypoint::{Coordinates, WaypointSubmission};
