pub mod offline_service;
pub mod sync_service;

pub use offline_service::{OfflineService, OfflineServiceTrait, PendingItemsQuery};
pub use sync_service::{SyncPolicy, SyncService, SyncStatus};
