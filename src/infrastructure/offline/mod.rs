mod mappers;
pub mod metrics;
mod rows;
pub mod sqlite_store;

pub use metrics::{
    DeliveryOutcomeMetadata, DeliveryOutcomeStatus, OfflineRetryMetrics,
    OfflineRetryMetricsSnapshot,
};
pub use sqlite_store::SqliteOfflinePersistence;
