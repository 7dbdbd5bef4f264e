use crate::domain::entities::offline::SyncResult;
use crate::shared::error::AppError;
use async_trait::async_trait;

/// One pass over the currently eligible queue entries.
#[async_trait]
pub trait SyncRunner: Send + Sync {
    async fn run_once(&self, trigger: &str) -> Result<SyncResult, AppError>;
}
