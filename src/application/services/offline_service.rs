use crate::application::ports::offline_store::OfflinePersistence;
use crate::domain::entities::offline::{
    CatchReport, EnqueuedItem, PendingItem, PendingItemDraft, PendingItemFilter, PendingPayload,
    SyncQueueItem, SyncQueueSnapshot, WaypointSubmission,
};
use crate::domain::value_objects::{PendingItemKind, SyncQueueId};
use crate::shared::clock::{Clock, SystemClock};
use crate::shared::error::AppError;
use async_trait::async_trait;
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct PendingItemsQuery {
    pub kind: Option<PendingItemKind>,
    pub include_submitted: Option<bool>,
    pub limit: Option<u32>,
}

#[async_trait]
pub trait OfflineServiceTrait: Send + Sync {
    async fn enqueue_catch(
        &self,
        report: CatchReport,
        priority: Option<u8>,
    ) -> Result<EnqueuedItem, AppError>;
    async fn enqueue_waypoint(
        &self,
        waypoint: WaypointSubmission,
        priority: Option<u8>,
    ) -> Result<EnqueuedItem, AppError>;
    async fn list_queue_entries(&self) -> Result<Vec<SyncQueueItem>, AppError>;
    async fn list_pending_items(
        &self,
        query: PendingItemsQuery,
    ) -> Result<Vec<PendingItem>, AppError>;
    async fn queue_snapshot(&self) -> Result<SyncQueueSnapshot, AppError>;
    async fn purge_queue_entry(&self, id: SyncQueueId) -> Result<(), AppError>;
}

pub struct OfflineService {
    persistence: Arc<dyn OfflinePersistence>,
    clock: Arc<dyn Clock>,
}

impl OfflineService {
    pub fn new(persistence: Arc<dyn OfflinePersistence>) -> Self {
        Self::with_clock(persistence, Arc::new(SystemClock))
    }

    pub fn with_clock(persistence: Arc<dyn OfflinePersistence>, clock: Arc<dyn Clock>) -> Self {
        Self { persistence, clock }
    }

    async fn enqueue_payload(
        &self,
        payload: PendingPayload,
        priority: Option<u8>,
    ) -> Result<EnqueuedItem, AppError> {
        payload.validate().map_err(AppError::ValidationError)?;
        let enqueued = self
            .persistence
            .enqueue(PendingItemDraft::new(payload, priority), self.clock.now())
            .await?;

        tracing::info!(
            target: "offline::store",
            kind = enqueued.kind.as_str(),
            item_id = enqueued.item_id.value(),
            queue_id = enqueued.queue_id.value(),
            "saved, will sync"
        );
        Ok(enqueued)
    }

    fn filter_from_query(query: &PendingItemsQuery) -> PendingItemFilter {
        PendingItemFilter::new(
            query.kind,
            query.include_submitted.unwrap_or(false),
            query.limit,
        )
    }
}

#[async_trait]
impl OfflineServiceTrait for OfflineService {
    async fn enqueue_catch(
        &self,
        report: CatchReport,
        priority: Option<u8>,
    ) -> Result<EnqueuedItem, AppError> {
        self.enqueue_payload(PendingPayload::Catch(report), priority)
            .await
    }

    async fn enqueue_waypoint(
        &self,
        waypoint: WaypointSubmission,
        priority: Option<u8>,
    ) -> Result<EnqueuedItem, AppError> {
        self.enqueue_payload(PendingPayload::Waypoint(waypoint), priority)
            .await
    }

    async fn list_queue_entries(&self) -> Result<Vec<SyncQueueItem>, AppError> {
        self.persistence.list_entries().await
    }

    async fn list_pending_items(
        &self,
        query: PendingItemsQuery,
    ) -> Result<Vec<PendingItem>, AppError> {
        let filter = Self::filter_from_query(&query);
        self.persistence.list_pending_items(filter).await
    }

    async fn queue_snapshot(&self) -> Result<SyncQueueSnapshot, AppError> {
        self.persistence.queue_snapshot(self.clock.now()).await
    }

    async fn purge_queue_entry(&self, id: SyncQueueId) -> Result<(), AppError> {
        if self.persistence.purge_entry(id).await? {
            tracing::warn!(
                target: "offline::store",
                queue_id = id.value(),
                "queue entry purged"
            );
            Ok(())
        } else {
            Err(AppError::NotFound(format!("Sync queue entry {id} not found")))
        }
    }
}
