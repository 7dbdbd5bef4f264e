use crate::application::ports::submission_gateway::SubmissionGateway;
use crate::application::services::offline_service::{OfflineServiceTrait, PendingItemsQuery};
use crate::application::services::sync_service::SyncService;
use crate::application::shared::mappers::submission_request_from_payload;
use crate::domain::entities::offline::{CatchReport, EnqueuedItem, PendingPayload, WaypointSubmission};
use crate::domain::value_objects::{PendingItemKind, SyncQueueId};
use crate::infrastructure::sync::{SyncWaker, WakeReason};
use crate::presentation::dto::Validate;
use crate::presentation::dto::offline::{
    ListPendingItemsRequest, PendingItemResponse, PurgeQueueEntryRequest, QueueStatusResponse,
    SubmissionResponse, SubmissionStatus, SubmitCatchRequest, SubmitWaypointRequest,
    SyncQueueEntryResponse, WakeAck,
};
use crate::shared::error::AppError;
use std::sync::Arc;

/// Foreground entry point. Submissions are queued when the store is available and
/// delivered once, directly, when it is not.
pub struct OfflineHandler {
    offline_service: Option<Arc<dyn OfflineServiceTrait>>,
    sync_service: Option<Arc<SyncService>>,
    gateway: Arc<dyn SubmissionGateway>,
    waker: Option<SyncWaker>,
}

impl OfflineHandler {
    pub fn new(
        offline_service: Arc<dyn OfflineServiceTrait>,
        sync_service: Arc<SyncService>,
        gateway: Arc<dyn SubmissionGateway>,
        waker: SyncWaker,
    ) -> Self {
        Self {
            offline_service: Some(offline_service),
            sync_service: Some(sync_service),
            gateway,
            waker: Some(waker),
        }
    }

    /// Handler for a session whose store could not be opened.
    pub fn direct_only(gateway: Arc<dyn SubmissionGateway>) -> Self {
        Self {
            offline_service: None,
            sync_service: None,
            gateway,
            waker: None,
        }
    }

    pub fn queue_enabled(&self) -> bool {
        self.offline_service.is_some()
    }

    pub async fn submit_catch(
        &self,
        request: SubmitCatchRequest,
    ) -> Result<SubmissionResponse, AppError> {
        request.validate().map_err(AppError::ValidationError)?;
        let priority = request.priority;
        let report = CatchReport::from(request);

        let Some(service) = &self.offline_service else {
            return self.submit_directly(PendingPayload::Catch(report)).await;
        };
        match service.enqueue_catch(report.clone(), priority).await {
            Ok(enqueued) => Ok(self.queued(&enqueued)),
            Err(err) if is_store_failure(&err) => {
                tracing::warn!(
                    target: "offline::handler",
                    error = %err,
                    "queueing failed, delivering directly"
                );
                self.submit_directly(PendingPayload::Catch(report)).await
            }
            Err(err) => Err(err),
        }
    }

    pub async fn submit_waypoint(
        &self,
        request: SubmitWaypointRequest,
    ) -> Result<SubmissionResponse, AppError> {
        request.validate().map_err(AppError::ValidationError)?;
        let priority = request.priority;
        let waypoint = WaypointSubmission::from(request);

        let Some(service) = &self.offline_service else {
            return self
                .submit_directly(PendingPayload::Waypoint(waypoint))
                .await;
        };
        match service.enqueue_waypoint(waypoint.clone(), priority).await {
            Ok(enqueued) => Ok(self.queued(&enqueued)),
            Err(err) if is_store_failure(&err) => {
                tracing::warn!(
                    target: "offline::handler",
                    error = %err,
                    "queueing failed, delivering directly"
                );
                self.submit_directly(PendingPayload::Waypoint(waypoint))
                    .await
            }
            Err(err) => Err(err),
        }
    }

    pub async fn sync_now(&self) -> WakeAck {
        match &self.waker {
            Some(waker) => waker.request_sync().await,
            None => WakeAck::failed("offline queue is disabled"),
        }
    }

    pub async fn queue_status(&self) -> Result<QueueStatusResponse, AppError> {
        let Some(service) = &self.offline_service else {
            return Ok(QueueStatusResponse::disabled());
        };

        let mut response = QueueStatusResponse::from_snapshot(service.queue_snapshot().await?, true);
        if let Some(sync) = &self.sync_service {
            response.metrics = Some(sync.metrics_snapshot());
            response.sync = Some(sync.get_status().await);
        }
        Ok(response)
    }

    pub async fn list_queue(&self) -> Result<Vec<SyncQueueEntryResponse>, AppError> {
        let entries = self.service()?.list_queue_entries().await?;
        Ok(entries.into_iter().map(SyncQueueEntryResponse::from).collect())
    }

    pub async fn list_pending(
        &self,
        request: ListPendingItemsRequest,
    ) -> Result<Vec<PendingItemResponse>, AppError> {
        request.validate().map_err(AppError::ValidationError)?;

        let query = PendingItemsQuery {
            kind: request
                .kind
                .as_deref()
                .map(str::parse::<PendingItemKind>)
                .transpose()
                .map_err(AppError::ValidationError)?,
            include_submitted: request.include_submitted,
            limit: request.limit,
        };

        let items = self.service()?.list_pending_items(query).await?;
        items
            .into_iter()
            .map(|item| PendingItemResponse::try_from(item).map_err(AppError::from))
            .collect()
    }

    pub async fn purge_queue_entry(&self, request: PurgeQueueEntryRequest) -> Result<(), AppError> {
        request.validate().map_err(AppError::ValidationError)?;
        let id = SyncQueueId::new(request.queue_id).map_err(AppError::ValidationError)?;
        self.service()?.purge_queue_entry(id).await
    }

    fn service(&self) -> Result<&Arc<dyn OfflineServiceTrait>, AppError> {
        self.offline_service.as_ref().ok_or_else(|| {
            AppError::StorageUnavailable("offline queue is disabled for this session".to_string())
        })
    }

    fn queued(&self, enqueued: &EnqueuedItem) -> SubmissionResponse {
        if let Some(waker) = &self.waker {
            waker.notify(WakeReason::Enqueued);
        }
        SubmissionResponse::queued(enqueued)
    }

    /// Single delivery attempt with no retry. Used only while queueing is unavailable.
    async fn submit_directly(&self, payload: PendingPayload) -> Result<SubmissionResponse, AppError> {
        payload.validate().map_err(AppError::ValidationError)?;
        let request = submission_request_from_payload(&payload);

        let receipt = self.gateway.submit(&request).await.map_err(|err| {
            tracing::warn!(
                target: "offline::handler",
                endpoint = request.endpoint_name(),
                error = %err,
                "direct delivery failed"
            );
            AppError::Delivery(err.to_string())
        })?;

        Ok(SubmissionResponse {
            status: SubmissionStatus::Submitted,
            kind: payload.kind().as_str().to_string(),
            item_id: None,
            queue_id: None,
            server_response: receipt.body,
        })
    }
}

fn is_store_failure(err: &AppError) -> bool {
    matches!(err, AppError::StorageUnavailable(_) | AppError::Database(_))
}
