use crate::application::services::sync_service::SyncStatus;
use crate::domain::entities::offline::{
    CatchReport, Coordinates, EnqueuedItem, PendingItem, PendingPayload, SyncQueueItem,
    SyncQueueSnapshot, WaypointSubmission,
};
use crate::infrastructure::offline::metrics::OfflineRetryMetricsSnapshot;
use crate::presentation::dto::Validate;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use crate::infrastructure::sync::WakeAck;

const MAX_PHOTOS: usize = 10;
const MAX_PRIORITY: u8 = 10;

fn validate_priority(priority: Option<u8>) -> Result<(), String> {
    if let Some(priority) = priority
        && priority > MAX_PRIORITY
    {
        return Err(format!("Priority must be between 0 and {MAX_PRIORITY}"));
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitCatchRequest {
    pub trip_id: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub no_catch: bool,
    pub imei: String,
    pub fish_group: Option<String>,
    pub quantity: Option<u32>,
    pub average_size: Option<String>,
    pub fish_length: Option<f64>,
    #[serde(default)]
    pub photos: Vec<String>,
    pub priority: Option<u8>,
}

impl Validate for SubmitCatchRequest {
    fn validate(&self) -> Result<(), String> {
        if self.trip_id.trim().is_empty() {
            return Err("Trip ID is required".to_string());
        }
        if self.imei.trim().is_empty() {
            return Err("IMEI is required".to_string());
        }
        if self.photos.len() > MAX_PHOTOS {
            return Err(format!("At most {MAX_PHOTOS} photos can be attached"));
        }
        validate_priority(self.priority)
    }
}

impl From<SubmitCatchRequest> for CatchReport {
    fn from(request: SubmitCatchRequest) -> Self {
        CatchReport {
            trip_id: request.trip_id.trim().to_string(),
            date: request.date,
            no_catch: request.no_catch,
            imei: request.imei.trim().to_string(),
            fish_group: request.fish_group,
            quantity: request.quantity,
            average_size: request.average_size,
            fish_length: request.fish_length,
            photos: request.photos,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitWaypointRequest {
    pub user_id: String,
    pub imei: Option<String>,
    pub username: Option<String>,
    pub name: String,
    pub description: Option<String>,
    pub coordinates: Coordinates,
    #[serde(rename = "type")]
    pub waypoint_type: String,
    pub metadata: Option<Value>,
    pub priority: Option<u8>,
}

impl Validate for SubmitWaypointRequest {
    fn validate(&self) -> Result<(), String> {
        if self.user_id.trim().is_empty() {
            return Err("User ID is required".to_string());
        }
        if self.name.trim().is_empty() {
            return Err("Waypoint name is required".to_string());
        }
        if self.name.len() > 200 {
            return Err("Waypoint name is too long (max 200 characters)".to_string());
        }
        validate_priority(self.priority)
    }
}

impl From<SubmitWaypointRequest> for WaypointSubmission {
    fn from(request: SubmitWaypointRequest) -> Self {
        WaypointSubmission {
            user_id: request.user_id.trim().to_string(),
            imei: request.imei,
            username: request.username,
            name: request.name,
            description: request.description,
            coordinates: request.coordinates,
            waypoint_type: request.waypoint_type,
            metadata: request
                .metadata
                .unwrap_or_else(|| Value::Object(Default::default())),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    /// Saved on the device; delivery happens in the background.
    Queued,
    /// Delivered directly because the queue is unavailable.
    Submitted,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionResponse {
    pub status: SubmissionStatus,
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub queue_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_response: Option<Value>,
}

impl SubmissionResponse {
    pub fn queued(enqueued: &EnqueuedItem) -> Self {
        Self {
            status: SubmissionStatus::Queued,
            kind: enqueued.kind.as_str().to_string(),
            item_id: Some(enqueued.item_id.value()),
            queue_id: Some(enqueued.queue_id.value()),
            server_response: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueStatusResponse {
    pub queue_enabled: bool,
    pub total: u64,
    pub pending: u64,
    pub failed: u64,
    pub eligible: u64,
    pub max_retry_count: u32,
    pub oldest_created_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<OfflineRetryMetricsSnapshot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sync: Option<SyncStatus>,
}

impl QueueStatusResponse {
    pub fn disabled() -> Self {
        Self::from_snapshot(SyncQueueSnapshot::default(), false)
    }

    pub fn from_snapshot(snapshot: SyncQueueSnapshot, queue_enabled: bool) -> Self {
        Self {
            queue_enabled,
            total: snapshot.total,
            pending: snapshot.pending,
            failed: snapshot.failed,
            eligible: snapshot.eligible,
            max_retry_count: snapshot.max_retry_count,
            oldest_created_at: snapshot.oldest_created_at.map(|at| at.timestamp_millis()),
            metrics: None,
            sync: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncQueueEntryResponse {
    pub id: i64,
    pub item_kind: String,
    pub item_id: i64,
    pub status: String,
    pub priority: u8,
    pub retry_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    pub next_retry_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl From<SyncQueueItem> for SyncQueueEntryResponse {
    fn from(item: SyncQueueItem) -> Self {
        Self {
            id: item.id.value(),
            item_kind: item.item_kind.as_str().to_string(),
            item_id: item.item_id.value(),
            status: item.status.as_str().to_string(),
            priority: item.priority,
            retry_count: item.retry_count,
            last_error: item.last_error,
            next_retry_at: item.next_retry_at.map(|at| at.timestamp_millis()),
            created_at: item.created_at.timestamp_millis(),
            updated_at: item.updated_at.timestamp_millis(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingItemResponse {
    pub id: i64,
    pub kind: String,
    pub payload: Value,
    pub submitted: bool,
    pub submitted_at: Option<i64>,
    pub created_at: i64,
}

impl TryFrom<PendingItem> for PendingItemResponse {
    type Error = serde_json::Error;

    fn try_from(item: PendingItem) -> Result<Self, Self::Error> {
        let kind = item.kind().as_str().to_string();
        let payload = match &item.payload {
            PendingPayload::Catch(report) => {
                serde_json::to_value(report)?
            }
            PendingPayload::Waypoint(waypoint) => {
                serde_json::to_value(waypoint)?
            }
        };
        Ok(Self {
            id: item.id.value(),
            kind,
            payload,
            submitted: item.submitted,
            submitted_at: item.submitted_at.map(|at| at.timestamp_millis()),
            created_at: item.created_at.timestamp_millis(),
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListPendingItemsRequest {
    pub kind: Option<String>,
    pub include_submitted: Option<bool>,
    pub limit: Option<u32>,
}

impl Validate for ListPendingItemsRequest {
    fn validate(&self) -> Result<(), String> {
        if let Some(kind) = self.kind.as_deref()
            && !matches!(kind, "catch" | "waypoint")
        {
            return Err(format!("Unknown item kind: {kind}"));
        }
        if let Some(limit) = self.limit
            && !(1..=1000).contains(&limit)
        {
            return Err("Limit must be between 1 and 1000".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurgeQueueEntryRequest {
    pub queue_id: i64,
}

impl Validate for PurgeQueueEntryRequest {
    fn validate(&self) -> Result<(), String> {
        if self.queue_id <= 0 {
            return Err("Queue ID must be positive".to_string());
        }
        Ok(())
    }
}
