use super::rows::{PendingItemRow, QueueSnapshotRow, SyncQueueItemRow};
use crate::domain::entities::offline::{
    PendingItem, PendingPayload, SyncQueueItem, SyncQueueSnapshot,
};
use crate::domain::value_objects::{PendingItemId, PendingItemKind, SyncQueueId, SyncQueueStatus};
use crate::shared::error::AppError;
use chrono::{DateTime, Utc};
use std::convert::TryInto;

/// Payload column content: the kind-specific struct without the enum tag, since the
/// table already says which kind it is.
pub fn payload_to_json(payload: &PendingPayload) -> Result<String, AppError> {
    let json = match payload {
        PendingPayload::Catch(report) => serde_json::to_string(report),
        PendingPayload::Waypoint(waypoint) => serde_json::to_string(waypoint),
    };
    json.map_err(|err| AppError::SerializationError(err.to_string()))
}

pub fn payload_from_json(kind: PendingItemKind, json: &str) -> Result<PendingPayload, AppError> {
    let payload = match kind {
        PendingItemKind::Catch => serde_json::from_str(json).map(PendingPayload::Catch),
        PendingItemKind::Waypoint => serde_json::from_str(json).map(PendingPayload::Waypoint),
    };
    payload.map_err(|err| AppError::DeserializationError(err.to_string()))
}

pub fn domain_pending_item_from_row(
    kind: PendingItemKind,
    row: PendingItemRow,
) -> Result<PendingItem, AppError> {
    let id = PendingItemId::new(row.id).map_err(AppError::ValidationError)?;
    let payload = payload_from_json(kind, &row.payload)?;
    Ok(PendingItem::new(
        id,
        payload,
        row.submitted,
        row.submitted_at.map(timestamp_to_datetime),
        timestamp_to_datetime(row.created_at),
    ))
}

pub fn domain_queue_item_from_row(row: SyncQueueItemRow) -> Result<SyncQueueItem, AppError> {
    let id = SyncQueueId::new(row.id).map_err(AppError::ValidationError)?;
    let item_kind = row
        .item_kind
        .parse::<PendingItemKind>()
        .map_err(AppError::ValidationError)?;
    let item_id = PendingItemId::new(row.item_id).map_err(AppError::ValidationError)?;
    let status = SyncQueueStatus::parse(&row.status).map_err(AppError::ValidationError)?;

    Ok(SyncQueueItem::new(
        id,
        item_kind,
        item_id,
        status,
        row.priority.clamp(0, u8::MAX as i64) as u8,
        try_i64_to_u32(row.retry_count, "retry_count")?,
        row.last_error,
        row.next_retry_at.map(timestamp_to_datetime),
        timestamp_to_datetime(row.created_at),
        timestamp_to_datetime(row.updated_at),
    ))
}

pub fn domain_snapshot_from_row(row: QueueSnapshotRow) -> Result<SyncQueueSnapshot, AppError> {
    Ok(SyncQueueSnapshot {
        total: try_i64_to_u64(row.total, "total")?,
        pending: try_i64_to_u64(row.pending, "pending")?,
        failed: try_i64_to_u64(row.failed, "failed")?,
        eligible: try_i64_to_u64(row.eligible, "eligible")?,
        max_retry_count: try_i64_to_u32(row.max_retry_count, "max_retry_count")?,
        oldest_created_at: row.oldest_created_at.map(timestamp_to_datetime),
    })
}

pub fn datetime_to_timestamp(value: DateTime<Utc>) -> i64 {
    value.timestamp_millis()
}

pub fn timestamp_to_datetime(ts: i64) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp_millis(ts).unwrap_or(DateTime::<Utc>::MIN_UTC)
}

fn try_i64_to_u32(value: i64, label: &str) -> Result<u32, AppError> {
    value
        .try_into()
        .map_err(|_| AppError::ValidationError(format!("{label} is out of range")))
}

fn try_i64_to_u64(value: i64, label: &str) -> Result<u64, AppError> {
    value
        .try_into()
        .map_err(|_| AppError::ValidationError(format!("{label} cannot be negative")))
}
