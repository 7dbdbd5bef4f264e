use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryOutcomeStatus {
    Success,
    Failure,
    Orphaned,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OfflineRetryMetricsSnapshot {
    pub total_success: u64,
    pub total_failure: u64,
    pub total_orphaned: u64,
    pub consecutive_failure: u64,
    pub last_success_ms: Option<i64>,
    pub last_failure_ms: Option<i64>,
    pub last_outcome: Option<DeliveryOutcomeStatus>,
    pub last_entry_id: Option<i64>,
    pub last_item_kind: Option<String>,
    pub last_trigger: Option<String>,
    pub last_retry_count: Option<u32>,
    pub last_backoff_ms: Option<i64>,
    pub last_error: Option<String>,
}

/// Per-attempt details recorded alongside the counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliveryOutcomeMetadata {
    pub entry_id: Option<i64>,
    pub item_kind: Option<String>,
    pub trigger: Option<String>,
    pub retry_count: Option<u32>,
    pub backoff_ms: Option<i64>,
    pub error: Option<String>,
}

#[derive(Default, Clone)]
struct LastOutcome {
    status: Option<DeliveryOutcomeStatus>,
    metadata: DeliveryOutcomeMetadata,
}

/// Delivery counters owned by one orchestrator.
#[derive(Default)]
pub struct OfflineRetryMetrics {
    success: AtomicU64,
    failure: AtomicU64,
    orphaned: AtomicU64,
    consecutive_failure: AtomicU64,
    last_success_ms: Mutex<Option<i64>>,
    last_failure_ms: Mutex<Option<i64>>,
    last: Mutex<LastOutcome>,
}

impl OfflineRetryMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(
        &self,
        status: DeliveryOutcomeStatus,
        metadata: DeliveryOutcomeMetadata,
        at: DateTime<Utc>,
    ) {
        let at_ms = at.timestamp_millis();
        match status {
            DeliveryOutcomeStatus::Success => {
                self.success.fetch_add(1, Ordering::Relaxed);
                self.consecutive_failure.store(0, Ordering::Relaxed);
                if let Ok(mut guard) = self.last_success_ms.lock() {
                    *guard = Some(at_ms);
                }
            }
            DeliveryOutcomeStatus::Failure => {
                self.failure.fetch_add(1, Ordering::Relaxed);
                self.consecutive_failure.fetch_add(1, Ordering::Relaxed);
                if let Ok(mut guard) = self.last_failure_ms.lock() {
                    *guard = Some(at_ms);
                }
            }
            DeliveryOutcomeStatus::Orphaned => {
                self.orphaned.fetch_add(1, Ordering::Relaxed);
            }
        }

        if let Ok(mut guard) = self.last.lock() {
            guard.status = Some(status);
            guard.metadata = metadata;
        }
    }

    pub fn snapshot(&self) -> OfflineRetryMetricsSnapshot {
        let last = self
            .last
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default();
        let last_success_ms = self.last_success_ms.lock().map(|g| *g).unwrap_or(None);
        let last_failure_ms = self.last_failure_ms.lock().map(|g| *g).unwrap_or(None);

        OfflineRetryMetricsSnapshot {
            total_success: self.success.load(Ordering::Relaxed),
            total_failure: self.failure.load(Ordering::Relaxed),
            total_orphaned: self.orphaned.load(Ordering::Relaxed),
            consecutive_failure: self.consecutive_failure.load(Ordering::Relaxed),
            last_success_ms,
            last_failure_ms,
            last_outcome: last.status,
            last_entry_id: last.metadata.entry_id,
            last_item_kind: last.metadata.item_kind,
            last_trigger: last.metadata.trigger,
            last_retry_count: last.metadata.retry_count,
            last_backoff_ms: last.metadata.backoff_ms,
            last_error: last.metadata.error,
        }
    }
}
