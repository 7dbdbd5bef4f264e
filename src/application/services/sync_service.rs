use crate::application::ports::offline_store::OfflinePersistence;
use crate::application::ports::submission_gateway::{
    DeliveryError, DeliveryReceipt, SubmissionGateway, SubmissionRequest,
};
use crate::application::ports::sync_runner::SyncRunner;
use crate::application::shared::mappers::submission_request_from_payload;
use crate::domain::entities::offline::{
    ClaimOutcome, ClaimedEntry, SyncQueueItem, SyncResult, UndecodableEntry,
};
use crate::domain::services::retry_policy;
use crate::domain::value_objects::SyncQueueId;
use crate::infrastructure::offline::metrics::{
    DeliveryOutcomeMetadata, DeliveryOutcomeStatus, OfflineRetryMetrics,
    OfflineRetryMetricsSnapshot,
};
use crate::shared::clock::Clock;
use crate::shared::config::SyncConfig;
use crate::shared::error::AppError;
use async_trait::async_trait;
use chrono::Duration;
use futures::FutureExt;
use std::any::Any;
use std::collections::HashSet;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::RwLock;
use tokio::time::{self, MissedTickBehavior};

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatus {
    pub active_runs: u32,
    pub total_runs: u64,
    pub last_sync: Option<i64>,
    pub last_result: Option<SyncResult>,
    pub sync_errors: u32,
}

/// Knobs of the orchestrator that are not part of the retry policy itself.
#[derive(Debug, Clone, Copy)]
pub struct SyncPolicy {
    /// How long a claimed entry stays reserved for the run that claimed it.
    pub claim_lease: Duration,
    /// How often an in-flight delivery renews its lease.
    pub heartbeat_interval: std::time::Duration,
    /// Entries older than this are evicted at the start of a run. `None` keeps
    /// entries forever.
    pub max_entry_age: Option<Duration>,
}

impl Default for SyncPolicy {
    fn default() -> Self {
        Self {
            claim_lease: Duration::minutes(10),
            heartbeat_interval: std::time::Duration::from_secs(5 * 60),
            max_entry_age: None,
        }
    }
}

impl From<&SyncConfig> for SyncPolicy {
    fn from(config: &SyncConfig) -> Self {
        Self {
            claim_lease: Duration::seconds(config.claim_lease_seconds.min(i64::MAX as u64) as i64),
            heartbeat_interval: std::time::Duration::from_millis(
                config.claim_lease_seconds.saturating_mul(500),
            ),
            max_entry_age: config
                .max_entry_age_hours
                .map(|hours| Duration::hours(hours.min(i32::MAX as u64) as i64)),
        }
    }
}

enum EntryOutcome {
    Synced,
    Failed,
    Orphaned,
    Skipped,
}

pub struct SyncService {
    persistence: Arc<dyn OfflinePersistence>,
    gateway: Arc<dyn SubmissionGateway>,
    clock: Arc<dyn Clock>,
    policy: SyncPolicy,
    metrics: Arc<OfflineRetryMetrics>,
    status: Arc<RwLock<SyncStatus>>,
    in_flight: Arc<Mutex<HashSet<SyncQueueId>>>,
}

impl SyncService {
    pub fn new(
        persistence: Arc<dyn OfflinePersistence>,
        gateway: Arc<dyn SubmissionGateway>,
        clock: Arc<dyn Clock>,
        policy: SyncPolicy,
    ) -> Self {
        Self {
            persistence,
            gateway,
            clock,
            policy,
            metrics: Arc::new(OfflineRetryMetrics::new()),
            status: Arc::new(RwLock::new(SyncStatus::default())),
            in_flight: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    pub async fn get_status(&self) -> SyncStatus {
        self.status.read().await.clone()
    }

    pub fn metrics_snapshot(&self) -> OfflineRetryMetricsSnapshot {
        self.metrics.snapshot()
    }

    async fn execute(&self, trigger: &str) -> Result<SyncResult, AppError> {
        let mut result = SyncResult::default();
        let now = self.clock.now();

        if let Some(max_age) = self.policy.max_entry_age {
            result.evicted_count = self
                .persistence
                .purge_entries_created_before(now - max_age)
                .await?;
            if result.evicted_count > 0 {
                tracing::warn!(
                    target: "offline::sync",
                    evicted = result.evicted_count,
                    max_age_hours = max_age.num_hours(),
                    "evicted queue entries past their maximum age"
                );
            }
        }

        let ids = self.persistence.eligible_entry_ids(now).await?;
        tracing::debug!(
            target: "offline::sync",
            trigger,
            eligible = ids.len(),
            "sync run started"
        );

        for id in ids {
            match self.process_entry(id, trigger).await {
                Ok(EntryOutcome::Synced) => result.synced_count += 1,
                Ok(EntryOutcome::Failed) => result.failed_count += 1,
                Ok(EntryOutcome::Orphaned) => result.orphaned_count += 1,
                Ok(EntryOutcome::Skipped) => result.skipped_count += 1,
                Err(err) => {
                    tracing::error!(
                        target: "offline::sync",
                        queue_id = id.value(),
                        error = %err,
                        "failed to process queue entry"
                    );
                    result.failed_count += 1;
                }
            }
        }

        let snapshot = self.persistence.queue_snapshot(self.clock.now()).await?;
        result.pending_count = snapshot.total.min(u32::MAX as u64) as u32;
        Ok(result)
    }

    async fn process_entry(
        &self,
        id: SyncQueueId,
        trigger: &str,
    ) -> Result<EntryOutcome, AppError> {
        let Some(_in_flight) = InFlightGuard::acquire(&self.in_flight, id) else {
            return Ok(EntryOutcome::Skipped);
        };

        let now = self.clock.now();
        let outcome = self
            .persistence
            .claim_entry(id, now, now + self.policy.claim_lease)
            .await?;

        match outcome {
            ClaimOutcome::NotEligible => Ok(EntryOutcome::Skipped),
            ClaimOutcome::Orphaned { entry_id, reason } => {
                tracing::warn!(
                    target: "offline::sync",
                    queue_id = entry_id.value(),
                    reason = reason.as_str(),
                    "removed orphaned queue entry"
                );
                self.metrics.record(
                    DeliveryOutcomeStatus::Orphaned,
                    DeliveryOutcomeMetadata {
                        entry_id: Some(entry_id.value()),
                        trigger: Some(trigger.to_string()),
                        error: Some(reason.as_str().to_string()),
                        ..Default::default()
                    },
                    now,
                );
                Ok(EntryOutcome::Orphaned)
            }
            ClaimOutcome::Undecodable(undecodable) => {
                let UndecodableEntry {
                    entry,
                    claim_token,
                    error,
                } = *undecodable;
                self.record_failure(&entry, &claim_token, error, trigger)
                    .await
            }
            ClaimOutcome::Claimed(claim) => self.deliver(*claim, trigger).await,
        }
    }

    async fn deliver(&self, claim: ClaimedEntry, trigger: &str) -> Result<EntryOutcome, AppError> {
        let request = submission_request_from_payload(&claim.item.payload);
        let attempt = self.submit_holding_claim(&claim, &request).await;

        let receipt = match attempt {
            Ok(receipt) => receipt,
            Err(err) => {
                return self
                    .record_failure(&claim.entry, &claim.claim_token, err.to_string(), trigger)
                    .await;
            }
        };

        let now = self.clock.now();
        let held = match self.persistence.complete_entry(&claim, now).await {
            Ok(held) => held,
            Err(err) => {
                // The server has the item; the entry stays and will be re-sent
                // once the lease runs out.
                tracing::error!(
                    target: "offline::sync",
                    queue_id = claim.entry.id.value(),
                    error = %err,
                    "delivered but failed to record the submission"
                );
                return Err(err);
            }
        };

        if !held {
            tracing::warn!(
                target: "offline::sync",
                queue_id = claim.entry.id.value(),
                kind = claim.entry.item_kind.as_str(),
                "delivered after the claim was lost"
            );
            return Ok(EntryOutcome::Skipped);
        }

        tracing::info!(
            target: "offline::sync",
            queue_id = claim.entry.id.value(),
            kind = claim.entry.item_kind.as_str(),
            status = receipt.status,
            "pending item synced"
        );
        self.metrics.record(
            DeliveryOutcomeStatus::Success,
            DeliveryOutcomeMetadata {
                entry_id: Some(claim.entry.id.value()),
                item_kind: Some(claim.entry.item_kind.as_str().to_string()),
                trigger: Some(trigger.to_string()),
                retry_count: Some(claim.entry.retry_count),
                ..Default::default()
            },
            now,
        );
        Ok(EntryOutcome::Synced)
    }

    /// Runs the delivery call, renewing the claim lease on every heartbeat tick.
    async fn submit_holding_claim(
        &self,
        claim: &ClaimedEntry,
        request: &SubmissionRequest,
    ) -> Result<DeliveryReceipt, DeliveryError> {
        let period = self
            .policy
            .heartbeat_interval
            .max(std::time::Duration::from_millis(1));
        let mut heartbeat = time::interval_at(time::Instant::now() + period, period);
        heartbeat.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let submit = AssertUnwindSafe(self.gateway.submit(request)).catch_unwind();
        tokio::pin!(submit);

        loop {
            tokio::select! {
                outcome = &mut submit => {
                    return outcome
                        .unwrap_or_else(|panic| Err(DeliveryError::Panicked(panic_message(panic))));
                }
                _ = heartbeat.tick() => self.renew_claim(claim).await,
            }
        }
    }

    async fn renew_claim(&self, claim: &ClaimedEntry) {
        let now = self.clock.now();
        let renewed = self
            .persistence
            .extend_claim(
                claim.entry.id,
                &claim.claim_token,
                now + self.policy.claim_lease,
                now,
            )
            .await;
        match renewed {
            Ok(true) => tracing::trace!(
                target: "offline::sync",
                queue_id = claim.entry.id.value(),
                "claim lease renewed"
            ),
            Ok(false) => tracing::warn!(
                target: "offline::sync",
                queue_id = claim.entry.id.value(),
                "claim lost while delivery is in flight"
            ),
            Err(err) => tracing::warn!(
                target: "offline::sync",
                queue_id = claim.entry.id.value(),
                error = %err,
                "failed to renew claim lease"
            ),
        }
    }

    async fn record_failure(
        &self,
        entry: &SyncQueueItem,
        claim_token: &str,
        message: String,
        trigger: &str,
    ) -> Result<EntryOutcome, AppError> {
        let now = self.clock.now();
        let retry_count = entry.retry_count.saturating_add(1);
        let next_retry_at = retry_policy::next_retry_at(retry_count, now);

        let recorded = self
            .persistence
            .fail_entry(entry, claim_token, &message, next_retry_at, now)
            .await?;
        if !recorded {
            tracing::debug!(
                target: "offline::sync",
                queue_id = entry.id.value(),
                "claim lost before failure could be recorded"
            );
            return Ok(EntryOutcome::Skipped);
        }

        tracing::warn!(
            target: "offline::sync",
            queue_id = entry.id.value(),
            kind = entry.item_kind.as_str(),
            retry_count,
            next_retry_at = %next_retry_at,
            error = %message,
            "delivery failed, will retry"
        );
        self.metrics.record(
            DeliveryOutcomeStatus::Failure,
            DeliveryOutcomeMetadata {
                entry_id: Some(entry.id.value()),
                item_kind: Some(entry.item_kind.as_str().to_string()),
                trigger: Some(trigger.to_string()),
                retry_count: Some(retry_count),
                backoff_ms: Some((next_retry_at - now).num_milliseconds()),
                error: Some(message),
            },
            now,
        );
        Ok(EntryOutcome::Failed)
    }
}

/// Marks an entry as being worked on by this process until dropped.
struct InFlightGuard {
    entries: Arc<Mutex<HashSet<SyncQueueId>>>,
    id: SyncQueueId,
}

impl InFlightGuard {
    fn acquire(entries: &Arc<Mutex<HashSet<SyncQueueId>>>, id: SyncQueueId) -> Option<Self> {
        let inserted = entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id);
        inserted.then(|| Self {
            entries: entries.clone(),
            id,
        })
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.id);
    }
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[async_trait]
impl SyncRunner for SyncService {
    async fn run_once(&self, trigger: &str) -> Result<SyncResult, AppError> {
        {
            let mut status = self.status.write().await;
            status.active_runs += 1;
        }

        let result = self.execute(trigger).await;

        let mut status = self.status.write().await;
        status.active_runs = status.active_runs.saturating_sub(1);
        status.total_runs += 1;
        status.last_sync = Some(self.clock.now().timestamp_millis());
        match &result {
            Ok(summary) => {
                tracing::info!(
                    target: "offline::sync",
                    trigger,
                    synced = summary.synced_count,
                    failed = summary.failed_count,
                    orphaned = summary.orphaned_count,
                    skipped = summary.skipped_count,
                    remaining = summary.pending_count,
                    "sync run completed"
                );
                status.last_result = Some(summary.clone());
            }
            Err(err) => {
                tracing::error!(target: "offline::sync", trigger, error = %err, "sync run aborted");
                status.sync_errors += 1;
            }
        }

        result
    }
}

impl Clone for SyncService {
    fn clone(&self) -> Self {
        Self {
            persistence: self.persistence.clone(),
            gateway: self.gateway.clone(),
            clock: self.clock.clone(),
            policy: self.policy,
            metrics: self.metrics.clone(),
            status: self.status.clone(),
            in_flight: self.in_flight.clone(),
        }
    }
}
