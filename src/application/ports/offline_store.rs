use crate::domain::entities::offline::{
    ClaimOutcome, ClaimedEntry, EnqueuedItem, PendingItem, PendingItemDraft, PendingItemFilter,
    SyncQueueItem, SyncQueueSnapshot,
};
use crate::domain::value_objects::{PendingItemId, PendingItemKind, SyncQueueId};
use crate::shared::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Durable, transactional storage of pending items and their queue entries.
///
/// Every method is its own transaction. Callers never hold one open across a
/// delivery call.
#[async_trait]
pub trait OfflinePersistence: Send + Sync {
    /// Writes the pending item and exactly one queue entry, or neither.
    async fn enqueue(
        &self,
        draft: PendingItemDraft,
        now: DateTime<Utc>,
    ) -> Result<EnqueuedItem, AppError>;

    /// Ids of entries eligible at `now`, ordered by priority then id.
    async fn eligible_entry_ids(&self, now: DateTime<Utc>) -> Result<Vec<SyncQueueId>, AppError>;

    /// Re-checks eligibility and reserves the entry until `lease_until`.
    /// Orphaned entries are deleted here. An entry whose payload cannot be decoded
    /// stays claimed and comes back as `Undecodable`.
    async fn claim_entry(
        &self,
        id: SyncQueueId,
        now: DateTime<Utc>,
        lease_until: DateTime<Utc>,
    ) -> Result<ClaimOutcome, AppError>;

    /// Pushes the lease of a held claim to `lease_until`. Returns `false` when the
    /// claim is no longer held.
    async fn extend_claim(
        &self,
        id: SyncQueueId,
        claim_token: &str,
        lease_until: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<bool, AppError>;

    /// Marks the item submitted and deletes its entry. The item is marked even when
    /// the claim was lost; the return value says whether the entry was still held.
    async fn complete_entry(
        &self,
        claim: &ClaimedEntry,
        submitted_at: DateTime<Utc>,
    ) -> Result<bool, AppError>;

    /// Records a failed attempt. Returns `false` when the claim was lost and nothing
    /// was written.
    async fn fail_entry(
        &self,
        entry: &SyncQueueItem,
        claim_token: &str,
        error: &str,
        next_retry_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<bool, AppError>;

    async fn get_entry(&self, id: SyncQueueId) -> Result<Option<SyncQueueItem>, AppError>;

    async fn list_entries(&self) -> Result<Vec<SyncQueueItem>, AppError>;

    async fn get_pending_item(
        &self,
        kind: PendingItemKind,
        id: PendingItemId,
    ) -> Result<Option<PendingItem>, AppError>;

    async fn list_pending_items(
        &self,
        filter: PendingItemFilter,
    ) -> Result<Vec<PendingItem>, AppError>;

    async fn queue_snapshot(&self, now: DateTime<Utc>) -> Result<SyncQueueSnapshot, AppError>;

    /// Administrative removal of one entry. The pending item is kept.
    async fn purge_entry(&self, id: SyncQueueId) -> Result<bool, AppError>;

    async fn purge_entries_created_before(&self, cutoff: DateTime<Utc>)
    -> Result<u32, AppError>;
}
