use super::mappers::{
    datetime_to_timestamp, domain_pending_item_from_row, domain_queue_item_from_row,
    domain_snapshot_from_row, payload_to_json,
};
use super::rows::{PendingItemRow, QueueSnapshotRow, SyncQueueItemRow};
use crate::application::ports::offline_store::OfflinePersistence;
use crate::domain::entities::offline::{
    ClaimOutcome, ClaimedEntry, EnqueuedItem, OrphanReason, PendingItem, PendingItemDraft,
    PendingItemFilter, SyncQueueItem, SyncQueueSnapshot, UndecodableEntry,
};
use crate::domain::value_objects::{PendingItemId, PendingItemKind, SyncQueueId};
use crate::shared::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Pool, Sqlite};
use uuid::Uuid;

const QUEUE_COLUMNS: &str = "id, item_kind, item_id, status, priority, retry_count, last_error, \
     next_retry_at, claim_token, created_at, updated_at";

const ELIGIBLE_CLAUSE: &str =
    "status IN ('pending', 'failed') AND (next_retry_at IS NULL OR next_retry_at <= ?1)";

pub struct SqliteOfflinePersistence {
    pool: Pool<Sqlite>,
}

impl SqliteOfflinePersistence {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    fn item_select(kind: PendingItemKind) -> String {
        format!(
            "SELECT id, payload, submitted, submitted_at, created_at FROM {}",
            kind.table_name()
        )
    }

    async fn pending_items_of_kind(
        &self,
        kind: PendingItemKind,
        filter: &PendingItemFilter,
    ) -> Result<Vec<PendingItem>, AppError> {
        let mut sql = Self::item_select(kind);
        if !filter.include_submitted {
            sql.push_str(" WHERE submitted = 0");
        }
        sql.push_str(" ORDER BY created_at DESC, id DESC");
        if let Some(limit) = filter.limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }

        let rows = sqlx::query_as::<_, PendingItemRow>(&sql)
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter()
            .map(|row| domain_pending_item_from_row(kind, row))
            .collect()
    }
}

#[async_trait]
impl OfflinePersistence for SqliteOfflinePersistence {
    async fn enqueue(
        &self,
        draft: PendingItemDraft,
        now: DateTime<Utc>,
    ) -> Result<EnqueuedItem, AppError> {
        let kind = draft.payload.kind();
        let payload = payload_to_json(&draft.payload)?;
        let created_at = datetime_to_timestamp(now);

        let mut tx = self.pool.begin().await?;

        let item_id = sqlx::query(&format!(
            "INSERT INTO {} ({}, payload, submitted, created_at) VALUES (?1, ?2, 0, ?3)",
            kind.table_name(),
            kind.index_column()
        ))
        .bind(draft.payload.index_key())
        .bind(&payload)
        .bind(created_at)
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

        let queue_id = sqlx::query(
            r#"
            INSERT INTO sync_queue (
                item_kind, item_id, status, priority, retry_count, created_at, updated_at
            ) VALUES (?1, ?2, 'pending', ?3, 0, ?4, ?4)
            "#,
        )
        .bind(kind.as_str())
        .bind(item_id)
        .bind(i64::from(draft.priority.unwrap_or(0)))
        .bind(created_at)
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

        tx.commit().await?;

        tracing::debug!(
            target: "offline::store",
            kind = kind.as_str(),
            item_id,
            queue_id,
            "pending item enqueued"
        );

        Ok(EnqueuedItem {
            kind,
            item_id: PendingItemId::new(item_id).map_err(AppError::Internal)?,
            queue_id: SyncQueueId::new(queue_id).map_err(AppError::Internal)?,
            created_at: now,
        })
    }

    async fn eligible_entry_ids(&self, now: DateTime<Utc>) -> Result<Vec<SyncQueueId>, AppError> {
        let ids = sqlx::query_scalar::<_, i64>(&format!(
            "SELECT id FROM sync_queue WHERE {ELIGIBLE_CLAUSE} ORDER BY priority DESC, id ASC"
        ))
        .bind(datetime_to_timestamp(now))
        .fetch_all(&self.pool)
        .await?;

        ids.into_iter()
            .map(|id| SyncQueueId::new(id).map_err(AppError::ValidationError))
            .collect()
    }

    async fn claim_entry(
        &self,
        id: SyncQueueId,
        now: DateTime<Utc>,
        lease_until: DateTime<Utc>,
    ) -> Result<ClaimOutcome, AppError> {
        let token = Uuid::new_v4().to_string();
        let now_ts = datetime_to_timestamp(now);

        let mut tx = self.pool.begin().await?;

        // The write comes first so the transaction holds the write lock before reading.
        let claimed = sqlx::query(&format!(
            "UPDATE sync_queue SET claim_token = ?2, next_retry_at = ?3, updated_at = ?1 \
             WHERE id = ?4 AND {ELIGIBLE_CLAUSE}"
        ))
        .bind(now_ts)
        .bind(&token)
        .bind(datetime_to_timestamp(lease_until))
        .bind(id.value())
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if claimed == 0 {
            tx.rollback().await?;
            return Ok(ClaimOutcome::NotEligible);
        }

        let entry_row = sqlx::query_as::<_, SyncQueueItemRow>(&format!(
            "SELECT {QUEUE_COLUMNS} FROM sync_queue WHERE id = ?1"
        ))
        .bind(id.value())
        .fetch_one(&mut *tx)
        .await?;

        let kind = entry_row
            .item_kind
            .parse::<PendingItemKind>()
            .map_err(AppError::ValidationError)?;

        let item_row = sqlx::query_as::<_, PendingItemRow>(&format!(
            "{} WHERE id = ?1",
            Self::item_select(kind)
        ))
        .bind(entry_row.item_id)
        .fetch_optional(&mut *tx)
        .await?;

        let orphan_reason = match &item_row {
            None => Some(OrphanReason::MissingItem),
            Some(row) if row.submitted => Some(OrphanReason::AlreadySubmitted),
            Some(_) => None,
        };

        if let Some(reason) = orphan_reason {
            sqlx::query("DELETE FROM sync_queue WHERE id = ?1")
                .bind(id.value())
                .execute(&mut *tx)
                .await?;
            tx.commit().await?;
            return Ok(ClaimOutcome::Orphaned {
                entry_id: id,
                reason,
            });
        }

        tx.commit().await?;

        let entry = domain_queue_item_from_row(entry_row)?;
        let item = match item_row {
            Some(row) => domain_pending_item_from_row(kind, row),
            None => return Err(AppError::Internal("claimed item vanished".to_string())),
        };

        match item {
            Ok(item) => Ok(ClaimOutcome::Claimed(Box::new(ClaimedEntry {
                entry,
                item,
                claim_token: token,
            }))),
            Err(err) => Ok(ClaimOutcome::Undecodable(Box::new(UndecodableEntry {
                entry,
                claim_token: token,
                error: err.to_string(),
            }))),
        }
    }

    async fn extend_claim(
        &self,
        id: SyncQueueId,
        claim_token: &str,
        lease_until: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<bool, AppError> {
        let extended = sqlx::query(
            "UPDATE sync_queue SET next_retry_at = ?1, updated_at = ?2 \
             WHERE id = ?3 AND claim_token = ?4",
        )
        .bind(datetime_to_timestamp(lease_until))
        .bind(datetime_to_timestamp(now))
        .bind(id.value())
        .bind(claim_token)
        .execute(&self.pool)
        .await?
        .rows_affected();
        Ok(extended == 1)
    }

    async fn complete_entry(
        &self,
        claim: &ClaimedEntry,
        submitted_at: DateTime<Utc>,
    ) -> Result<bool, AppError> {
        let kind = claim.entry.item_kind;
        let mut tx = self.pool.begin().await?;

        let removed = sqlx::query("DELETE FROM sync_queue WHERE id = ?1 AND claim_token = ?2")
            .bind(claim.entry.id.value())
            .bind(&claim.claim_token)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        // The server has the item either way.
        sqlx::query(&format!(
            "UPDATE {} SET submitted = 1, submitted_at = ?1 WHERE id = ?2 AND submitted = 0",
            kind.table_name()
        ))
        .bind(datetime_to_timestamp(submitted_at))
        .bind(claim.entry.item_id.value())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(removed == 1)
    }

    async fn fail_entry(
        &self,
        entry: &SyncQueueItem,
        claim_token: &str,
        error: &str,
        next_retry_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<bool, AppError> {
        let retry_count = i64::from(entry.retry_count.saturating_add(1));
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            r#"
            UPDATE sync_queue
            SET status = 'failed',
                retry_count = ?1,
                last_error = ?2,
                next_retry_at = ?3,
                claim_token = NULL,
                updated_at = ?4
            WHERE id = ?5 AND claim_token = ?6
            "#,
        )
        .bind(retry_count)
        .bind(error)
        .bind(datetime_to_timestamp(next_retry_at))
        .bind(datetime_to_timestamp(now))
        .bind(entry.id.value())
        .bind(claim_token)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        tx.commit().await?;
        Ok(updated == 1)
    }

    async fn get_entry(&self, id: SyncQueueId) -> Result<Option<SyncQueueItem>, AppError> {
        let row = sqlx::query_as::<_, SyncQueueItemRow>(&format!(
            "SELECT {QUEUE_COLUMNS} FROM sync_queue WHERE id = ?1"
        ))
        .bind(id.value())
        .fetch_optional(&self.pool)
        .await?;

        row.map(domain_queue_item_from_row).transpose()
    }

    async fn list_entries(&self) -> Result<Vec<SyncQueueItem>, AppError> {
        let rows = sqlx::query_as::<_, SyncQueueItemRow>(&format!(
            "SELECT {QUEUE_COLUMNS} FROM sync_queue ORDER BY priority DESC, id ASC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(domain_queue_item_from_row).collect()
    }

    async fn get_pending_item(
        &self,
        kind: PendingItemKind,
        id: PendingItemId,
    ) -> Result<Option<PendingItem>, AppError> {
        let row = sqlx::query_as::<_, PendingItemRow>(&format!(
            "{} WHERE id = ?1",
            Self::item_select(kind)
        ))
        .bind(id.value())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| domain_pending_item_from_row(kind, row))
            .transpose()
    }

    async fn list_pending_items(
        &self,
        filter: PendingItemFilter,
    ) -> Result<Vec<PendingItem>, AppError> {
        let kinds: Vec<PendingItemKind> = match filter.kind {
            Some(kind) => vec![kind],
            None => PendingItemKind::ALL.to_vec(),
        };

        let mut items = Vec::new();
        for kind in kinds {
            items.extend(self.pending_items_of_kind(kind, &filter).await?);
        }
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        if let Some(limit) = filter.limit {
            items.truncate(limit as usize);
        }
        Ok(items)
    }

    async fn queue_snapshot(&self, now: DateTime<Utc>) -> Result<SyncQueueSnapshot, AppError> {
        let row = sqlx::query_as::<_, QueueSnapshotRow>(
            r#"
            SELECT
                COUNT(*) AS total,
                COALESCE(SUM(CASE WHEN status = 'pending' THEN 1 ELSE 0 END), 0) AS pending,
                COALESCE(SUM(CASE WHEN status = 'failed' THEN 1 ELSE 0 END), 0) AS failed,
                COALESCE(SUM(CASE WHEN next_retry_at IS NULL OR next_retry_at <= ?1 THEN 1 ELSE 0 END), 0) AS eligible,
                COALESCE(MAX(retry_count), 0) AS max_retry_count,
                MIN(created_at) AS oldest_created_at
            FROM sync_queue
            "#,
        )
        .bind(datetime_to_timestamp(now))
        .fetch_one(&self.pool)
        .await?;

        domain_snapshot_from_row(row)
    }

    async fn purge_entry(&self, id: SyncQueueId) -> Result<bool, AppError> {
        let removed = sqlx::query("DELETE FROM sync_queue WHERE id = ?1")
            .bind(id.value())
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(removed > 0)
    }

    async fn purge_entries_created_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<u32, AppError> {
        let removed = sqlx::query("DELETE FROM sync_queue WHERE created_at < ?1")
            .bind(datetime_to_timestamp(cutoff))
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(removed.min(u32::MAX as u64) as u32)
    }
}
