use super::{CatchReport, WaypointSubmission};
use crate::domain::value_objects::{PendingItemId, PendingItemKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Domain payload of a not-yet-confirmed submission.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", content = "payload", rename_all = "snake_case")]
pub enum PendingPayload {
    Catch(CatchReport),
    Waypoint(WaypointSubmission),
}

impl PendingPayload {
    pub fn kind(&self) -> PendingItemKind {
        match self {
            PendingPayload::Catch(_) => PendingItemKind::Catch,
            PendingPayload::Waypoint(_) => PendingItemKind::Waypoint,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        match self {
            PendingPayload::Catch(report) => report.validate(),
            PendingPayload::Waypoint(waypoint) => waypoint.validate(),
        }
    }

    /// Value stored in the kind-specific indexed column.
    pub fn index_key(&self) -> &str {
        match self {
            PendingPayload::Catch(report) => &report.trip_id,
            PendingPayload::Waypoint(waypoint) => &waypoint.user_id,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PendingItem {
    pub id: PendingItemId,
    pub payload: PendingPayload,
    pub submitted: bool,
    pub submitted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl PendingItem {
    pub fn new(
        id: PendingItemId,
        payload: PendingPayload,
        submitted: bool,
        submitted_at: Option<DateTime<Utc>>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            payload,
            submitted,
            submitted_at,
            created_at,
        }
    }

    pub fn kind(&self) -> PendingItemKind {
        self.payload.kind()
    }
}

/// Input of the enqueue protocol.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingItemDraft {
    pub payload: PendingPayload,
    pub priority: Option<u8>,
}

impl PendingItemDraft {
    pub fn new(payload: PendingPayload, priority: Option<u8>) -> Self {
        Self { payload, priority }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PendingItemFilter {
    pub kind: Option<PendingItemKind>,
    pub include_submitted: bool,
    pub limit: Option<u32>,
}

impl PendingItemFilter {
    pub fn new(kind: Option<PendingItemKind>, include_submitted: bool, limit: Option<u32>) -> Self {
        Self {
            kind,
            include_submitted,
            limit,
        }
    }
}
