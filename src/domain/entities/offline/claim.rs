use super::{PendingItem, SyncQueueItem};
use crate::domain::value_objects::SyncQueueId;

/// An entry reserved by one orchestrator run for a single delivery attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct ClaimedEntry {
    pub entry: SyncQueueItem,
    pub item: PendingItem,
    pub claim_token: String,
}

/// A claimed entry whose stored payload could not be decoded. The claim is held so
/// the failure can be recorded against it.
#[derive(Debug, Clone, PartialEq)]
pub struct UndecodableEntry {
    pub entry: SyncQueueItem,
    pub claim_token: String,
    pub error: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrphanReason {
    MissingItem,
    AlreadySubmitted,
}

impl OrphanReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrphanReason::MissingItem => "missing_item",
            OrphanReason::AlreadySubmitted => "already_submitted",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ClaimOutcome {
    Claimed(Box<ClaimedEntry>),
    Undecodable(Box<UndecodableEntry>),
    /// The entry referenced a missing or submitted item and was deleted.
    Orphaned {
        entry_id: SyncQueueId,
        reason: OrphanReason,
    },
    /// Not eligible any more: another run claimed it, finished it, or its retry time moved.
    NotEligible,
}
