use serde::{Deserialize, Serialize};
use std::fmt;

/// Delivery status of a queue entry. Delivered entries are deleted, so there is no
/// completed state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncQueueStatus {
    Pending,
    Failed,
}

impl SyncQueueStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncQueueStatus::Pending => "pending",
            SyncQueueStatus::Failed => "failed",
        }
    }

    pub fn parse(value: &str) -> Result<Self, String> {
        match value {
            "pending" => Ok(SyncQueueStatus::Pending),
            "failed" => Ok(SyncQueueStatus::Failed),
            other => Err(format!("Unknown sync queue status: {other}")),
        }
    }
}

impl fmt::Display for SyncQueueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_round_trips_known_statuses() {
        assert_eq!(SyncQueueStatus::parse("pending"), Ok(SyncQueueStatus::Pending));
        assert_eq!(SyncQueueStatus::parse("failed"), Ok(SyncQueueStatus::Failed));
        assert!(SyncQueueStatus::parse("completed").is_err());
    }
}
