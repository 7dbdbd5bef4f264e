use serde::{Deserialize, Serialize};
use std::fmt;

/// Row identifier of a pending item. Unique only within the table of its kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PendingItemId(i64);

impl PendingItemId {
    pub fn new(value: i64) -> Result<Self, String> {
        if value <= 0 {
            return Err("Pending item id must be positive".to_string());
        }
        Ok(Self(value))
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for PendingItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<PendingItemId> for i64 {
    fn from(id: PendingItemId) -> Self {
        id.0
    }
}
