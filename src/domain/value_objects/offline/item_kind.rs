use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PendingItemKind {
    Catch,
    Waypoint,
}

impl PendingItemKind {
    pub const ALL: [PendingItemKind; 2] = [PendingItemKind::Catch, PendingItemKind::Waypoint];

    pub fn as_str(&self) -> &'static str {
        match self {
            PendingItemKind::Catch => "catch",
            PendingItemKind::Waypoint => "waypoint",
        }
    }

    /// Table holding the pending items of this kind.
    pub fn table_name(&self) -> &'static str {
        match self {
            PendingItemKind::Catch => "catch_reports",
            PendingItemKind::Waypoint => "waypoints",
        }
    }

    /// Indexed column carrying the kind-specific lookup key.
    pub fn index_column(&self) -> &'static str {
        match self {
            PendingItemKind::Catch => "trip_id",
            PendingItemKind::Waypoint => "user_id",
        }
    }
}

impl fmt::Display for PendingItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PendingItemKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "catch" => Ok(PendingItemKind::Catch),
            "waypoint" => Ok(PendingItemKind::Waypoint),
            other => Err(format!("Unknown pending item kind: {other}")),
        }
    }
}
