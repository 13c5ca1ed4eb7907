//! Time segment model: one contiguous span of tracked work time

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Lifecycle state of a time segment
///
/// `Completed` is terminal; a new segment must be created afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentStatus {
    Active,
    Paused,
    Completed,
}

impl SegmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SegmentStatus::Active => "active",
            SegmentStatus::Paused => "paused",
            SegmentStatus::Completed => "completed",
        }
    }

    /// A segment still counts against the one-open-segment invariant
    /// while it is active or paused.
    pub fn is_open(&self) -> bool {
        !matches!(self, SegmentStatus::Completed)
    }
}

impl fmt::Display for SegmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SegmentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(SegmentStatus::Active),
            "paused" => Ok(SegmentStatus::Paused),
            "completed" => Ok(SegmentStatus::Completed),
            other => Err(format!("Unknown segment status: {}", other)),
        }
    }
}

/// Time segment entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeSegment {
    pub id: Uuid,
    pub daily_record_id: Uuid,
    pub user_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub duration_seconds: Option<i64>,
    pub status: SegmentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
