//! Timer event model: append-only audit log of state transitions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Kind of timer transition an event records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerEventType {
    Start,
    Update,
    Pause,
    Resume,
    End,
}

impl TimerEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimerEventType::Start => "start",
            TimerEventType::Update => "update",
            TimerEventType::Pause => "pause",
            TimerEventType::Resume => "resume",
            TimerEventType::End => "end",
        }
    }
}

impl fmt::Display for TimerEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Timer event entity. Rows are never mutated after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerEvent {
    pub id: Uuid,
    pub user_id: Uuid,
    pub event_type: TimerEventType,
    pub timestamp: DateTime<Utc>,
    pub elapsed_seconds: Option<i64>,
    pub segment_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}
