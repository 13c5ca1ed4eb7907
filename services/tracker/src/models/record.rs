//! Daily time record model: per-user-per-day aggregate

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Daily time record entity
///
/// Created lazily on the first start of a calendar day.
/// `first_start_time` is set once and never overwritten;
/// `total_seconds` is recomputed from completed segments on every end.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub date: NaiveDate,
    pub total_seconds: i64,
    pub first_start_time: NaiveTime,
    pub last_end_time: Option<NaiveTime>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
