//! Timer state engine and daily aggregator
//!
//! Enforces the segment lifecycle (Active -> Paused -> Completed) with at
//! most one open segment per user, appends one immutable timer event per
//! transition, and keeps the per-day total in sync with the completed
//! segments.
//!
//! Every operation runs inside a single transaction: the open segment is
//! row-locked before it is inspected, and on `end` the segment close and
//! the aggregate recompute commit atomically. The store backs the
//! one-open-segment invariant with a partial unique index.
//!
//! Elapsed time is always the wall-clock delta from the segment start at
//! the moment of the request. Paused intervals are not subtracted; a
//! segment paused for a minute reports that minute in its elapsed and
//! final duration.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{PgPool, Postgres, Row, Transaction};
use tracing::info;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::models::{DailyRecord, SegmentStatus, TimeSegment, TimerEventType};

/// Wall-clock seconds between a segment start and the request time
pub fn elapsed_seconds(start: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now - start).num_seconds().max(0)
}

/// Sum of durations over the completed segments of a record
///
/// This is the full re-sum the aggregator runs on every end; segments
/// that are still open contribute nothing.
pub fn total_completed_seconds(segments: &[TimeSegment]) -> i64 {
    segments
        .iter()
        .filter(|s| s.status == SegmentStatus::Completed)
        .filter_map(|s| s.duration_seconds)
        .sum()
}

fn segment_from_row(row: &sqlx::postgres::PgRow) -> ApiResult<TimeSegment> {
    let status: String = row.get("status");
    let status = status.parse::<SegmentStatus>().map_err(|e| {
        tracing::error!("Corrupt segment row: {}", e);
        ApiError::Internal
    })?;

    Ok(TimeSegment {
        id: row.get("id"),
        daily_record_id: row.get("daily_record_id"),
        user_id: row.get("user_id"),
        start_time: row.get("start_time"),
        end_time: row.get("end_time"),
        duration_seconds: row.get("duration_seconds"),
        status,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

fn record_from_row(row: &sqlx::postgres::PgRow) -> DailyRecord {
    DailyRecord {
        id: row.get("id"),
        user_id: row.get("user_id"),
        date: row.get("date"),
        total_seconds: row.get("total_seconds"),
        first_start_time: row.get("first_start_time"),
        last_end_time: row.get("last_end_time"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

const SEGMENT_COLUMNS: &str = "id, daily_record_id, user_id, start_time, end_time, \
                               duration_seconds, status, created_at, updated_at";

/// Timer state engine
///
/// Operations take the request wall clock as an argument so callers (and
/// tests) control the clock.
#[derive(Clone)]
pub struct TimerEngine {
    pool: PgPool,
}

impl TimerEngine {
    /// Create a new timer engine on the given pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Start tracking: create an Active segment, or return the already
    /// open one unchanged (idempotent start)
    ///
    /// Lazily creates the daily record for the calendar day of `now`,
    /// setting `first_start_time` exactly once.
    pub async fn start(&self, user_id: Uuid, now: DateTime<Utc>) -> ApiResult<TimeSegment> {
        let mut tx = self.pool.begin().await?;

        if let Some(open) = self.open_segment(&mut tx, user_id).await? {
            tx.commit().await?;
            info!("Reusing open segment {} for user {}", open.id, user_id);
            return Ok(open);
        }

        let record_id = self
            .find_or_create_record(&mut tx, user_id, now)
            .await?;

        let row = sqlx::query(&format!(
            r#"
            INSERT INTO time_segments (daily_record_id, user_id, start_time, status)
            VALUES ($1, $2, $3, 'active')
            RETURNING {SEGMENT_COLUMNS}
            "#
        ))
        .bind(record_id)
        .bind(user_id)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;
        let segment = segment_from_row(&row)?;

        self.append_event(&mut tx, user_id, TimerEventType::Start, now, Some(0), segment.id)
            .await?;

        tx.commit().await?;
        info!("Started segment {} for user {}", segment.id, user_id);
        Ok(segment)
    }

    /// Pause the user's Active segment
    pub async fn pause(&self, user_id: Uuid, now: DateTime<Utc>) -> ApiResult<TimeSegment> {
        let mut tx = self.pool.begin().await?;

        let segment = self.open_segment(&mut tx, user_id).await?;
        let Some(segment) = segment.filter(|s| s.status == SegmentStatus::Active) else {
            return Err(ApiError::InvalidState(
                "No active segment to pause".to_string(),
            ));
        };

        let segment = self
            .set_status(&mut tx, segment.id, SegmentStatus::Paused)
            .await?;

        let elapsed = elapsed_seconds(segment.start_time, now);
        self.append_event(&mut tx, user_id, TimerEventType::Pause, now, Some(elapsed), segment.id)
            .await?;

        tx.commit().await?;
        info!("Paused segment {} for user {}", segment.id, user_id);
        Ok(segment)
    }

    /// Resume the user's Paused segment
    pub async fn resume(&self, user_id: Uuid, now: DateTime<Utc>) -> ApiResult<TimeSegment> {
        let mut tx = self.pool.begin().await?;

        let segment = self.open_segment(&mut tx, user_id).await?;
        let Some(segment) = segment.filter(|s| s.status == SegmentStatus::Paused) else {
            return Err(ApiError::InvalidState(
                "No paused segment to resume".to_string(),
            ));
        };

        let segment = self
            .set_status(&mut tx, segment.id, SegmentStatus::Active)
            .await?;

        let elapsed = elapsed_seconds(segment.start_time, now);
        self.append_event(&mut tx, user_id, TimerEventType::Resume, now, Some(elapsed), segment.id)
            .await?;

        tx.commit().await?;
        info!("Resumed segment {} for user {}", segment.id, user_id);
        Ok(segment)
    }

    /// End the user's open segment (Active or Paused) and re-aggregate
    /// the owning daily record
    pub async fn end(&self, user_id: Uuid, now: DateTime<Utc>) -> ApiResult<TimeSegment> {
        let mut tx = self.pool.begin().await?;

        let Some(segment) = self.open_segment(&mut tx, user_id).await? else {
            return Err(ApiError::InvalidState("No open segment to end".to_string()));
        };

        let duration = elapsed_seconds(segment.start_time, now);

        let row = sqlx::query(&format!(
            r#"
            UPDATE time_segments
            SET status = 'completed', end_time = $2, duration_seconds = $3,
                updated_at = now()
            WHERE id = $1
            RETURNING {SEGMENT_COLUMNS}
            "#
        ))
        .bind(segment.id)
        .bind(now)
        .bind(duration)
        .fetch_one(&mut *tx)
        .await?;
        let segment = segment_from_row(&row)?;

        // Full re-sum over the record's completed segments, not an
        // incremental add.
        let completed = self
            .segments_for_record(&mut tx, segment.daily_record_id)
            .await?;
        let total = total_completed_seconds(&completed);

        sqlx::query(
            r#"
            UPDATE daily_time_records
            SET total_seconds = $2, last_end_time = $3, updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(segment.daily_record_id)
        .bind(total)
        .bind(now.time())
        .execute(&mut *tx)
        .await?;

        self.append_event(&mut tx, user_id, TimerEventType::End, now, Some(duration), segment.id)
            .await?;

        tx.commit().await?;
        info!(
            "Ended segment {} for user {} ({}s, daily total {}s)",
            segment.id, user_id, duration, total
        );
        Ok(segment)
    }

    /// Heartbeat: record elapsed time for the Active segment without
    /// changing its state
    pub async fn heartbeat(&self, user_id: Uuid, now: DateTime<Utc>) -> ApiResult<TimeSegment> {
        let mut tx = self.pool.begin().await?;

        let segment = self.open_segment(&mut tx, user_id).await?;
        let Some(segment) = segment.filter(|s| s.status == SegmentStatus::Active) else {
            return Err(ApiError::InvalidState(
                "No active segment to update".to_string(),
            ));
        };

        let elapsed = elapsed_seconds(segment.start_time, now);
        self.append_event(&mut tx, user_id, TimerEventType::Update, now, Some(elapsed), segment.id)
            .await?;

        tx.commit().await?;
        Ok(segment)
    }

    /// Load a user's daily record and its segments for the given date
    pub async fn daily_record(
        &self,
        user_id: Uuid,
        date: NaiveDate,
    ) -> ApiResult<Option<(DailyRecord, Vec<TimeSegment>)>> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, date, total_seconds, first_start_time, last_end_time,
                   created_at, updated_at
            FROM daily_time_records
            WHERE user_id = $1 AND date = $2
            "#,
        )
        .bind(user_id)
        .bind(date)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let record = record_from_row(&row);

        let rows = sqlx::query(&format!(
            r#"
            SELECT {SEGMENT_COLUMNS}
            FROM time_segments
            WHERE daily_record_id = $1
            ORDER BY start_time
            "#
        ))
        .bind(record.id)
        .fetch_all(&self.pool)
        .await?;

        let segments = rows
            .iter()
            .map(segment_from_row)
            .collect::<ApiResult<Vec<_>>>()?;

        Ok(Some((record, segments)))
    }

    /// Row-lock and return the user's open (active or paused) segment
    async fn open_segment(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user_id: Uuid,
    ) -> ApiResult<Option<TimeSegment>> {
        let row = sqlx::query(&format!(
            r#"
            SELECT {SEGMENT_COLUMNS}
            FROM time_segments
            WHERE user_id = $1 AND status <> 'completed'
            FOR UPDATE
            "#
        ))
        .bind(user_id)
        .fetch_optional(&mut **tx)
        .await?;

        row.as_ref().map(segment_from_row).transpose()
    }

    /// Find the daily record for (user, day-of-now), creating it on the
    /// first start of that day
    async fn find_or_create_record(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> ApiResult<Uuid> {
        let date = now.date_naive();

        let existing = sqlx::query(
            r#"
            SELECT id FROM daily_time_records
            WHERE user_id = $1 AND date = $2
            FOR UPDATE
            "#,
        )
        .bind(user_id)
        .bind(date)
        .fetch_optional(&mut **tx)
        .await?;

        if let Some(row) = existing {
            // first_start_time was set by the day's first start and is
            // never overwritten.
            return Ok(row.get("id"));
        }

        let row = sqlx::query(
            r#"
            INSERT INTO daily_time_records (user_id, date, total_seconds, first_start_time)
            VALUES ($1, $2, 0, $3)
            RETURNING id
            "#,
        )
        .bind(user_id)
        .bind(date)
        .bind(now.time())
        .fetch_one(&mut **tx)
        .await?;

        info!("Created daily record for user {} on {}", user_id, date);
        Ok(row.get("id"))
    }

    async fn set_status(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        segment_id: Uuid,
        status: SegmentStatus,
    ) -> ApiResult<TimeSegment> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE time_segments
            SET status = $2, updated_at = now()
            WHERE id = $1
            RETURNING {SEGMENT_COLUMNS}
            "#
        ))
        .bind(segment_id)
        .bind(status.as_str())
        .fetch_one(&mut **tx)
        .await?;

        segment_from_row(&row)
    }

    async fn segments_for_record(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        record_id: Uuid,
    ) -> ApiResult<Vec<TimeSegment>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {SEGMENT_COLUMNS}
            FROM time_segments
            WHERE daily_record_id = $1
            "#
        ))
        .bind(record_id)
        .fetch_all(&mut **tx)
        .await?;

        rows.iter().map(segment_from_row).collect()
    }

    /// Append one immutable event to the audit log
    async fn append_event(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user_id: Uuid,
        event_type: TimerEventType,
        timestamp: DateTime<Utc>,
        elapsed_seconds: Option<i64>,
        segment_id: Uuid,
    ) -> ApiResult<()> {
        sqlx::query(
            r#"
            INSERT INTO timer_events (user_id, event_type, timestamp, elapsed_seconds, segment_id)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(user_id)
        .bind(event_type.as_str())
        .bind(timestamp)
        .bind(elapsed_seconds)
        .bind(segment_id)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn segment(status: SegmentStatus, duration: Option<i64>) -> TimeSegment {
        let now = Utc::now();
        TimeSegment {
            id: Uuid::new_v4(),
            daily_record_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            start_time: now,
            end_time: None,
            duration_seconds: duration,
            status,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_elapsed_is_wall_clock_delta() {
        let start = Utc.with_ymd_and_hms(2025, 3, 18, 9, 0, 0).unwrap();
        assert_eq!(elapsed_seconds(start, start + Duration::seconds(60)), 60);
        assert_eq!(elapsed_seconds(start, start + Duration::seconds(180)), 180);
    }

    #[test]
    fn test_elapsed_never_negative() {
        let start = Utc::now();
        assert_eq!(elapsed_seconds(start, start - Duration::seconds(5)), 0);
    }

    #[test]
    fn test_total_sums_only_completed_segments() {
        let segments = vec![
            segment(SegmentStatus::Completed, Some(180)),
            segment(SegmentStatus::Completed, Some(120)),
            segment(SegmentStatus::Active, None),
            segment(SegmentStatus::Paused, None),
        ];

        assert_eq!(total_completed_seconds(&segments), 300);
    }

    #[test]
    fn test_total_of_empty_record_is_zero() {
        assert_eq!(total_completed_seconds(&[]), 0);
    }
}
