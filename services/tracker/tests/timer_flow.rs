//! Integration tests for the timer state engine and daily aggregator
//!
//! These tests run against the database configured via DATABASE_URL and
//! are skipped when it is not exported. The request clock is injected, so
//! the lifecycle scenarios run instantly.

use chrono::{DateTime, Duration, NaiveTime, Timelike, Utc};
use common::{database, schema};
use serial_test::serial;
use sqlx::{PgPool, Row};
use tracker::engine::TimerEngine;
use tracker::error::ApiError;
use tracker::models::SegmentStatus;
use uuid::Uuid;

async fn setup() -> Option<(PgPool, TimerEngine)> {
    if std::env::var("DATABASE_URL").is_err() {
        eprintln!("DATABASE_URL not set, skipping timer integration test");
        return None;
    }

    let config = database::DatabaseConfig::from_env().unwrap();
    let pool = database::init_pool(&config).await.unwrap();
    schema::register(&pool).await.unwrap();

    let engine = TimerEngine::new(pool.clone());
    Some((pool, engine))
}

async fn create_user(pool: &PgPool) -> Uuid {
    let row = sqlx::query(
        r#"
        INSERT INTO users (name, email, password_hash)
        VALUES ('Timer Tester', $1, 'test-hash')
        RETURNING id
        "#,
    )
    .bind(format!("timer-{}@example.com", Uuid::new_v4()))
    .fetch_one(pool)
    .await
    .unwrap();

    row.get("id")
}

/// A stable clock inside today so the scenarios never straddle midnight
fn t0() -> DateTime<Utc> {
    Utc::now()
        .date_naive()
        .and_time(NaiveTime::from_hms_opt(9, 0, 0).unwrap())
        .and_utc()
}

fn assert_invalid_state<T: std::fmt::Debug>(result: Result<T, ApiError>) {
    match result {
        Err(ApiError::InvalidState(_)) => {}
        other => panic!("expected InvalidState, got {:?}", other),
    }
}

#[tokio::test]
#[serial]
async fn start_is_idempotent() {
    let Some((pool, engine)) = setup().await else {
        return;
    };
    let user = create_user(&pool).await;
    let t0 = t0();

    let first = engine.start(user, t0).await.unwrap();
    let second = engine.start(user, t0 + Duration::seconds(30)).await.unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(second.status, SegmentStatus::Active);
    assert_eq!(second.start_time, first.start_time);
}

#[tokio::test]
#[serial]
async fn transitions_require_the_right_state() {
    let Some((pool, engine)) = setup().await else {
        return;
    };
    let user = create_user(&pool).await;
    let t0 = t0();

    // Nothing is open yet.
    assert_invalid_state(engine.pause(user, t0).await);
    assert_invalid_state(engine.resume(user, t0).await);
    assert_invalid_state(engine.end(user, t0).await);
    assert_invalid_state(engine.heartbeat(user, t0).await);

    engine.start(user, t0).await.unwrap();

    // Active: resume is invalid, pause is fine.
    assert_invalid_state(engine.resume(user, t0 + Duration::seconds(10)).await);
    engine.pause(user, t0 + Duration::seconds(20)).await.unwrap();

    // Paused: pause and heartbeat are invalid.
    assert_invalid_state(engine.pause(user, t0 + Duration::seconds(30)).await);
    assert_invalid_state(engine.heartbeat(user, t0 + Duration::seconds(30)).await);

    // Ending a paused segment is allowed.
    let ended = engine.end(user, t0 + Duration::seconds(40)).await.unwrap();
    assert_eq!(ended.status, SegmentStatus::Completed);

    // Completed is terminal.
    assert_invalid_state(engine.end(user, t0 + Duration::seconds(50)).await);
}

#[tokio::test]
#[serial]
async fn lifecycle_aggregates_daily_total() {
    let Some((pool, engine)) = setup().await else {
        return;
    };
    let user = create_user(&pool).await;
    let t0 = t0();

    let started = engine.start(user, t0).await.unwrap();
    engine.pause(user, t0 + Duration::seconds(60)).await.unwrap();
    engine.resume(user, t0 + Duration::seconds(120)).await.unwrap();
    let ended = engine.end(user, t0 + Duration::seconds(180)).await.unwrap();

    // Duration is wall-clock from start; the paused minute counts.
    assert_eq!(ended.id, started.id);
    assert_eq!(ended.status, SegmentStatus::Completed);
    assert_eq!(ended.duration_seconds, Some(180));
    assert_eq!(ended.end_time, Some(t0 + Duration::seconds(180)));

    let (record, segments) = engine
        .daily_record(user, t0.date_naive())
        .await
        .unwrap()
        .expect("daily record should exist");

    assert_eq!(record.total_seconds, 180);
    assert_eq!(record.first_start_time.hour(), 9);
    assert_eq!(record.first_start_time.minute(), 0);
    assert_eq!(
        record.last_end_time.map(|t| (t.hour(), t.minute())),
        Some((9, 3))
    );
    assert_eq!(segments.len(), 1);

    // A second segment on the same day re-sums the total and leaves
    // first_start_time untouched.
    engine.start(user, t0 + Duration::seconds(240)).await.unwrap();
    engine.end(user, t0 + Duration::seconds(300)).await.unwrap();

    let (record, segments) = engine
        .daily_record(user, t0.date_naive())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(record.total_seconds, 240);
    assert_eq!(record.first_start_time.hour(), 9);
    assert_eq!(record.first_start_time.minute(), 0);
    assert_eq!(segments.len(), 2);
}

#[tokio::test]
#[serial]
async fn every_transition_appends_one_event() {
    let Some((pool, engine)) = setup().await else {
        return;
    };
    let user = create_user(&pool).await;
    let t0 = t0();

    let segment = engine.start(user, t0).await.unwrap();
    engine.heartbeat(user, t0 + Duration::seconds(30)).await.unwrap();
    engine.pause(user, t0 + Duration::seconds(60)).await.unwrap();
    engine.resume(user, t0 + Duration::seconds(120)).await.unwrap();
    engine.end(user, t0 + Duration::seconds(180)).await.unwrap();

    // Reusing the open segment via an idempotent start appends nothing,
    // so the log holds exactly the five transitions.
    let rows = sqlx::query(
        r#"
        SELECT event_type, elapsed_seconds
        FROM timer_events
        WHERE segment_id = $1
        ORDER BY timestamp
        "#,
    )
    .bind(segment.id)
    .fetch_all(&pool)
    .await
    .unwrap();

    let log: Vec<(String, Option<i64>)> = rows
        .iter()
        .map(|row| (row.get("event_type"), row.get("elapsed_seconds")))
        .collect();

    assert_eq!(
        log,
        vec![
            ("start".to_string(), Some(0)),
            ("update".to_string(), Some(30)),
            ("pause".to_string(), Some(60)),
            ("resume".to_string(), Some(120)),
            ("end".to_string(), Some(180)),
        ]
    );
}

#[tokio::test]
#[serial]
async fn only_one_open_segment_per_user() {
    let Some((pool, engine)) = setup().await else {
        return;
    };
    let user = create_user(&pool).await;
    let t0 = t0();

    let first = engine.start(user, t0).await.unwrap();
    engine.pause(user, t0 + Duration::seconds(10)).await.unwrap();

    // Even while paused, start reuses the open segment instead of
    // creating a second one.
    let reused = engine.start(user, t0 + Duration::seconds(20)).await.unwrap();
    assert_eq!(reused.id, first.id);

    let open_count: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*) FROM time_segments
        WHERE user_id = $1 AND status <> 'completed'
        "#,
    )
    .bind(user)
    .fetch_one(&pool)
    .await
    .unwrap();

    assert_eq!(open_count, 1);
}
