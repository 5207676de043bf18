//! `autopilot_cycle_failures` dead-letter queries

use mkat_common::Result;
use serde::Serialize;
use sqlx::SqlitePool;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CycleFailure {
    pub id: String,
    pub user_id: String,
    pub error_kind: String,
    pub error: String,
    pub failed_at: String,
}

pub async fn record_failure(pool: &SqlitePool, failure: &CycleFailure) -> Result<()> {
    sqlx::query(
        "INSERT INTO autopilot_cycle_failures (id, user_id, error_kind, error, failed_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&failure.id)
    .bind(&failure.user_id)
    .bind(&failure.error_kind)
    .bind(&failure.error)
    .bind(&failure.failed_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Failures for a user, newest first
pub async fn failures_for_user(pool: &SqlitePool, user_id: &str, limit: i64) -> Result<Vec<CycleFailure>> {
    let failures = sqlx::query_as::<_, CycleFailure>(
        r#"
        SELECT id, user_id, error_kind, error, failed_at
        FROM autopilot_cycle_failures
        WHERE user_id = ?
        ORDER BY failed_at DESC, rowid DESC
        LIMIT ?
        "#,
    )
    .bind(user_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(failures)
}
