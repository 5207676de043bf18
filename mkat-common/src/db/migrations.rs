//! Database schema migrations
//!
//! Versioned, idempotent migrations tracked in the `schema_version` table.
//!
//! # Migration Guidelines
//!
//! 1. **Never modify existing migrations** - databases in the field already ran them
//! 2. **Always add new migrations** - one function per schema change, bump
//!    [`CURRENT_SCHEMA_VERSION`]
//! 3. **Stay idempotent** - use `IF NOT EXISTS` / existence checks

use crate::Result;
use sqlx::SqlitePool;
use tracing::{info, warn};

/// Current schema version
///
/// **IMPORTANT:** Increment this when adding new migrations
pub const CURRENT_SCHEMA_VERSION: i32 = 2;

/// Get current schema version from database
///
/// Returns 0 if the table has no rows
pub async fn get_schema_version(pool: &SqlitePool) -> Result<i32> {
    let version: Option<i32> =
        sqlx::query_scalar("SELECT version FROM schema_version ORDER BY version DESC LIMIT 1")
            .fetch_optional(pool)
            .await?;

    Ok(version.unwrap_or(0))
}

async fn set_schema_version(pool: &SqlitePool, version: i32) -> Result<()> {
    sqlx::query("INSERT OR IGNORE INTO schema_version (version) VALUES (?)")
        .bind(version)
        .execute(pool)
        .await?;

    Ok(())
}

/// Run all pending migrations
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    let current_version = get_schema_version(pool).await?;

    if current_version == CURRENT_SCHEMA_VERSION {
        info!("Database schema is up to date (v{})", current_version);
        return Ok(());
    }

    if current_version > CURRENT_SCHEMA_VERSION {
        warn!(
            "Database schema version ({}) is newer than code version ({})",
            current_version, CURRENT_SCHEMA_VERSION
        );
        return Ok(());
    }

    info!(
        "Running database migrations: v{} -> v{}",
        current_version, CURRENT_SCHEMA_VERSION
    );

    if current_version < 1 {
        migrate_v1(pool).await?;
        set_schema_version(pool, 1).await?;
        info!("✓ Migration v1 completed");
    }

    if current_version < 2 {
        migrate_v2(pool).await?;
        set_schema_version(pool, 2).await?;
        info!("✓ Migration v2 completed");
    }

    Ok(())
}

/// Migration v1: enforce one inbox entry per (user, lead)
///
/// Older databases deduplicated inbox rows with a pre-check query only, so
/// duplicates may exist. Keep the earliest row of each pair, then add the
/// unique index that `INSERT ... ON CONFLICT DO NOTHING` relies on.
async fn migrate_v1(pool: &SqlitePool) -> Result<()> {
    let removed = sqlx::query(
        r#"
        DELETE FROM autopilot_lead_inbox
        WHERE rowid NOT IN (
            SELECT MIN(rowid) FROM autopilot_lead_inbox GROUP BY user_id, lead_id
        )
        "#,
    )
    .execute(pool)
    .await?
    .rows_affected();

    if removed > 0 {
        warn!("Migration v1: removed {} duplicate lead inbox rows", removed);
    }

    sqlx::query(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_lead_inbox_user_lead ON autopilot_lead_inbox(user_id, lead_id)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Migration v2: indexes for the cycle's hot lookups
async fn migrate_v2(pool: &SqlitePool) -> Result<()> {
    for statement in [
        "CREATE INDEX IF NOT EXISTS idx_campaign_metrics_campaign_date ON campaign_metrics(campaign_id, metric_date)",
        "CREATE INDEX IF NOT EXISTS idx_campaigns_user ON campaigns(user_id, auto_managed)",
        "CREATE INDEX IF NOT EXISTS idx_leads_user_created ON leads(user_id, created_at)",
        "CREATE INDEX IF NOT EXISTS idx_activity_user_created ON autopilot_activity_log(user_id, created_at)",
    ] {
        sqlx::query(statement).execute(pool).await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fresh_schema_reaches_current_version() {
        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
        crate::db::init_schema(&pool).await.unwrap();

        assert_eq!(get_schema_version(&pool).await.unwrap(), CURRENT_SCHEMA_VERSION);
    }

    #[tokio::test]
    async fn test_v1_removes_duplicate_inbox_rows() {
        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();

        // Pre-migration shape: no unique index yet
        sqlx::query(
            r#"
            CREATE TABLE autopilot_lead_inbox (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                lead_id TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'new',
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&pool)
        .await
        .unwrap();

        for id in ["a", "b", "c"] {
            sqlx::query(
                "INSERT INTO autopilot_lead_inbox (id, user_id, lead_id, created_at) VALUES (?, 'u1', 'lead-1', '2026-10-01T00:00:00Z')",
            )
            .bind(id)
            .execute(&pool)
            .await
            .unwrap();
        }

        migrate_v1(&pool).await.unwrap();

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM autopilot_lead_inbox")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 1);

        let duplicate = sqlx::query(
            "INSERT INTO autopilot_lead_inbox (id, user_id, lead_id, created_at) VALUES ('d', 'u1', 'lead-1', '2026-10-02T00:00:00Z')",
        )
        .execute(&pool)
        .await;
        assert!(duplicate.is_err(), "unique index should reject duplicates");
    }
}
