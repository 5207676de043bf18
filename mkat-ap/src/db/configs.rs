//! `marketing_autopilot_config` queries

use mkat_common::db::AutopilotConfig;
use mkat_common::Result;
use sqlx::SqlitePool;

const CONFIG_COLUMNS: &str =
    "id, user_id, monthly_budget, ai_strategy, is_active, last_optimized_at";

/// All configs with `is_active = 1`, oldest optimization first
pub async fn active_configs(pool: &SqlitePool) -> Result<Vec<AutopilotConfig>> {
    let sql = format!(
        "SELECT {} FROM marketing_autopilot_config WHERE is_active = 1 \
         ORDER BY last_optimized_at IS NOT NULL, last_optimized_at, created_at",
        CONFIG_COLUMNS
    );

    let configs = sqlx::query_as::<_, AutopilotConfig>(&sql)
        .fetch_all(pool)
        .await?;

    Ok(configs)
}

/// The user's config if it exists and is active
pub async fn active_config_for_user(
    pool: &SqlitePool,
    user_id: &str,
) -> Result<Option<AutopilotConfig>> {
    let sql = format!(
        "SELECT {} FROM marketing_autopilot_config WHERE user_id = ? AND is_active = 1",
        CONFIG_COLUMNS
    );

    let config = sqlx::query_as::<_, AutopilotConfig>(&sql)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

    Ok(config)
}

/// Timestamp a completed cycle
pub async fn mark_optimized(pool: &SqlitePool, config_id: &str, at: &str) -> Result<()> {
    sqlx::query(
        "UPDATE marketing_autopilot_config SET last_optimized_at = ?, updated_at = ? WHERE id = ?",
    )
    .bind(at)
    .bind(at)
    .bind(config_id)
    .execute(pool)
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn setup_test_db() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        mkat_common::db::init_schema(&pool).await.unwrap();
        pool
    }

    async fn insert_config(pool: &SqlitePool, id: &str, user_id: &str, active: bool, last: Option<&str>) {
        sqlx::query(
            r#"
            INSERT INTO marketing_autopilot_config
                (id, user_id, monthly_budget, ai_strategy, is_active, last_optimized_at, created_at, updated_at)
            VALUES (?, ?, 1000, NULL, ?, ?, '2026-10-01T00:00:00Z', '2026-10-01T00:00:00Z')
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(active)
        .bind(last)
        .execute(pool)
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_active_configs_excludes_disabled() {
        let pool = setup_test_db().await;
        insert_config(&pool, "c1", "u1", true, None).await;
        insert_config(&pool, "c2", "u2", false, None).await;

        let configs = active_configs(&pool).await.unwrap();
        assert_eq!(configs.len(), 1);
        assert_eq!(configs[0].user_id, "u1");
    }

    #[tokio::test]
    async fn test_never_optimized_configs_come_first() {
        let pool = setup_test_db().await;
        insert_config(&pool, "c1", "u1", true, Some("2026-10-16T00:00:00Z")).await;
        insert_config(&pool, "c2", "u2", true, None).await;

        let configs = active_configs(&pool).await.unwrap();
        assert_eq!(configs[0].user_id, "u2");
        assert_eq!(configs[1].user_id, "u1");
    }

    #[tokio::test]
    async fn test_active_config_for_user() {
        let pool = setup_test_db().await;
        insert_config(&pool, "c1", "u1", true, None).await;
        insert_config(&pool, "c2", "u2", false, None).await;

        assert!(active_config_for_user(&pool, "u1").await.unwrap().is_some());
        assert!(active_config_for_user(&pool, "u2").await.unwrap().is_none());
        assert!(active_config_for_user(&pool, "u3").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_mark_optimized() {
        let pool = setup_test_db().await;
        insert_config(&pool, "c1", "u1", true, None).await;

        mark_optimized(&pool, "c1", "2026-10-17T06:00:00Z").await.unwrap();

        let config = active_config_for_user(&pool, "u1").await.unwrap().unwrap();
        assert_eq!(config.last_optimized_at.as_deref(), Some("2026-10-17T06:00:00Z"));
    }
}
