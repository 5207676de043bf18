//! Shared fixtures for mkat-ap integration tests

#![allow(dead_code)]

use chrono::{Duration, Utc};
use mkat_common::{time, uuid_utils};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

/// Fresh in-memory database with the full schema
///
/// One connection, so every query sees the same in-memory database and
/// pending rollbacks are applied before the next statement.
pub async fn setup_test_db() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Should open in-memory database");
    mkat_common::db::init_schema(&pool)
        .await
        .expect("Should create schema");
    pool
}

pub fn new_user_id() -> String {
    uuid_utils::generate_string()
}

pub fn single_channel_strategy(channel: &str, percentage: f64) -> String {
    format!(
        r#"{{"channels":[{{"name":"{}","budgetPercentage":{},"rationale":"Best fit"}}]}}"#,
        channel, percentage
    )
}

/// Insert an active autopilot config; returns its id
pub async fn insert_config(pool: &SqlitePool, user_id: &str, monthly_budget: f64, strategy: Option<&str>) -> String {
    let id = uuid_utils::generate_string();
    let now = time::to_db_string(time::now());
    sqlx::query(
        r#"
        INSERT INTO marketing_autopilot_config
            (id, user_id, monthly_budget, ai_strategy, is_active, created_at, updated_at)
        VALUES (?, ?, ?, ?, 1, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(user_id)
    .bind(monthly_budget)
    .bind(strategy)
    .bind(&now)
    .bind(&now)
    .execute(pool)
    .await
    .expect("Should insert config");
    id
}

pub async fn deactivate_config(pool: &SqlitePool, user_id: &str) {
    sqlx::query("UPDATE marketing_autopilot_config SET is_active = 0 WHERE user_id = ?")
        .bind(user_id)
        .execute(pool)
        .await
        .expect("Should deactivate config");
}

/// Insert an active autopilot campaign; returns its id
pub async fn insert_auto_campaign(pool: &SqlitePool, user_id: &str, budget: f64) -> String {
    let id = uuid_utils::generate_string();
    let now = time::to_db_string(time::now());
    sqlx::query(
        r#"
        INSERT INTO campaigns
            (id, user_id, name, channel, total_budget, status, auto_managed, created_at, updated_at)
        VALUES (?, ?, 'Email Campaign', 'email', ?, 'active', 1, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(user_id)
    .bind(budget)
    .bind(&now)
    .bind(&now)
    .execute(pool)
    .await
    .expect("Should insert campaign");
    id
}

/// Insert one daily metric row dated `days_ago` days back
pub async fn insert_metric(pool: &SqlitePool, campaign_id: &str, days_ago: i64, spend: f64, conversion_rate: f64) {
    let date = time::to_date_string(Utc::now() - Duration::days(days_ago));
    sqlx::query(
        r#"
        INSERT INTO campaign_metrics
            (id, campaign_id, metric_date, spend, conversions, conversion_rate, created_at)
        VALUES (?, ?, ?, ?, 1, ?, ?)
        "#,
    )
    .bind(uuid_utils::generate_string())
    .bind(campaign_id)
    .bind(date)
    .bind(spend)
    .bind(conversion_rate)
    .bind(time::to_db_string(time::now()))
    .execute(pool)
    .await
    .expect("Should insert metric");
}

/// Insert `days` daily metric rows ending yesterday, spend split evenly
pub async fn insert_metrics(pool: &SqlitePool, campaign_id: &str, days: i64, total_spend: f64, conversion_rate: f64) {
    for day in 1..=days {
        insert_metric(pool, campaign_id, day, total_spend / days as f64, conversion_rate).await;
    }
}

/// Insert a lead created `age_days` ago; returns its id
pub async fn insert_lead(pool: &SqlitePool, user_id: &str, age_days: i64) -> String {
    let id = uuid_utils::generate_string();
    sqlx::query("INSERT INTO leads (id, user_id, name, email, source, created_at) VALUES (?, ?, 'Ada', 'ada@example.com', 'web', ?)")
        .bind(&id)
        .bind(user_id)
        .bind(time::to_db_string(time::now() - Duration::days(age_days)))
        .execute(pool)
        .await
        .expect("Should insert lead");
    id
}

pub async fn campaign_budget(pool: &SqlitePool, campaign_id: &str) -> f64 {
    sqlx::query_scalar("SELECT total_budget FROM campaigns WHERE id = ?")
        .bind(campaign_id)
        .fetch_one(pool)
        .await
        .expect("Should read budget")
}

pub async fn count_where(pool: &SqlitePool, table: &str, user_id: &str) -> i64 {
    sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {} WHERE user_id = ?", table))
        .bind(user_id)
        .fetch_one(pool)
        .await
        .expect("Should count rows")
}

pub async fn activity_types(pool: &SqlitePool, user_id: &str) -> Vec<String> {
    sqlx::query_scalar("SELECT activity_type FROM autopilot_activity_log WHERE user_id = ? ORDER BY rowid")
        .bind(user_id)
        .fetch_all(pool)
        .await
        .expect("Should read activity")
}

pub async fn last_optimized_at(pool: &SqlitePool, user_id: &str) -> Option<String> {
    sqlx::query_scalar("SELECT last_optimized_at FROM marketing_autopilot_config WHERE user_id = ?")
        .bind(user_id)
        .fetch_one(pool)
        .await
        .expect("Should read config")
}

/// Make every inbox insert for `user_id` fail
pub async fn break_inbox_for(pool: &SqlitePool, user_id: &str) {
    sqlx::query(&format!(
        "CREATE TRIGGER reject_inbox_{suffix} BEFORE INSERT ON autopilot_lead_inbox \
         WHEN NEW.user_id = '{user}' BEGIN SELECT RAISE(ABORT, 'inbox unavailable'); END",
        suffix = user_id.replace('-', "_"),
        user = user_id
    ))
    .execute(pool)
    .await
    .expect("Should create trigger");
}
