//! `campaigns` queries

use mkat_common::db::Campaign;
use mkat_common::Result;
use sqlx::{SqliteConnection, SqlitePool};

const CAMPAIGN_COLUMNS: &str = "id, user_id, name, channel, total_budget, status, auto_managed, \
                                ai_rationale, start_date, end_date";

/// Campaign row to insert
#[derive(Debug, Clone)]
pub struct NewCampaign {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub channel: String,
    pub total_budget: f64,
    pub status: String,
    pub auto_managed: bool,
    pub ai_rationale: Option<String>,
    pub start_date: String,
    pub end_date: String,
}

/// Number of autopilot-owned campaigns for a user (any status)
pub async fn count_auto_managed(pool: &SqlitePool, user_id: &str) -> Result<i64> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM campaigns WHERE user_id = ? AND auto_managed = 1",
    )
    .bind(user_id)
    .fetch_one(pool)
    .await?;

    Ok(count)
}

/// Autopilot-owned campaigns currently in `active` status
pub async fn active_auto_managed(pool: &SqlitePool, user_id: &str) -> Result<Vec<Campaign>> {
    let sql = format!(
        "SELECT {} FROM campaigns WHERE user_id = ? AND auto_managed = 1 AND status = 'active' \
         ORDER BY created_at",
        CAMPAIGN_COLUMNS
    );

    let campaigns = sqlx::query_as::<_, Campaign>(&sql)
        .bind(user_id)
        .fetch_all(pool)
        .await?;

    Ok(campaigns)
}

pub async fn insert_campaign(conn: &mut SqliteConnection, campaign: &NewCampaign, now: &str) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO campaigns (
            id, user_id, name, channel, total_budget, status, auto_managed,
            ai_rationale, start_date, end_date, created_at, updated_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&campaign.id)
    .bind(&campaign.user_id)
    .bind(&campaign.name)
    .bind(&campaign.channel)
    .bind(campaign.total_budget)
    .bind(&campaign.status)
    .bind(campaign.auto_managed)
    .bind(&campaign.ai_rationale)
    .bind(&campaign.start_date)
    .bind(&campaign.end_date)
    .bind(now)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

pub async fn update_budget(
    conn: &mut SqliteConnection,
    campaign_id: &str,
    total_budget: f64,
    now: &str,
) -> Result<()> {
    sqlx::query("UPDATE campaigns SET total_budget = ?, updated_at = ? WHERE id = ?")
        .bind(total_budget)
        .bind(now)
        .bind(campaign_id)
        .execute(&mut *conn)
        .await?;

    Ok(())
}
