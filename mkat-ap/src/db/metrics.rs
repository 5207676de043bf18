//! `campaign_metrics` queries

use mkat_common::db::CampaignMetric;
use mkat_common::Result;
use sqlx::SqlitePool;

/// Most recent `limit` daily snapshots for a campaign, newest first
pub async fn recent_metrics(
    pool: &SqlitePool,
    campaign_id: &str,
    limit: i64,
) -> Result<Vec<CampaignMetric>> {
    let metrics = sqlx::query_as::<_, CampaignMetric>(
        r#"
        SELECT campaign_id, metric_date, spend, conversions, conversion_rate
        FROM campaign_metrics
        WHERE campaign_id = ?
        ORDER BY metric_date DESC
        LIMIT ?
        "#,
    )
    .bind(campaign_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(metrics)
}
