//! Activity logging
//!
//! Every mutation the cycle makes appends one audit entry. The variant of
//! [`Activity`] fixes the `activity_type`, the entity reference and the
//! metadata keys, so all entries of one type share a shape.

use mkat_common::db::ActivityLogEntry;
use mkat_common::{Error, Result};
use serde_json::{json, Value};
use sqlx::{SqliteConnection, SqlitePool};

use super::aggregator::MetricSummary;
use super::evaluator::{AdjustmentDirection, BudgetAdjustment};

/// Default page size for [`recent_activity`]
pub const DEFAULT_ACTIVITY_LIMIT: i64 = 50;

/// Upper bound on a single activity read
pub const MAX_ACTIVITY_LIMIT: i64 = 500;

#[derive(Debug, Clone, PartialEq)]
pub enum Activity {
    CampaignCreated {
        campaign_id: String,
        campaign_name: String,
        channel: String,
        budget: f64,
        budget_percentage: f64,
    },
    BudgetAdjusted {
        campaign_id: String,
        campaign_name: String,
        adjustment: BudgetAdjustment,
        summary: MetricSummary,
    },
    LeadsSynced {
        count: usize,
        lead_ids: Vec<String>,
    },
}

impl Activity {
    pub fn activity_type(&self) -> &'static str {
        match self {
            Activity::CampaignCreated { .. } => "campaign_created",
            Activity::BudgetAdjusted { adjustment, .. } => match adjustment.direction {
                AdjustmentDirection::Decrease => "budget_decreased",
                AdjustmentDirection::Increase => "budget_increased",
            },
            Activity::LeadsSynced { .. } => "leads_synced",
        }
    }

    pub fn description(&self) -> String {
        match self {
            Activity::CampaignCreated {
                campaign_name,
                budget,
                budget_percentage,
                ..
            } => format!(
                "Created {} with ${:.2} budget ({}% of monthly budget)",
                campaign_name, budget, budget_percentage
            ),
            Activity::BudgetAdjusted {
                campaign_name,
                adjustment,
                summary,
                ..
            } => {
                let verb = match adjustment.direction {
                    AdjustmentDirection::Decrease => "Decreased",
                    AdjustmentDirection::Increase => "Increased",
                };
                format!(
                    "{} budget for {} from ${:.2} to ${:.2} (avg conversion rate {:.2}%)",
                    verb,
                    campaign_name,
                    adjustment.previous_budget,
                    adjustment.new_budget,
                    summary.avg_conversion_rate
                )
            }
            Activity::LeadsSynced { count, .. } => {
                format!("Added {} new lead(s) to the autopilot inbox", count)
            }
        }
    }

    /// `(entity_type, entity_id)`
    pub fn entity(&self) -> (Option<&'static str>, Option<&str>) {
        match self {
            Activity::CampaignCreated { campaign_id, .. }
            | Activity::BudgetAdjusted { campaign_id, .. } => {
                (Some("campaign"), Some(campaign_id.as_str()))
            }
            Activity::LeadsSynced { .. } => (Some("lead_inbox"), None),
        }
    }

    pub fn metadata(&self) -> Value {
        match self {
            Activity::CampaignCreated {
                channel,
                budget,
                budget_percentage,
                ..
            } => json!({
                "channel": channel,
                "budget": budget,
                "budget_percentage": budget_percentage,
            }),
            Activity::BudgetAdjusted {
                adjustment,
                summary,
                ..
            } => json!({
                "previous_budget": adjustment.previous_budget,
                "new_budget": adjustment.new_budget,
                "avg_conversion_rate": summary.avg_conversion_rate,
                "total_spend": summary.total_spend,
                "total_conversions": summary.total_conversions,
                "days": summary.days,
            }),
            Activity::LeadsSynced { count, lead_ids } => json!({
                "count": count,
                "lead_ids": lead_ids,
            }),
        }
    }
}

/// Append one activity entry
pub async fn log_activity(
    conn: &mut SqliteConnection,
    entry_id: &str,
    user_id: &str,
    activity: &Activity,
    now: &str,
) -> Result<()> {
    let (entity_type, entity_id) = activity.entity();
    let metadata = serde_json::to_string(&activity.metadata())
        .map_err(|e| Error::Internal(format!("Failed to serialize activity metadata: {}", e)))?;

    sqlx::query(
        r#"
        INSERT INTO autopilot_activity_log (
            id, user_id, activity_type, description, entity_type, entity_id, metadata, created_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(entry_id)
    .bind(user_id)
    .bind(activity.activity_type())
    .bind(activity.description())
    .bind(entity_type)
    .bind(entity_id)
    .bind(metadata)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Newest-first activity for a user; `limit` is clamped to `1..=MAX_ACTIVITY_LIMIT`
pub async fn recent_activity(
    pool: &SqlitePool,
    user_id: &str,
    limit: i64,
) -> Result<Vec<ActivityLogEntry>> {
    let entries = sqlx::query_as::<_, ActivityLogEntry>(
        r#"
        SELECT id, user_id, activity_type, description, entity_type, entity_id, metadata, created_at
        FROM autopilot_activity_log
        WHERE user_id = ?
        ORDER BY created_at DESC, rowid DESC
        LIMIT ?
        "#,
    )
    .bind(user_id)
    .bind(limit.clamp(1, MAX_ACTIVITY_LIMIT))
    .fetch_all(pool)
    .await?;

    Ok(entries)
}
