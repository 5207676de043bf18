//! Database models
//!
//! Row shapes shared by services. Ids are UUID strings and timestamps are
//! RFC 3339 strings (see [`crate::time`]).

use serde::{Deserialize, Serialize};

/// Per-user autopilot settings (`marketing_autopilot_config`)
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AutopilotConfig {
    pub id: String,
    pub user_id: String,
    pub monthly_budget: f64,
    /// Raw strategy document; parsed by the bootstrapper
    pub ai_strategy: Option<String>,
    pub is_active: bool,
    pub last_optimized_at: Option<String>,
}

/// Campaign lifecycle status
///
/// Transitions are not enforced; humans and the autopilot both write it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CampaignStatus {
    Draft,
    Active,
    Paused,
    Completed,
}

impl CampaignStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Active => "active",
            Self::Paused => "paused",
            Self::Completed => "completed",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Campaign {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub channel: Option<String>,
    pub total_budget: f64,
    pub status: String,
    pub auto_managed: bool,
    pub ai_rationale: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// Immutable per-day performance snapshot
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CampaignMetric {
    pub campaign_id: String,
    pub metric_date: String,
    pub spend: f64,
    pub conversions: i64,
    /// Percent units: 2.5 means 2.5%
    pub conversion_rate: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CampaignTask {
    pub id: String,
    pub campaign_id: String,
    pub user_id: String,
    pub title: String,
    pub description: Option<String>,
    pub status: String,
    pub due_date: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Lead {
    pub id: String,
    pub user_id: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub source: Option<String>,
    pub created_at: String,
}

/// Audit trail row (`autopilot_activity_log`)
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ActivityLogEntry {
    pub id: String,
    pub user_id: String,
    pub activity_type: String,
    pub description: String,
    pub entity_type: Option<String>,
    pub entity_id: Option<String>,
    /// JSON object, shape fixed per `activity_type`
    pub metadata: String,
    pub created_at: String,
}
