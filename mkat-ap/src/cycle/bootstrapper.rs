//! Campaign bootstrapping
//!
//! On a user's first cycle (no autopilot-owned campaigns yet) the stored AI
//! strategy is expanded into one campaign per channel plus its follow-up
//! tasks. The whole set is written in one transaction: either every
//! campaign and task lands or none does.

use chrono::{DateTime, Utc};
use mkat_common::db::{AutopilotConfig, CampaignStatus, CampaignTask};
use mkat_common::{time, uuid_utils, Error, Result};
use serde::Deserialize;
use sqlx::SqlitePool;
use tracing::{info, warn};

use super::activity::{log_activity, Activity};
use crate::db::campaigns::{self, NewCampaign};
use crate::db::tasks;

/// Length of a bootstrapped campaign's window
pub const CAMPAIGN_DURATION_DAYS: i64 = 30;

/// Follow-up tasks created for every new campaign: (title, description, due in days)
pub const FOLLOW_UP_TASKS: [(&str, &str, i64); 3] = [
    ("Set up targeting", "Define audience targeting for the campaign", 1),
    ("Create ad content", "Produce creatives and copy for the campaign", 2),
    ("Launch campaign", "Review settings and launch the campaign", 3),
];

/// Stored strategy document (`marketing_autopilot_config.ai_strategy`)
#[derive(Debug, Clone, Deserialize)]
pub struct AiStrategy {
    pub channels: Vec<ChannelAllocation>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChannelAllocation {
    pub name: String,
    #[serde(rename = "budgetPercentage")]
    pub budget_percentage: f64,
    #[serde(default)]
    pub rationale: Option<String>,
}

impl AiStrategy {
    /// Parse and sanity-check a strategy document
    ///
    /// At least one channel is required. Percentages are not required to
    /// sum to 100.
    pub fn parse(raw: Option<&str>) -> Result<Self> {
        let raw = raw
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| Error::InvalidInput("No AI strategy stored".to_string()))?;

        let strategy: AiStrategy = serde_json::from_str(raw)
            .map_err(|e| Error::InvalidInput(format!("Malformed AI strategy: {}", e)))?;

        if strategy.channels.is_empty() {
            return Err(Error::InvalidInput("AI strategy allocates no channels".to_string()));
        }

        for channel in &strategy.channels {
            if channel.name.trim().is_empty() {
                return Err(Error::InvalidInput("Channel with empty name".to_string()));
            }
            if !channel.budget_percentage.is_finite() || channel.budget_percentage < 0.0 {
                return Err(Error::InvalidInput(format!(
                    "Channel '{}' has invalid budget percentage {}",
                    channel.name, channel.budget_percentage
                )));
            }
        }

        Ok(strategy)
    }

    pub fn total_percentage(&self) -> f64 {
        self.channels.iter().map(|c| c.budget_percentage).sum()
    }
}

/// Result of a bootstrap attempt
#[derive(Debug, Clone, PartialEq)]
pub enum BootstrapOutcome {
    Created {
        campaigns_created: usize,
        tasks_created: usize,
    },
    /// Strategy missing or malformed; nothing written
    InvalidStrategy(String),
}

/// `"email"` → `"Email Campaign"`
pub fn campaign_name(channel: &str) -> String {
    let channel = channel.trim();
    let mut chars = channel.chars();
    match chars.next() {
        Some(first) => format!("{}{} Campaign", first.to_uppercase(), chars.as_str()),
        None => "Campaign".to_string(),
    }
}

pub struct CampaignBootstrapper {
    db: SqlitePool,
}

impl CampaignBootstrapper {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    pub async fn bootstrap(
        &self,
        config: &AutopilotConfig,
        now: DateTime<Utc>,
    ) -> Result<BootstrapOutcome> {
        let strategy = match AiStrategy::parse(config.ai_strategy.as_deref()) {
            Ok(strategy) => strategy,
            Err(e) => {
                warn!(user_id = %config.user_id, error = %e, "Skipping bootstrap: invalid AI strategy");
                return Ok(BootstrapOutcome::InvalidStrategy(e.to_string()));
            }
        };

        if strategy.total_percentage() > 100.0 {
            warn!(
                user_id = %config.user_id,
                total_percentage = strategy.total_percentage(),
                "AI strategy allocates more than the monthly budget"
            );
        }

        let now_str = time::to_db_string(now);
        let end_date = time::days_after(now, CAMPAIGN_DURATION_DAYS);
        let mut campaigns_created = 0;
        let mut tasks_created = 0;

        let mut tx = self.db.begin().await?;

        for channel in &strategy.channels {
            let campaign = NewCampaign {
                id: uuid_utils::generate_string(),
                user_id: config.user_id.clone(),
                name: campaign_name(&channel.name),
                channel: channel.name.clone(),
                total_budget: config.monthly_budget * channel.budget_percentage / 100.0,
                status: CampaignStatus::Active.as_str().to_string(),
                auto_managed: true,
                ai_rationale: channel.rationale.clone(),
                start_date: now_str.clone(),
                end_date: end_date.clone(),
            };

            campaigns::insert_campaign(&mut tx, &campaign, &now_str).await?;
            campaigns_created += 1;

            for (title, description, due_in_days) in FOLLOW_UP_TASKS {
                let task = CampaignTask {
                    id: uuid_utils::generate_string(),
                    campaign_id: campaign.id.clone(),
                    user_id: config.user_id.clone(),
                    title: title.to_string(),
                    description: Some(description.to_string()),
                    status: "pending".to_string(),
                    due_date: Some(time::days_after(now, due_in_days)),
                };
                tasks::insert_task(&mut tx, &task, &now_str).await?;
                tasks_created += 1;
            }

            log_activity(
                &mut tx,
                &uuid_utils::generate_string(),
                &config.user_id,
                &Activity::CampaignCreated {
                    campaign_id: campaign.id.clone(),
                    campaign_name: campaign.name.clone(),
                    channel: campaign.channel.clone(),
                    budget: campaign.total_budget,
                    budget_percentage: channel.budget_percentage,
                },
                &now_str,
            )
            .await?;
        }

        tx.commit().await?;

        info!(
            user_id = %config.user_id,
            campaigns_created,
            tasks_created,
            "Bootstrapped autopilot campaigns"
        );

        Ok(BootstrapOutcome::Created {
            campaigns_created,
            tasks_created,
        })
    }
}
