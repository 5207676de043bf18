//! Budget rule evaluation
//!
//! Two threshold rules, checked in order, at most one adjustment per
//! campaign per cycle:
//!
//! 1. Underperforming (low conversion rate, most of the budget already spent):
//!    shrink the budget. No floor is applied.
//! 2. Overperforming (high conversion rate, budget not yet exhausted):
//!    grow the budget, capped at an absolute increase.

use chrono::{DateTime, Utc};
use mkat_common::db::Campaign;
use mkat_common::{time, uuid_utils, Result};
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::{debug, info};

use super::activity::{log_activity, Activity};
use super::aggregator::{summarize, MetricSummary, METRIC_WINDOW_DAYS};
use crate::db::{campaigns, metrics};

/// Thresholds and factors of the two budget rules
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BudgetRules {
    /// Percent; below this a campaign is underperforming
    pub low_conversion_rate: f64,
    /// Fraction of budget spent above which shrinking applies
    pub low_spend_ratio: f64,
    pub decrease_factor: f64,
    /// Percent; above this a campaign is overperforming
    pub high_conversion_rate: f64,
    /// Fraction of budget spent below which growing applies
    pub high_spend_ratio: f64,
    pub increase_factor: f64,
    /// Largest absolute increase per cycle
    pub max_increase: f64,
}

impl Default for BudgetRules {
    fn default() -> Self {
        Self {
            low_conversion_rate: 1.0,
            low_spend_ratio: 0.5,
            decrease_factor: 0.8,
            high_conversion_rate: 3.0,
            high_spend_ratio: 0.7,
            increase_factor: 1.2,
            max_increase: 500.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AdjustmentDirection {
    Decrease,
    Increase,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BudgetAdjustment {
    pub direction: AdjustmentDirection,
    pub previous_budget: f64,
    pub new_budget: f64,
}

impl BudgetRules {
    /// Decide the adjustment for one campaign, if any
    pub fn evaluate(&self, summary: &MetricSummary, budget: f64) -> Option<BudgetAdjustment> {
        if summary.avg_conversion_rate < self.low_conversion_rate
            && summary.total_spend > budget * self.low_spend_ratio
        {
            return Some(BudgetAdjustment {
                direction: AdjustmentDirection::Decrease,
                previous_budget: budget,
                new_budget: budget * self.decrease_factor,
            });
        }

        if summary.avg_conversion_rate > self.high_conversion_rate
            && summary.total_spend < budget * self.high_spend_ratio
        {
            return Some(BudgetAdjustment {
                direction: AdjustmentDirection::Increase,
                previous_budget: budget,
                new_budget: (budget * self.increase_factor).min(budget + self.max_increase),
            });
        }

        None
    }
}

/// Counters from one optimization pass over a user's campaigns
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EvaluationStats {
    pub campaigns_evaluated: usize,
    pub budget_adjustments: usize,
}

/// Applies [`BudgetRules`] to a user's active autopilot campaigns
pub struct BudgetEvaluator {
    db: SqlitePool,
    rules: BudgetRules,
}

impl BudgetEvaluator {
    pub fn new(db: SqlitePool, rules: BudgetRules) -> Self {
        Self { db, rules }
    }

    pub async fn optimize_user(&self, user_id: &str, now: DateTime<Utc>) -> Result<EvaluationStats> {
        let campaigns = campaigns::active_auto_managed(&self.db, user_id).await?;
        let mut stats = EvaluationStats::default();

        for campaign in &campaigns {
            stats.campaigns_evaluated += 1;
            if self.optimize_campaign(campaign, now).await? {
                stats.budget_adjustments += 1;
            }
        }

        Ok(stats)
    }

    /// Returns `true` when the budget changed
    async fn optimize_campaign(&self, campaign: &Campaign, now: DateTime<Utc>) -> Result<bool> {
        let recent = metrics::recent_metrics(&self.db, &campaign.id, METRIC_WINDOW_DAYS).await?;

        let Some(summary) = summarize(&recent) else {
            debug!(campaign_id = %campaign.id, "No metrics yet, skipping");
            return Ok(false);
        };

        let Some(adjustment) = self.rules.evaluate(&summary, campaign.total_budget) else {
            debug!(
                campaign_id = %campaign.id,
                avg_conversion_rate = summary.avg_conversion_rate,
                total_spend = summary.total_spend,
                "Budget unchanged"
            );
            return Ok(false);
        };

        let now = time::to_db_string(now);
        let mut tx = self.db.begin().await?;

        campaigns::update_budget(&mut tx, &campaign.id, adjustment.new_budget, &now).await?;
        log_activity(
            &mut tx,
            &uuid_utils::generate_string(),
            &campaign.user_id,
            &Activity::BudgetAdjusted {
                campaign_id: campaign.id.clone(),
                campaign_name: campaign.name.clone(),
                adjustment,
                summary,
            },
            &now,
        )
        .await?;

        tx.commit().await?;

        info!(
            user_id = %campaign.user_id,
            campaign_id = %campaign.id,
            direction = ?adjustment.direction,
            previous_budget = adjustment.previous_budget,
            new_budget = adjustment.new_budget,
            "Campaign budget adjusted"
        );

        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(rate: f64, spend: f64) -> MetricSummary {
        MetricSummary {
            days: 7,
            avg_conversion_rate: rate,
            total_spend: spend,
            total_conversions: 0,
        }
    }

    #[test]
    fn test_underperformer_shrinks_by_twenty_percent() {
        let rules = BudgetRules::default();
        let adjustment = rules.evaluate(&summary(0.5, 600.0), 1000.0).unwrap();

        assert_eq!(adjustment.direction, AdjustmentDirection::Decrease);
        assert_eq!(adjustment.previous_budget, 1000.0);
        assert_eq!(adjustment.new_budget, 1000.0 * 0.8);
    }

    #[test]
    fn test_low_rate_but_little_spend_is_left_alone() {
        let rules = BudgetRules::default();
        assert_eq!(rules.evaluate(&summary(0.5, 500.0), 1000.0), None);
    }

    #[test]
    fn test_overperformer_grows_by_twenty_percent() {
        let rules = BudgetRules::default();
        let adjustment = rules.evaluate(&summary(3.5, 100.0), 1000.0).unwrap();

        assert_eq!(adjustment.direction, AdjustmentDirection::Increase);
        assert_eq!(adjustment.new_budget, (1000.0f64 * 1.2).min(1000.0 + 500.0));
    }

    #[test]
    fn test_increase_capped_at_five_hundred() {
        let rules = BudgetRules::default();
        let adjustment = rules.evaluate(&summary(4.0, 100.0), 5000.0).unwrap();

        assert_eq!(adjustment.new_budget, 5500.0);
    }

    #[test]
    fn test_high_rate_but_heavy_spend_is_left_alone() {
        let rules = BudgetRules::default();
        assert_eq!(rules.evaluate(&summary(5.0, 700.0), 1000.0), None);
    }

    #[test]
    fn test_thresholds_are_strict() {
        let rules = BudgetRules::default();
        assert_eq!(rules.evaluate(&summary(1.0, 900.0), 1000.0), None);
        assert_eq!(rules.evaluate(&summary(3.0, 10.0), 1000.0), None);
    }

    #[test]
    fn test_middle_band_no_action() {
        let rules = BudgetRules::default();
        assert_eq!(rules.evaluate(&summary(2.0, 400.0), 1000.0), None);
    }

    #[test]
    fn test_repeated_shrinking_has_no_floor() {
        let rules = BudgetRules::default();
        let mut budget = 100.0;
        for _ in 0..20 {
            budget = rules.evaluate(&summary(0.0, budget), budget).unwrap().new_budget;
        }
        assert!(budget > 0.0 && budget < 2.0);
    }

    #[test]
    fn test_custom_rules() {
        let rules = BudgetRules {
            max_increase: 50.0,
            ..BudgetRules::default()
        };
        let adjustment = rules.evaluate(&summary(4.0, 10.0), 1000.0).unwrap();
        assert_eq!(adjustment.new_budget, 1050.0);
    }
}
