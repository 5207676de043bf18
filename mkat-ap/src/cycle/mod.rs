//! Daily autopilot optimization cycle
//!
//! For every active autopilot config, strictly one user after another:
//!
//! 1. No autopilot-owned campaigns yet → bootstrap them from the AI strategy;
//!    otherwise → apply the budget rules to each active autopilot campaign
//! 2. Sync recent leads into the autopilot inbox
//! 3. Stamp `last_optimized_at`
//!
//! A failure while processing one user is logged, recorded in the
//! dead-letter table and reported in that user's result; the loop then moves
//! on. Nothing is retried.

pub mod activity;
pub mod aggregator;
pub mod bootstrapper;
pub mod evaluator;
pub mod lead_sync;

use chrono::{DateTime, Utc};
use mkat_common::db::AutopilotConfig;
use mkat_common::{time, uuid_utils, Error, Result};
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::{error, info};

use crate::db::{campaigns, configs, failures};
use bootstrapper::{BootstrapOutcome, CampaignBootstrapper};
use evaluator::BudgetEvaluator;
use lead_sync::LeadInboxSync;

pub use evaluator::BudgetRules;

/// What the cycle did for a user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleAction {
    Bootstrapped,
    Optimized,
    SkippedInvalidStrategy,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserOutcome {
    pub action: CycleAction,
    pub campaigns_created: usize,
    pub tasks_created: usize,
    pub campaigns_evaluated: usize,
    pub budget_adjustments: usize,
    pub leads_synced: usize,
}

impl UserOutcome {
    fn new(action: CycleAction) -> Self {
        Self {
            action,
            campaigns_created: 0,
            tasks_created: 0,
            campaigns_evaluated: 0,
            budget_adjustments: 0,
            leads_synced: 0,
        }
    }
}

/// One entry of the batch result
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserCycleResult {
    pub user_id: String,
    pub success: bool,
    #[serde(flatten)]
    pub outcome: Option<UserOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl UserCycleResult {
    fn succeeded(user_id: &str, outcome: UserOutcome) -> Self {
        Self {
            user_id: user_id.to_string(),
            success: true,
            outcome: Some(outcome),
            error: None,
        }
    }

    fn failed(user_id: &str, err: &Error) -> Self {
        Self {
            user_id: user_id.to_string(),
            success: false,
            outcome: None,
            error: Some(err.to_string()),
        }
    }
}

/// Response of a batch run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CycleReport {
    pub success: bool,
    pub processed: usize,
    pub results: Vec<UserCycleResult>,
}

/// The cycle with its collaborators injected
#[derive(Clone)]
pub struct AutopilotCycle {
    db: SqlitePool,
    rules: BudgetRules,
}

impl AutopilotCycle {
    pub fn new(db: SqlitePool, rules: BudgetRules) -> Self {
        Self { db, rules }
    }

    /// Process every active config, sequentially
    pub async fn run_all(&self) -> Result<CycleReport> {
        let configs = configs::active_configs(&self.db).await?;
        info!(active_configs = configs.len(), "Autopilot cycle started");

        let mut results = Vec::with_capacity(configs.len());
        for config in &configs {
            results.push(self.run_config(config, time::now()).await);
        }

        let failed = results.iter().filter(|r| !r.success).count();
        info!(processed = results.len(), failed, "Autopilot cycle finished");

        Ok(CycleReport {
            success: true,
            processed: results.len(),
            results,
        })
    }

    /// Process a single user's active config
    pub async fn run_for_user(&self, user_id: &str) -> Result<UserCycleResult> {
        let config = configs::active_config_for_user(&self.db, user_id)
            .await?
            .ok_or_else(|| {
                Error::NotFound(format!("No active autopilot config for user {}", user_id))
            })?;

        Ok(self.run_config(&config, time::now()).await)
    }

    /// Process one config, capturing failures into the result
    pub async fn run_config(&self, config: &AutopilotConfig, now: DateTime<Utc>) -> UserCycleResult {
        match self.process_config(config, now).await {
            Ok(outcome) => UserCycleResult::succeeded(&config.user_id, outcome),
            Err(e) => {
                error!(
                    user_id = %config.user_id,
                    error_kind = e.kind(),
                    transient = e.is_transient(),
                    error = %e,
                    "Autopilot cycle failed for user"
                );
                self.dead_letter(&config.user_id, &e, now).await;
                UserCycleResult::failed(&config.user_id, &e)
            }
        }
    }

    async fn process_config(&self, config: &AutopilotConfig, now: DateTime<Utc>) -> Result<UserOutcome> {
        let existing = campaigns::count_auto_managed(&self.db, &config.user_id).await?;

        let mut outcome = if existing == 0 {
            let bootstrapper = CampaignBootstrapper::new(self.db.clone());
            match bootstrapper.bootstrap(config, now).await? {
                BootstrapOutcome::Created {
                    campaigns_created,
                    tasks_created,
                } => UserOutcome {
                    campaigns_created,
                    tasks_created,
                    ..UserOutcome::new(CycleAction::Bootstrapped)
                },
                BootstrapOutcome::InvalidStrategy(_) => {
                    UserOutcome::new(CycleAction::SkippedInvalidStrategy)
                }
            }
        } else {
            let evaluator = BudgetEvaluator::new(self.db.clone(), self.rules);
            let stats = evaluator.optimize_user(&config.user_id, now).await?;
            UserOutcome {
                campaigns_evaluated: stats.campaigns_evaluated,
                budget_adjustments: stats.budget_adjustments,
                ..UserOutcome::new(CycleAction::Optimized)
            }
        };

        outcome.leads_synced = LeadInboxSync::new(self.db.clone())
            .sync_user(&config.user_id, now)
            .await?;

        configs::mark_optimized(&self.db, &config.id, &time::to_db_string(now)).await?;

        Ok(outcome)
    }

    async fn dead_letter(&self, user_id: &str, err: &Error, now: DateTime<Utc>) {
        let failure = failures::CycleFailure {
            id: uuid_utils::generate_string(),
            user_id: user_id.to_string(),
            error_kind: err.kind().to_string(),
            error: err.to_string(),
            failed_at: time::to_db_string(now),
        };

        if let Err(e) = failures::record_failure(&self.db, &failure).await {
            error!(user_id = %user_id, error = %e, "Failed to record cycle failure");
        }
    }
}
