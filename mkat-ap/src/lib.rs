//! mkat-ap library - marketing autopilot service
//!
//! Runs the daily optimization cycle over every active autopilot config,
//! either on an HTTP trigger or on an in-process schedule.

use std::sync::Arc;

use axum::Router;
use sqlx::SqlitePool;
use tokio::sync::Mutex;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod config;
pub mod cycle;
pub mod db;
pub mod error;
pub mod scheduler;

pub use crate::error::{ApiError, ApiResult};

use crate::cycle::{AutopilotCycle, BudgetRules};

/// Application state shared across handlers and the scheduler
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub cycle: AutopilotCycle,
    /// Held for the duration of a cycle; a second trigger is refused
    pub cycle_lock: Arc<Mutex<()>>,
    /// `None` disables trigger authentication
    pub trigger_secret: Option<String>,
}

impl AppState {
    pub fn new(db: SqlitePool, trigger_secret: Option<String>) -> Self {
        Self::with_rules(db, BudgetRules::default(), trigger_secret)
    }

    pub fn with_rules(db: SqlitePool, rules: BudgetRules, trigger_secret: Option<String>) -> Self {
        Self {
            cycle: AutopilotCycle::new(db.clone(), rules),
            db,
            cycle_lock: Arc::new(Mutex::new(())),
            trigger_secret,
        }
    }
}

/// Build application router
///
/// `/health` is public; everything under `/autopilot` needs the trigger secret.
pub fn build_router(state: AppState) -> Router {
    use axum::middleware;

    let protected = api::autopilot_routes().layer(middleware::from_fn_with_state(
        state.clone(),
        api::auth_middleware,
    ));

    Router::new()
        .merge(protected)
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
