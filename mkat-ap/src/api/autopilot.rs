//! Autopilot trigger and inspection endpoints
//!
//! POST /autopilot/run, POST /autopilot/run/:user_id,
//! GET /autopilot/activity/:user_id, GET /autopilot/failures/:user_id

use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use mkat_common::db::ActivityLogEntry;
use mkat_common::uuid_utils;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::cycle::activity::{self, DEFAULT_ACTIVITY_LIMIT, MAX_ACTIVITY_LIMIT};
use crate::cycle::{CycleReport, UserCycleResult};
use crate::db::failures::{self, CycleFailure};
use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<i64>,
}

impl LimitQuery {
    fn resolved(&self) -> i64 {
        self.limit
            .unwrap_or(DEFAULT_ACTIVITY_LIMIT)
            .clamp(1, MAX_ACTIVITY_LIMIT)
    }
}

/// Activity entry with its metadata decoded
#[derive(Debug, Serialize)]
pub struct ActivityResponse {
    pub id: String,
    pub activity_type: String,
    pub description: String,
    pub entity_type: Option<String>,
    pub entity_id: Option<String>,
    pub metadata: Value,
    pub created_at: String,
}

impl From<ActivityLogEntry> for ActivityResponse {
    fn from(entry: ActivityLogEntry) -> Self {
        let metadata =
            serde_json::from_str(&entry.metadata).unwrap_or(Value::String(entry.metadata));
        Self {
            id: entry.id,
            activity_type: entry.activity_type,
            description: entry.description,
            entity_type: entry.entity_type,
            entity_id: entry.entity_id,
            metadata,
            created_at: entry.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ActivityListResponse {
    pub user_id: String,
    pub activities: Vec<ActivityResponse>,
}

#[derive(Debug, Serialize)]
pub struct FailureListResponse {
    pub user_id: String,
    pub failures: Vec<CycleFailure>,
}

fn validate_user_id(user_id: &str) -> ApiResult<()> {
    uuid_utils::parse(user_id)
        .map(|_| ())
        .map_err(|_| ApiError::BadRequest(format!("Invalid user id: {}", user_id)))
}

/// POST /autopilot/run
///
/// Runs the cycle for every active config. 409 if a cycle is in progress.
pub async fn run_all(State(state): State<AppState>) -> ApiResult<Json<CycleReport>> {
    let _guard = state
        .cycle_lock
        .try_lock()
        .map_err(|_| ApiError::Conflict("Autopilot cycle already running".to_string()))?;

    info!("Autopilot cycle triggered over HTTP");
    let report = state.cycle.run_all().await?;

    Ok(Json(report))
}

/// POST /autopilot/run/:user_id
pub async fn run_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<UserCycleResult>> {
    validate_user_id(&user_id)?;

    let _guard = state
        .cycle_lock
        .try_lock()
        .map_err(|_| ApiError::Conflict("Autopilot cycle already running".to_string()))?;

    info!(user_id = %user_id, "Single-user autopilot cycle triggered over HTTP");
    let result = state.cycle.run_for_user(&user_id).await?;

    Ok(Json(result))
}

/// GET /autopilot/activity/:user_id?limit=N
pub async fn get_activity(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(query): Query<LimitQuery>,
) -> ApiResult<Json<ActivityListResponse>> {
    validate_user_id(&user_id)?;

    let entries = activity::recent_activity(&state.db, &user_id, query.resolved()).await?;

    Ok(Json(ActivityListResponse {
        user_id,
        activities: entries.into_iter().map(ActivityResponse::from).collect(),
    }))
}

/// GET /autopilot/failures/:user_id?limit=N
pub async fn get_failures(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(query): Query<LimitQuery>,
) -> ApiResult<Json<FailureListResponse>> {
    validate_user_id(&user_id)?;

    let failures = failures::failures_for_user(&state.db, &user_id, query.resolved()).await?;

    Ok(Json(FailureListResponse { user_id, failures }))
}

pub fn autopilot_routes() -> Router<AppState> {
    Router::new()
        .route("/autopilot/run", post(run_all))
        .route("/autopilot/run/:user_id", post(run_user))
        .route("/autopilot/activity/:user_id", get(get_activity))
        .route("/autopilot/failures/:user_id", get(get_failures))
}
