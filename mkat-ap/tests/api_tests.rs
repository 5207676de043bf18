//! Integration tests for the mkat-ap HTTP API

mod helpers;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use helpers::*;
use mkat_ap::{build_router, AppState};
use serde_json::Value;
use sqlx::SqlitePool;
use tower::util::ServiceExt; // for `oneshot`

const SECRET: &str = "cron-secret";

fn setup_app(db: SqlitePool, secret: Option<&str>) -> (Router, AppState) {
    let state = AppState::new(db, secret.map(str::to_string));
    (build_router(state.clone()), state)
}

fn request(method: &str, uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}

#[tokio::test]
async fn test_health_needs_no_secret() {
    let (app, _) = setup_app(setup_test_db().await, Some(SECRET));

    let response = app.oneshot(request("GET", "/health", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "mkat-ap");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn test_run_rejects_missing_or_wrong_secret() {
    let db = setup_test_db().await;
    let (app, _) = setup_app(db, Some(SECRET));

    let response = app
        .clone()
        .oneshot(request("POST", "/autopilot/run", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .oneshot(request("POST", "/autopilot/run", Some("guess")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_run_reports_each_user() {
    let db = setup_test_db().await;
    let user = new_user_id();
    insert_config(&db, &user, 1000.0, Some(&single_channel_strategy("email", 60.0))).await;
    let (app, _) = setup_app(db.clone(), Some(SECRET));

    let response = app
        .oneshot(request("POST", "/autopilot/run", Some(SECRET)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["processed"], 1);

    let result = &body["results"][0];
    assert_eq!(result["userId"], user.as_str());
    assert_eq!(result["success"], true);
    assert_eq!(result["action"], "bootstrapped");
    assert_eq!(result["campaignsCreated"], 1);
    assert_eq!(result["tasksCreated"], 3);
    assert!(result.get("error").is_none());
}

#[tokio::test]
async fn test_run_with_no_configs_is_empty_success() {
    let (app, _) = setup_app(setup_test_db().await, None);

    let response = app
        .oneshot(request("POST", "/autopilot/run", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["processed"], 0);
    assert_eq!(body["results"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_run_refused_while_cycle_running() {
    let (app, state) = setup_app(setup_test_db().await, None);
    let _held = state.cycle_lock.lock().await;

    let response = app
        .oneshot(request("POST", "/autopilot/run", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"]["code"], "CONFLICT");
}

#[tokio::test]
async fn test_run_single_user() {
    let db = setup_test_db().await;
    let user = new_user_id();
    insert_config(&db, &user, 1000.0, Some(&single_channel_strategy("email", 60.0))).await;
    let (app, _) = setup_app(db.clone(), None);

    let response = app
        .oneshot(request("POST", &format!("/autopilot/run/{}", user), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["userId"], user.as_str());
    assert_eq!(body["action"], "bootstrapped");
    assert!(last_optimized_at(&db, &user).await.is_some());
}

#[tokio::test]
async fn test_run_single_user_errors() {
    let (app, _) = setup_app(setup_test_db().await, None);

    let response = app
        .clone()
        .oneshot(request("POST", "/autopilot/run/not-a-uuid", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .oneshot(request("POST", &format!("/autopilot/run/{}", new_user_id()), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_activity_listing_newest_first() {
    let db = setup_test_db().await;
    let user = new_user_id();
    insert_config(&db, &user, 1000.0, Some(&single_channel_strategy("email", 60.0))).await;
    insert_lead(&db, &user, 1).await;
    let (app, _) = setup_app(db, Some(SECRET));

    app.clone()
        .oneshot(request("POST", "/autopilot/run", Some(SECRET)))
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(request("GET", &format!("/autopilot/activity/{}", user), Some(SECRET)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    let activities = body["activities"].as_array().unwrap();
    assert_eq!(activities.len(), 2);
    assert_eq!(activities[0]["activity_type"], "leads_synced");
    assert_eq!(activities[0]["metadata"]["count"], 1);
    assert_eq!(activities[1]["activity_type"], "campaign_created");
    assert_eq!(activities[1]["entity_type"], "campaign");

    let response = app
        .oneshot(request(
            "GET",
            &format!("/autopilot/activity/{}?limit=1", user),
            Some(SECRET),
        ))
        .await
        .unwrap();
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["activities"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_failures_listing() {
    let db = setup_test_db().await;
    let user = new_user_id();
    insert_config(&db, &user, 1000.0, None).await;
    insert_auto_campaign(&db, &user, 1000.0).await;
    insert_lead(&db, &user, 1).await;
    break_inbox_for(&db, &user).await;
    let (app, _) = setup_app(db, None);

    let response = app
        .clone()
        .oneshot(request("POST", "/autopilot/run", None))
        .await
        .unwrap();
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["results"][0]["success"], false);
    assert!(body["results"][0]["error"].is_string());

    let response = app
        .oneshot(request("GET", &format!("/autopilot/failures/{}", user), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    let failures = body["failures"].as_array().unwrap();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0]["error_kind"], "database");
}
