//! Integration tests for the pricing HTTP endpoints that need no database
//!
//! Tests cover:
//! - Health endpoint
//! - Schedule validation (array and encoded tiers, overlap, cap)
//! - Schedule editing through posted edit operations

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use serde_json::{json, Value};
use sqlx::postgres::PgPoolOptions;
use tower::util::ServiceExt; // for `oneshot` method
use tourbook_pricing::cache::AppCache;
use tourbook_pricing::{build_router, AppState};

/// Test helper: Create app over a pool that never connects
fn setup_app() -> axum::Router {
    let pool = PgPoolOptions::new()
        .connect_lazy("postgres://localhost/unused")
        .expect("Lazy pool should build");
    build_router(AppState::new(pool, AppCache::default()))
}

/// Test helper: POST a JSON body
fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Test helper: Extract JSON body from response
async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}

#[tokio::test]
async fn test_health() {
    let response = setup_app()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["cache"]["tours_size"], 0);
}

#[tokio::test]
async fn test_validate_accepts_complete_schedule() {
    let response = setup_app()
        .oneshot(post_json(
            "/api/pricing/schedules/validate",
            json!({
                "maxGroupSize": 15,
                "tiers": [
                    {"minPeople": 1, "maxPeople": 4, "price": "5000"},
                    {"minPeople": 5, "maxPeople": 9, "price": 8000},
                    {"minPeople": 10, "maxPeople": 15, "price": "12000"}
                ]
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["complete"], true);
    assert_eq!(body["tiers"].as_array().map(|t| t.len()), Some(3));
    assert_eq!(body["tiers"][1]["price"], "8000");
}

#[tokio::test]
async fn test_validate_accepts_encoded_tiers() {
    let response = setup_app()
        .oneshot(post_json(
            "/api/pricing/schedules/validate",
            json!({
                "maxGroupSize": 10,
                "tiers": "[{\"minPeople\":1,\"maxPeople\":4,\"price\":\"\"}]"
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(extract_json(response.into_body()).await["complete"], false);
}

#[tokio::test]
async fn test_validate_rejects_overlap() {
    let response = setup_app()
        .oneshot(post_json(
            "/api/pricing/schedules/validate",
            json!({
                "maxGroupSize": 10,
                "tiers": [
                    {"minPeople": 1, "maxPeople": 5, "price": "1"},
                    {"minPeople": 4, "maxPeople": 8, "price": "2"}
                ]
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error_type"], "schedule");
    assert!(body["message"].as_str().unwrap().contains("overlaps"));
}

#[tokio::test]
async fn test_validate_rejects_out_of_cap_and_bad_cap() {
    let response = setup_app()
        .oneshot(post_json(
            "/api/pricing/schedules/validate",
            json!({"maxGroupSize": 6, "tiers": [{"minPeople": 1, "maxPeople": 8, "price": "1"}]}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let response = setup_app()
        .oneshot(post_json("/api/pricing/schedules/validate", json!({"maxGroupSize": 21})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_validate_rejects_malformed_tiers() {
    let response = setup_app()
        .oneshot(post_json(
            "/api/pricing/schedules/validate",
            json!({"maxGroupSize": 10, "tiers": "not json"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(extract_json(response.into_body()).await["error_type"], "parse");
}

#[tokio::test]
async fn test_edit_appends_tier() {
    let response = setup_app()
        .oneshot(post_json(
            "/api/pricing/schedules/edit",
            json!({
                "maxGroupSize": 20,
                "tiers": [{"minPeople": 1, "maxPeople": 4, "price": "5000"}],
                "op": {"type": "append"}
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(
        body["tiers"],
        json!([
            {"minPeople": 1, "maxPeople": 4, "price": "5000"},
            {"minPeople": 5, "maxPeople": 8, "price": ""}
        ])
    );
    assert_eq!(body["complete"], false);
}

#[tokio::test]
async fn test_edit_set_cap_shrinks_schedule() {
    let response = setup_app()
        .oneshot(post_json(
            "/api/pricing/schedules/edit",
            json!({
                "maxGroupSize": 20,
                "tiers": [
                    {"minPeople": 1, "maxPeople": 4, "price": "100"},
                    {"minPeople": 5, "maxPeople": 9, "price": "200"}
                ],
                "op": {"type": "setCap", "cap": 6}
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["maxGroupSize"], 6);
    assert_eq!(body["tiers"][1], json!({"minPeople": 5, "maxPeople": 6, "price": "200"}));
}

#[tokio::test]
async fn test_edit_rejects_invalid_input_schedule() {
    let response = setup_app()
        .oneshot(post_json(
            "/api/pricing/schedules/edit",
            json!({
                "maxGroupSize": 20,
                "tiers": [{"minPeople": 1, "maxPeople": 4294967295u32, "price": "100"}],
                "op": {"type": "append"}
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(extract_json(response.into_body()).await["error_type"], "schedule");
}

#[tokio::test]
async fn test_edit_rejects_overlapping_input() {
    let response = setup_app()
        .oneshot(post_json(
            "/api/pricing/schedules/edit",
            json!({
                "maxGroupSize": 20,
                "tiers": [
                    {"minPeople": 1, "maxPeople": 6, "price": "100"},
                    {"minPeople": 4, "maxPeople": 9, "price": "200"}
                ],
                "op": {"type": "resizeUpper", "index": 0, "maxSize": 3}
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}
