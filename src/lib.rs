//! Tourbook pricing service.
//!
//! Resolves the price of a tour or tour option for a group size from tiered
//! schedules, legacy group prices and flat per-unit prices, and serves it to
//! the booking API and the authoring UI.

use axum::{extract::State, routing::get, Json, Router};
use serde_json::json;
use sqlx::PgPool;
use tower::ServiceBuilder;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod pricing;

use cache::AppCache;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,
    /// Tour snapshot cache for display reads
    pub cache: AppCache,
}

impl AppState {
    pub fn new(db: PgPool, cache: AppCache) -> Self {
        Self { db, cache }
    }
}

async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({ "status": "ok", "cache": state.cache.stats() }))
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(pricing::router())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
