// src/routes/health.rs
//! Health check endpoint.
//!
//! Reports whether the process is up and whether the embedded store still
//! answers a trivial query. Exports a sub-router to the gateway (`mod.rs`).

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::Serialize;
use tracing::warn;

use crate::{Config, Store};

/// JSON response body for the `/health` endpoint.
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    store: &'static str,
}

/// Handle `GET /health`.
///
/// 200 with `store: "ok"` when `SELECT 1` succeeds, otherwise 503 with
/// `store: "unavailable"`.
async fn health(State((store, _config)): State<(Store, Config)>) -> (StatusCode, Json<HealthResponse>) {
    // ---
    match sqlx::query("SELECT 1").execute(store.pool()).await {
        Ok(_) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "ok",
                store: "ok",
            }),
        ),
        Err(e) => {
            warn!("Health check could not reach store: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "degraded",
                    store: "unavailable",
                }),
            )
        }
    }
}

/// Create a subrouter containing the `/health` route.
pub fn router() -> Router<(Store, Config)> {
    Router::new().route("/health", get(health))
}
