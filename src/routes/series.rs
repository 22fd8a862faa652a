use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use tracing::{debug, error};

use crate::{Config, Frequency, Store, Variable};

const DEFAULT_LIMIT: u32 = 100;
const MAX_LIMIT: u32 = 10_000;

// ---

pub fn router() -> Router<(Store, Config)> {
    // ---
    Router::new().route("/readings/{frequency}/{variable}", get(handler))
}

/// Query parameters for series reads
#[derive(Debug, Deserialize)]
pub struct SeriesQuery {
    limit: Option<u32>,
}

/// Handle `GET /readings/{frequency}/{variable}?limit=N`.
///
/// Returns the latest `limit` points of the selected series, oldest first.
async fn handler(
    Path((frequency, variable)): Path<(Frequency, String)>,
    Query(params): Query<SeriesQuery>,
    State((store, _config)): State<(Store, Config)>,
) -> impl IntoResponse {
    // ---
    let variable = Variable::new(variable);
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT);
    debug!("GET /readings/{:?}/{} limit={}", frequency, variable, limit);

    match store.series(frequency).latest_n(&variable, limit).await {
        Ok(points) => (StatusCode::OK, Json(points)).into_response(),
        Err(e) => {
            error!("Failed to read {:?} series for {}: {}", frequency, variable, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json("Failed to read series"),
            )
                .into_response()
        }
    }
}
