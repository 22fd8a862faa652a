use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::post, Json, Router};
use tracing::{debug, error, info};

use crate::{Aggregator, Config, RawSensorReading, Store};

// ---

pub fn router() -> Router<(Store, Config)> {
    // ---
    Router::new().route("/readings", post(handler))
}

/// Handle `POST /readings`.
///
/// Ingests both variables of the reading and returns one outcome per
/// variable. Store failures are logged and reported as 500; nothing is
/// retried here.
async fn handler(
    State((store, config)): State<(Store, Config)>,
    Json(reading): Json<RawSensorReading>,
) -> impl IntoResponse {
    // ---
    info!(
        "[HUMIDITY: {}][TEMPERATURE: {}]",
        reading.humidity, reading.temperature
    );

    let aggregator = Aggregator::new(store, config.hourly_capacity);
    match aggregator.ingest_reading(&reading).await {
        Ok(outcomes) => {
            debug!("POST /readings - Returning OK");
            (StatusCode::OK, Json(outcomes)).into_response()
        }
        Err(e) => {
            error!("Failed to ingest reading: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json("Failed to ingest reading"),
            )
                .into_response()
        }
    }
}
