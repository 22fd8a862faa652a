//! HTTP gateway (EMBP): merges every sub-router and attaches shared state.
//!
//! - `POST /readings` – ingestion boundary, one decoded reading per call
//! - `GET /readings/{frequency}/{variable}` – read-only series for charts
//! - `GET /health` – liveness

use axum::Router;

use crate::{Config, Store};

mod health;
mod ingest;
mod series;

// ---

pub fn router(store: Store, config: Config) -> Router {
    // ---
    Router::new()
        .merge(ingest::router())
        .merge(series::router())
        .merge(health::router())
        .with_state((store, config))
}
