//! Application entry point for the `sensorflow-hourly` service.
//!
//! This binary orchestrates the full startup sequence:
//! - Loading configuration from environment variables or `.env`
//! - Initializing structured logging/tracing
//! - Opening the embedded SQLite store and creating the schema
//! - Starting the periodic hourly reconciler
//! - Mounting all routes via the `routes` gateway (EMBP pattern)
//! - Binding the Axum HTTP server and serving requests
//!
//! # Environment Variables
//! - `DATABASE_URL` (**required**) – SQLite connection string
//! - `HOURLY_CAPACITY`, `RECONCILE_LOOKBACK_HOURS`, `RECONCILE_INTERVAL_SECS`,
//!   `DB_POOL_MAX`, `BIND_PORT` (optional) – see `config`
//! - `RUST_LOG`, `SENSORFLOW_LOG_LEVEL`, `SENSORFLOW_SPAN_EVENTS`,
//!   `FORCE_COLOR` (optional) – see `telemetry`
use std::net::SocketAddr;

use axum::Router;
use dotenvy::dotenv;
use sqlx::sqlite::SqlitePoolOptions;

use anyhow::Result;

use sensorflow_hourly::{config, routes, schema, telemetry, Reconciler, Store, Variable};

// ---

#[tokio::main]
async fn main() -> Result<()> {
    // ---
    dotenv().ok();
    telemetry::init()?;

    let cfg = config::load_from_env()?;
    cfg.log_config();

    tracing::info!("Opening database: {}", cfg.db_url);

    let pool = SqlitePoolOptions::new()
        .max_connections(cfg.db_pool_max)
        .connect(&cfg.db_url)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to open database '{}': {}", cfg.db_url, e))?;

    schema::create_schema(&pool).await?;
    tracing::info!("Database ready");

    let store = Store::new(pool);

    let reconciler = match cfg.reconcile_interval() {
        Some(period) => Some(Reconciler::new(store.clone(), cfg.hourly_capacity).spawn_periodic(
            vec![Variable::humidity(), Variable::temperature()],
            cfg.reconcile_lookback(),
            period,
        )),
        None => {
            tracing::info!("Periodic reconciliation disabled");
            None
        }
    };

    // Build app from routes gateway (EMBP)
    let app: Router = routes::router(store, cfg.clone());

    let addr = SocketAddr::from(([0, 0, 0, 0], cfg.bind_port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let served = axum::serve(listener, app).await;

    if let Some(handle) = reconciler {
        handle.abort();
    }
    served?;

    Ok(())
}
