//! Hourly aggregation and retention engine for a two-variable sensor stream.
//!
//! Realtime samples are appended to an embedded SQLite log. The first sample
//! a variable receives in a new UTC hour closes out the previous hour into the
//! hourly series, which is then trimmed to a fixed capacity. A reconciler
//! backfills hours the ingest path never closed.
//!
//! Gateway modules (EMBP): callers use the re-exports below rather than
//! reaching into submodules.

pub mod aggregator;
pub mod config;
pub mod error;
pub mod models;
pub mod reconciler;
pub mod retention;
pub mod routes;
pub mod schema;
pub mod store;
pub mod telemetry;
pub mod time;

pub use aggregator::Aggregator;
pub use config::Config;
pub use error::{StoreError, StoreResult};
pub use models::{
    Eviction, Frequency, HourlyObservation, IngestOutcome, RawSensorReading, RealtimeObservation,
    SeriesPoint, Variable,
};
pub use reconciler::{ReconcileReport, Reconciler};
pub use retention::RetentionManager;
pub use store::{HourlyStore, RealtimeStore, Series, Store};
