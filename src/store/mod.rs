//! Persistence gateway for both observation series.
//!
//! [`Store`] owns the SQLite pool explicitly and hands out cheap per-table
//! views. Nothing in the crate reaches for a global database handle; the
//! aggregator, retention manager and reconciler are all constructed from a
//! `Store` (or one of its views).

use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

use crate::error::StoreResult;
use crate::models::{Frequency, SeriesPoint, Variable};
use crate::schema;

mod hourly;
mod realtime;

pub use hourly::HourlyStore;
pub use realtime::RealtimeStore;

// ---

#[derive(Debug, Clone)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    // ---
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Private in-memory database with the schema applied.
    ///
    /// Every SQLite `:memory:` connection is its own database, so the pool is
    /// pinned to a single connection that is never recycled.
    pub async fn in_memory() -> StoreResult<Self> {
        // ---
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;
        schema::create_schema(&pool).await?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn realtime(&self) -> RealtimeStore {
        RealtimeStore::new(self.pool.clone())
    }

    pub fn hourly(&self) -> HourlyStore {
        HourlyStore::new(self.pool.clone())
    }

    /// Read-only view over the series selected by `frequency`.
    pub fn series(&self, frequency: Frequency) -> Series {
        match frequency {
            Frequency::Realtime => Series::Realtime(self.realtime()),
            Frequency::Hourly => Series::Hourly(self.hourly()),
        }
    }
}

/// One of the two series, carrying the store that backs it.
#[derive(Debug, Clone)]
pub enum Series {
    Realtime(RealtimeStore),
    Hourly(HourlyStore),
}

impl Series {
    // ---
    pub fn frequency(&self) -> Frequency {
        match self {
            Series::Realtime(_) => Frequency::Realtime,
            Series::Hourly(_) => Frequency::Hourly,
        }
    }

    /// Most recent `n` points for `variable`, oldest first.
    pub async fn latest_n(&self, variable: &Variable, n: u32) -> StoreResult<Vec<SeriesPoint>> {
        // ---
        let points = match self {
            Series::Realtime(store) => store
                .latest_n(variable, n)
                .await?
                .into_iter()
                .map(SeriesPoint::from)
                .collect(),
            Series::Hourly(store) => store
                .latest_n(variable, n)
                .await?
                .into_iter()
                .map(SeriesPoint::from)
                .collect(),
        };
        Ok(points)
    }
}

#[cfg(test)]
pub(crate) async fn test_pool() -> SqlitePool {
    // ---
    Store::in_memory()
        .await
        .expect("in-memory store")
        .pool()
        .clone()
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use chrono::{TimeDelta, TimeZone, Utc};

    #[tokio::test]
    async fn test_series_selects_backing_table() {
        // ---
        let store = Store::in_memory().await.unwrap();
        let humidity = Variable::humidity();
        let h = Utc.with_ymd_and_hms(2025, 3, 26, 18, 0, 0).unwrap();

        store
            .realtime()
            .append(&humidity, 40.0, h + TimeDelta::minutes(5))
            .await
            .unwrap();
        store.hourly().append(&humidity, h, 41.0).await.unwrap();

        let realtime = store.series(Frequency::Realtime);
        assert_eq!(realtime.frequency(), Frequency::Realtime);
        let points = realtime.latest_n(&humidity, 10).await.unwrap();
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].value, 40.0);
        assert_eq!(points[0].timestamp, h + TimeDelta::minutes(5));

        let hourly = store.series(Frequency::Hourly);
        let points = hourly.latest_n(&humidity, 10).await.unwrap();
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].value, 41.0);
        assert_eq!(points[0].timestamp, h);
    }
}
