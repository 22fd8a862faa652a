//! Per-sample ingestion with first-sample-of-the-hour aggregation.
//!
//! The first sample a variable receives in a new UTC hour closes out the
//! previous hour: its realtime samples are averaged and written to the
//! hourly store, then retention trims that variable's hourly series. No
//! background scheduler is needed for the common case; hours that never see
//! a triggering sample are picked up by the [`Reconciler`](crate::Reconciler).

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::error::StoreResult;
use crate::models::{IngestOutcome, RawSensorReading, Variable};
use crate::retention::RetentionManager;
use crate::store::Store;
use crate::time;

// ---

#[derive(Debug, Clone)]
pub struct Aggregator {
    store: Store,
    retention: RetentionManager,
    capacity: u64,
}

impl Aggregator {
    // ---
    /// `capacity` is the hourly row budget enforced per variable.
    pub fn new(store: Store, capacity: u64) -> Self {
        let retention = RetentionManager::new(store.hourly());
        Self {
            store,
            retention,
            capacity,
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    /// Ingest one sample stamped with the current time.
    pub async fn ingest(&self, variable: &Variable, value: f64) -> StoreResult<IngestOutcome> {
        self.ingest_at(variable, value, Utc::now()).await
    }

    /// Ingest one sample stamped `now`.
    ///
    /// A `StoreUnavailable` failure aborts the call and is returned as-is.
    /// An empty previous hour and an already-aggregated bucket are both
    /// normal outcomes.
    pub async fn ingest_at(
        &self,
        variable: &Variable,
        value: f64,
        now: DateTime<Utc>,
    ) -> StoreResult<IngestOutcome> {
        // ---
        let realtime = self.store.realtime();
        let current_hour = time::start_of_current_hour(now);

        let count_before_insert = realtime.count_since(variable, current_hour).await?;
        realtime.append(variable, value, now).await?;

        let mut outcome = IngestOutcome {
            variable: variable.clone(),
            count_before_insert,
            aggregated: false,
            average_value: None,
            evicted: None,
        };

        if count_before_insert > 0 {
            return Ok(outcome);
        }

        let previous_hour = time::start_of_previous_hour(now);
        let Some(average) = realtime.average(variable, previous_hour, current_hour).await? else {
            debug!(
                "No samples in previous hour, skipping aggregation. [VARIABLE: {}] [HOUR: {}]",
                variable, previous_hour
            );
            return Ok(outcome);
        };

        match self.store.hourly().append(variable, previous_hour, average).await {
            Ok(_) => {}
            Err(e) if e.is_duplicate_bucket() => {
                debug!(
                    "Hour already aggregated, keeping existing row. [VARIABLE: {}] [HOUR: {}]",
                    variable, previous_hour
                );
            }
            Err(e) => return Err(e),
        }

        info!(
            "Averaged hourly. [VARIABLE: {}] [HOUR: {}] [VALUE: {}]",
            variable, previous_hour, average
        );

        outcome.aggregated = true;
        outcome.average_value = Some(average);
        outcome.evicted = self.retention.enforce(variable, self.capacity).await?;

        Ok(outcome)
    }

    /// Ingest both variables of a decoded reading, humidity first.
    pub async fn ingest_reading(&self, reading: &RawSensorReading) -> StoreResult<Vec<IngestOutcome>> {
        self.ingest_reading_at(reading, Utc::now()).await
    }

    pub async fn ingest_reading_at(
        &self,
        reading: &RawSensorReading,
        now: DateTime<Utc>,
    ) -> StoreResult<Vec<IngestOutcome>> {
        // ---
        let mut outcomes = Vec::with_capacity(2);
        for (variable, value) in reading.to_samples() {
            outcomes.push(self.ingest_at(&variable, value, now).await?);
        }
        Ok(outcomes)
    }
}
