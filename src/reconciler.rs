//! Backfill sweep for hours the aggregator never closed out.
//!
//! An hour is only aggregated on the ingest path if a sample arrives in the
//! following hour. The reconciler walks recent realtime data, finds completed
//! hours with no hourly row and materializes them. It races safely with the
//! aggregator because the hourly store's uniqueness constraint arbitrates.

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info};

use crate::error::StoreResult;
use crate::models::{Eviction, Variable};
use crate::retention::RetentionManager;
use crate::store::Store;
use crate::time;

// ---

/// Result of reconciling one variable.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconcileReport {
    pub variable: Variable,
    /// Completed hours with realtime data inside the lookback window.
    pub buckets_seen: usize,
    /// Hours this run wrote, oldest first.
    pub created: Vec<DateTime<Utc>>,
    pub evicted: Option<Eviction>,
}

#[derive(Debug, Clone)]
pub struct Reconciler {
    store: Store,
    retention: RetentionManager,
    capacity: u64,
}

impl Reconciler {
    // ---
    pub fn new(store: Store, capacity: u64) -> Self {
        let retention = RetentionManager::new(store.hourly());
        Self {
            store,
            retention,
            capacity,
        }
    }

    pub async fn reconcile(&self, variable: &Variable, lookback: TimeDelta) -> StoreResult<ReconcileReport> {
        self.reconcile_at(variable, lookback, Utc::now()).await
    }

    /// Backfill completed hours of `variable` seen within `lookback` of `now`.
    ///
    /// The in-progress hour is left alone. Retention is enforced as soon as
    /// at least one row was created, so backfilled rows count toward the
    /// capacity immediately. Running twice with no new data writes nothing
    /// the second time.
    pub async fn reconcile_at(
        &self,
        variable: &Variable,
        lookback: TimeDelta,
        now: DateTime<Utc>,
    ) -> StoreResult<ReconcileReport> {
        // ---
        let realtime = self.store.realtime();
        let hourly = self.store.hourly();
        let current_hour = time::start_of_current_hour(now);

        let buckets: Vec<DateTime<Utc>> = realtime
            .hour_buckets_since(variable, now - lookback)
            .await?
            .into_iter()
            .filter(|bucket| *bucket < current_hour)
            .collect();

        let mut created = Vec::new();
        for bucket in &buckets {
            if hourly.exists_for_bucket(variable, *bucket).await? {
                continue;
            }
            if self.backfill_bucket(variable, *bucket).await? {
                created.push(*bucket);
            }
        }

        let evicted = if created.is_empty() {
            None
        } else {
            info!(
                "Reconciled hourly observations. [VARIABLE: {}] [CREATED: {}]",
                variable,
                created.len()
            );
            self.retention.enforce(variable, self.capacity).await?
        };

        Ok(ReconcileReport {
            variable: variable.clone(),
            buckets_seen: buckets.len(),
            created,
            evicted,
        })
    }

    /// Write the average for one completed `bucket`; true if a row was created.
    ///
    /// An hour another writer filled first is not an error, the existing row
    /// wins and nothing is written.
    async fn backfill_bucket(&self, variable: &Variable, bucket: DateTime<Utc>) -> StoreResult<bool> {
        // ---
        let Some(average) = self
            .store
            .realtime()
            .average(variable, bucket, time::end_of_bucket(bucket))
            .await?
        else {
            return Ok(false);
        };

        match self.store.hourly().append(variable, bucket, average).await {
            Ok(_) => {
                debug!(
                    "Backfilled hourly. [VARIABLE: {}] [HOUR: {}] [VALUE: {}]",
                    variable, bucket, average
                );
                Ok(true)
            }
            Err(e) if e.is_duplicate_bucket() => {
                debug!(
                    "Lost backfill race, hour already present. [VARIABLE: {}] [HOUR: {}]",
                    variable, bucket
                );
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    /// Reconcile every variable in `variables`, stopping at the first store failure.
    pub async fn sweep(&self, variables: &[Variable], lookback: TimeDelta) -> StoreResult<Vec<ReconcileReport>> {
        // ---
        let mut reports = Vec::with_capacity(variables.len());
        for variable in variables {
            reports.push(self.reconcile(variable, lookback).await?);
        }
        Ok(reports)
    }

    /// Run [`sweep`](Self::sweep) every `period` on the tokio runtime.
    ///
    /// Each tick commits row by row and holds no state across ticks, so
    /// aborting the returned handle at any point leaves the store consistent.
    /// Failures are logged and the next tick tries again.
    pub fn spawn_periodic(
        self,
        variables: Vec<Variable>,
        lookback: TimeDelta,
        period: Duration,
    ) -> JoinHandle<()> {
        // ---
        tokio::spawn(async move {
            let mut ticker = interval(period.max(Duration::from_millis(1)));
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            info!(
                "Reconciler started. [VARIABLES: {}] [PERIOD: {:?}]",
                variables.len(),
                period
            );

            loop {
                ticker.tick().await;
                match self.sweep(&variables, lookback).await {
                    Ok(reports) => {
                        let created: usize = reports.iter().map(|r| r.created.len()).sum();
                        debug!("Reconciler tick complete. [CREATED: {}]", created);
                    }
                    Err(e) => error!("Reconciler tick failed: {}", e),
                }
            }
        })
    }
}
