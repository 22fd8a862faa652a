//! Keeps each variable's hourly series at or below a row capacity.

use tracing::warn;

use crate::error::StoreResult;
use crate::models::{Eviction, Variable};
use crate::store::HourlyStore;

// ---

#[derive(Debug, Clone)]
pub struct RetentionManager {
    hourly: HourlyStore,
}

impl RetentionManager {
    // ---
    pub fn new(hourly: HourlyStore) -> Self {
        Self { hourly }
    }

    /// Trim `variable` down to `capacity` rows, oldest first.
    ///
    /// Returns `None` when nothing had to go. The trim is a single statement
    /// keyed on the newest `capacity` rows, so concurrent calls for the same
    /// variable evict the excess once between them. Variables are independent,
    /// so enforcing one never touches another's rows.
    pub async fn enforce(&self, variable: &Variable, capacity: u64) -> StoreResult<Option<Eviction>> {
        // ---
        let count = self.hourly.trim_to_capacity(variable, capacity).await?;
        if count == 0 {
            return Ok(None);
        }

        warn!(
            "Cleared oldest hourly observations. [VARIABLE: {}] [COUNT: {}] [CAPACITY: {}]",
            variable, count, capacity
        );

        Ok(Some(Eviction {
            variable: variable.clone(),
            count,
        }))
    }
}
