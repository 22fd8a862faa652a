//! Error kinds surfaced by the aggregation and retention engine.
//!
//! Only `StoreUnavailable` is fatal to a calling operation. `DuplicateBucket`
//! is raised by the hourly store and recovered by its callers; "no data" is
//! never an error and travels as `Option::None` instead.

use chrono::{DateTime, Utc};

/// Result type used throughout the engine.
pub type StoreResult<T> = Result<T, StoreError>;

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    /// Underlying persistence could not be reached or rejected the statement.
    #[error("Store unavailable: {source}")]
    StoreUnavailable {
        #[from]
        source: sqlx::Error,
    },

    /// An hourly row for `(variable, bucket)` already exists.
    #[error("Hourly bucket {bucket} already aggregated for '{variable}'")]
    DuplicateBucket {
        variable: String,
        bucket: DateTime<Utc>,
    },

    /// A persisted row could not be mapped back to a domain value.
    #[error("Corrupt row in {table}: {message}")]
    CorruptRow { table: &'static str, message: String },
}

impl StoreError {
    // ---
    pub fn duplicate_bucket<S: Into<String>>(variable: S, bucket: DateTime<Utc>) -> Self {
        Self::DuplicateBucket {
            variable: variable.into(),
            bucket,
        }
    }

    pub fn corrupt_row<S: Into<String>>(table: &'static str, message: S) -> Self {
        Self::CorruptRow {
            table,
            message: message.into(),
        }
    }

    pub fn is_duplicate_bucket(&self) -> bool {
        matches!(self, Self::DuplicateBucket { .. })
    }
}

/// True when `err` is the database rejecting a row on a UNIQUE index.
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => db.is_unique_violation(),
        _ => false,
    }
}
