//! Canonical hour-boundary arithmetic.
//!
//! Hours are wall-clock aligned to `:00` in UTC. The aggregator and the
//! reconciler both bucket through [`hour_bucket`] so they can never disagree
//! about which hour a sample belongs to.

use chrono::{DateTime, TimeDelta, Utc};

pub const MILLIS_PER_HOUR: i64 = 3_600_000;

// ---

/// Truncate `ts` to the start of its UTC hour.
pub fn hour_bucket(ts: DateTime<Utc>) -> DateTime<Utc> {
    // ---
    let into_hour = ts.timestamp_millis().rem_euclid(MILLIS_PER_HOUR);
    let sub_millis = i64::from(ts.timestamp_subsec_nanos() % 1_000_000);
    ts - TimeDelta::milliseconds(into_hour) - TimeDelta::nanoseconds(sub_millis)
}

pub fn start_of_current_hour(now: DateTime<Utc>) -> DateTime<Utc> {
    hour_bucket(now)
}

pub fn start_of_previous_hour(now: DateTime<Utc>) -> DateTime<Utc> {
    hour_bucket(now) - TimeDelta::hours(1)
}

/// Exclusive end of the hour starting at `bucket`.
pub fn end_of_bucket(bucket: DateTime<Utc>) -> DateTime<Utc> {
    bucket + TimeDelta::hours(1)
}

/// Decode a persisted epoch-millisecond timestamp.
pub fn from_millis(ms: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ms)
}
