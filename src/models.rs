//! Data models for the hourly aggregation pipeline.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---

/// Name of a measured quantity, e.g. `HUMIDITY`.
///
/// Stored as a plain column value on both observation tables, never as a
/// foreign key. Names are trimmed and upper-cased on construction so
/// `humidity` and `HUMIDITY` address the same series.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Variable(String);

impl Variable {
    // ---
    pub const HUMIDITY: &'static str = "HUMIDITY";
    pub const TEMPERATURE: &'static str = "TEMPERATURE";

    pub fn new(name: impl AsRef<str>) -> Self {
        Self(name.as_ref().trim().to_ascii_uppercase())
    }

    pub fn humidity() -> Self {
        Self(Self::HUMIDITY.to_string())
    }

    pub fn temperature() -> Self {
        Self(Self::TEMPERATURE.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Variable {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// One raw sample as stored in the realtime log.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RealtimeObservation {
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    pub variable: Variable,
    pub value: f64,
}

/// Mean of one variable's realtime samples over one UTC hour.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourlyObservation {
    pub id: i64,
    pub bucket: DateTime<Utc>,
    pub variable: Variable,
    pub value: f64,
}

/// Which series a reader wants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Realtime,
    Hourly,
}

/// A single point of either series, shaped for charting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

impl From<RealtimeObservation> for SeriesPoint {
    fn from(obs: RealtimeObservation) -> Self {
        Self {
            timestamp: obs.timestamp,
            value: obs.value,
        }
    }
}

impl From<HourlyObservation> for SeriesPoint {
    fn from(obs: HourlyObservation) -> Self {
        Self {
            timestamp: obs.bucket,
            value: obs.value,
        }
    }
}

/// Hourly rows removed by one retention pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Eviction {
    pub variable: Variable,
    pub count: u64,
}

/// What a single `ingest` call did. Informational only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngestOutcome {
    pub variable: Variable,
    /// Samples already present in the current hour before this one.
    pub count_before_insert: u64,
    pub aggregated: bool,
    pub average_value: Option<f64>,
    pub evicted: Option<Eviction>,
}

/// Decoded two-variable reading handed over by the ingestion source.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct RawSensorReading {
    // ---
    pub humidity: f64,
    pub temperature: f64,
}

impl RawSensorReading {
    // ---
    /// Split into per-variable samples, humidity first.
    pub fn to_samples(&self) -> [(Variable, f64); 2] {
        [
            (Variable::humidity(), self.humidity),
            (Variable::temperature(), self.temperature),
        ]
    }
}
