//! Append-only log of raw samples.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::error::{StoreError, StoreResult};
use crate::models::{RealtimeObservation, Variable};
use crate::time;

// ---

#[derive(Debug, Clone)]
pub struct RealtimeStore {
    pool: SqlitePool,
}

#[derive(sqlx::FromRow)]
struct RealtimeRow {
    id: i64,
    timestamp_ms: i64,
    variable: String,
    value: f64,
}

impl TryFrom<RealtimeRow> for RealtimeObservation {
    type Error = StoreError;

    fn try_from(row: RealtimeRow) -> StoreResult<Self> {
        // ---
        let timestamp = time::from_millis(row.timestamp_ms).ok_or_else(|| {
            StoreError::corrupt_row(
                "observation_realtime",
                format!("row {} has timestamp_ms {} out of range", row.id, row.timestamp_ms),
            )
        })?;

        Ok(RealtimeObservation {
            id: row.id,
            timestamp,
            variable: Variable::new(row.variable),
            value: row.value,
        })
    }
}

impl RealtimeStore {
    // ---
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Persist one sample and return its id.
    pub async fn append(
        &self,
        variable: &Variable,
        value: f64,
        timestamp: DateTime<Utc>,
    ) -> StoreResult<i64> {
        // ---
        let result = sqlx::query(
            r#"
            INSERT INTO observation_realtime (timestamp_ms, variable, value)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(timestamp.timestamp_millis())
        .bind(variable.as_str())
        .bind(value)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Samples for `variable` with a timestamp at or after `since`.
    pub async fn count_since(&self, variable: &Variable, since: DateTime<Utc>) -> StoreResult<u64> {
        // ---
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM observation_realtime
            WHERE variable = ? AND timestamp_ms >= ?
            "#,
        )
        .bind(variable.as_str())
        .bind(since.timestamp_millis())
        .fetch_one(&self.pool)
        .await?;

        Ok(count.max(0) as u64)
    }

    /// Mean over `[from, to)`, or `None` when the window holds no samples.
    pub async fn average(
        &self,
        variable: &Variable,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> StoreResult<Option<f64>> {
        // ---
        let avg: Option<f64> = sqlx::query_scalar(
            r#"
            SELECT AVG(value) FROM observation_realtime
            WHERE variable = ? AND timestamp_ms >= ? AND timestamp_ms < ?
            "#,
        )
        .bind(variable.as_str())
        .bind(from.timestamp_millis())
        .bind(to.timestamp_millis())
        .fetch_one(&self.pool)
        .await?;

        Ok(avg)
    }

    /// Most recent `n` samples, returned oldest first.
    pub async fn latest_n(&self, variable: &Variable, n: u32) -> StoreResult<Vec<RealtimeObservation>> {
        // ---
        let rows: Vec<RealtimeRow> = sqlx::query_as(
            r#"
            SELECT id, timestamp_ms, variable, value FROM observation_realtime
            WHERE variable = ?
            ORDER BY timestamp_ms DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(variable.as_str())
        .bind(i64::from(n))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .rev()
            .map(RealtimeObservation::try_from)
            .collect()
    }

    /// Distinct hour buckets holding samples for `variable` at or after `since`, ascending.
    ///
    /// Deduplicated in SQL so a sweep reads one row per hour, not one per
    /// sample. Each value is passed through [`time::hour_bucket`] on the way
    /// out so the canonical truncation still decides the bucket.
    pub async fn hour_buckets_since(
        &self,
        variable: &Variable,
        since: DateTime<Utc>,
    ) -> StoreResult<Vec<DateTime<Utc>>> {
        // ---
        let millis: Vec<i64> = sqlx::query_scalar(
            r#"
            SELECT DISTINCT timestamp_ms - (((timestamp_ms % ?) + ?) % ?) AS bucket_ms
            FROM observation_realtime
            WHERE variable = ? AND timestamp_ms >= ?
            ORDER BY bucket_ms ASC
            "#,
        )
        .bind(time::MILLIS_PER_HOUR)
        .bind(time::MILLIS_PER_HOUR)
        .bind(time::MILLIS_PER_HOUR)
        .bind(variable.as_str())
        .bind(since.timestamp_millis())
        .fetch_all(&self.pool)
        .await?;

        let mut buckets = Vec::with_capacity(millis.len());
        for ms in millis {
            let ts = time::from_millis(ms).ok_or_else(|| {
                StoreError::corrupt_row("observation_realtime", format!("bucket_ms {ms} out of range"))
            })?;
            let bucket = time::hour_bucket(ts);
            if buckets.last() != Some(&bucket) {
                buckets.push(bucket);
            }
        }
        Ok(buckets)
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use crate::store::test_pool;
    use chrono::{TimeDelta, TimeZone};
    use tokio_test::assert_ok;

    fn hour() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 26, 18, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_append_assigns_increasing_ids() {
        // ---
        let store = RealtimeStore::new(test_pool().await);
        let humidity = Variable::humidity();

        let first = assert_ok!(store.append(&humidity, 40.0, hour()).await);
        let second = assert_ok!(store.append(&humidity, 41.0, hour()).await);
        assert!(second > first);
    }

    #[tokio::test]
    async fn test_count_since_is_per_variable() {
        // ---
        let store = RealtimeStore::new(test_pool().await);
        let humidity = Variable::humidity();
        let temperature = Variable::temperature();

        store.append(&humidity, 40.0, hour() - TimeDelta::minutes(1)).await.unwrap();
        store.append(&humidity, 41.0, hour()).await.unwrap();
        store.append(&humidity, 42.0, hour() + TimeDelta::minutes(30)).await.unwrap();
        store.append(&temperature, 20.0, hour() + TimeDelta::minutes(30)).await.unwrap();

        assert_eq!(store.count_since(&humidity, hour()).await.unwrap(), 2);
        assert_eq!(store.count_since(&temperature, hour()).await.unwrap(), 1);
        assert_eq!(
            store.count_since(&humidity, hour() + TimeDelta::hours(1)).await.unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn test_average_window_is_half_open() {
        // ---
        let store = RealtimeStore::new(test_pool().await);
        let humidity = Variable::humidity();
        let next = hour() + TimeDelta::hours(1);

        store.append(&humidity, 40.0, hour()).await.unwrap();
        store.append(&humidity, 44.0, next - TimeDelta::milliseconds(1)).await.unwrap();
        store.append(&humidity, 100.0, next).await.unwrap();

        let avg = store.average(&humidity, hour(), next).await.unwrap();
        assert_eq!(avg, Some(42.0));
    }

    #[tokio::test]
    async fn test_average_of_empty_window_is_absent() {
        // ---
        let store = RealtimeStore::new(test_pool().await);
        let humidity = Variable::humidity();
        store.append(&humidity, 0.0, hour()).await.unwrap();

        // zero is a real average, an empty window is not
        let zero = store.average(&humidity, hour(), hour() + TimeDelta::hours(1)).await.unwrap();
        assert_eq!(zero, Some(0.0));

        let empty = store
            .average(&humidity, hour() - TimeDelta::hours(1), hour())
            .await
            .unwrap();
        assert_eq!(empty, None);
    }

    #[tokio::test]
    async fn test_latest_n_is_chronological_and_bounded() {
        // ---
        let store = RealtimeStore::new(test_pool().await);
        let humidity = Variable::humidity();

        for i in 0..5 {
            store
                .append(&humidity, f64::from(i), hour() + TimeDelta::minutes(i64::from(i)))
                .await
                .unwrap();
        }

        let latest = store.latest_n(&humidity, 3).await.unwrap();
        let values: Vec<f64> = latest.iter().map(|o| o.value).collect();
        assert_eq!(values, vec![2.0, 3.0, 4.0]);
        assert!(latest.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));

        assert_eq!(store.latest_n(&humidity, 50).await.unwrap().len(), 5);
        assert!(store.latest_n(&Variable::temperature(), 3).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_hour_buckets_are_distinct_and_sorted() {
        // ---
        let store = RealtimeStore::new(test_pool().await);
        let humidity = Variable::humidity();

        for minute in [50, 5, 30, 59] {
            store.append(&humidity, 1.0, hour() + TimeDelta::minutes(minute)).await.unwrap();
        }
        store.append(&humidity, 1.0, hour() + TimeDelta::minutes(61)).await.unwrap();
        store.append(&humidity, 1.0, hour() - TimeDelta::hours(3)).await.unwrap();
        store.append(&Variable::temperature(), 1.0, hour() + TimeDelta::hours(2)).await.unwrap();

        let buckets = store.hour_buckets_since(&humidity, hour()).await.unwrap();
        assert_eq!(buckets, vec![hour(), hour() + TimeDelta::hours(1)]);
    }

    #[tokio::test]
    async fn test_hour_buckets_before_epoch() {
        // ---
        let store = RealtimeStore::new(test_pool().await);
        let humidity = Variable::humidity();
        let ts = Utc.with_ymd_and_hms(1969, 12, 31, 23, 30, 0).unwrap();
        store.append(&humidity, 1.0, ts).await.unwrap();

        let since = ts - TimeDelta::hours(1);
        let buckets = store.hour_buckets_since(&humidity, since).await.unwrap();
        assert_eq!(buckets, vec![Utc.with_ymd_and_hms(1969, 12, 31, 23, 0, 0).unwrap()]);
    }
}
