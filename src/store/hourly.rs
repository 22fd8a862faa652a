//! Bounded log of per-hour averages.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::error::{is_unique_violation, StoreError, StoreResult};
use crate::models::{HourlyObservation, Variable};
use crate::time;

// ---

#[derive(Debug, Clone)]
pub struct HourlyStore {
    pool: SqlitePool,
}

#[derive(sqlx::FromRow)]
struct HourlyRow {
    id: i64,
    bucket_ms: i64,
    variable: String,
    value: f64,
}

impl TryFrom<HourlyRow> for HourlyObservation {
    type Error = StoreError;

    fn try_from(row: HourlyRow) -> StoreResult<Self> {
        // ---
        let bucket = time::from_millis(row.bucket_ms).ok_or_else(|| {
            StoreError::corrupt_row(
                "observation_hourly",
                format!("row {} has bucket_ms {} out of range", row.id, row.bucket_ms),
            )
        })?;

        Ok(HourlyObservation {
            id: row.id,
            bucket,
            variable: Variable::new(row.variable),
            value: row.value,
        })
    }
}

impl HourlyStore {
    // ---
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert the average for `bucket` (truncated to its hour).
    ///
    /// Returns [`StoreError::DuplicateBucket`] if the hour is already present
    /// for `variable`.
    pub async fn append(
        &self,
        variable: &Variable,
        bucket: DateTime<Utc>,
        value: f64,
    ) -> StoreResult<i64> {
        // ---
        let bucket = time::hour_bucket(bucket);

        let result = sqlx::query(
            r#"
            INSERT INTO observation_hourly (bucket_ms, variable, value)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(bucket.timestamp_millis())
        .bind(variable.as_str())
        .bind(value)
        .execute(&self.pool)
        .await;

        match result {
            Ok(done) => Ok(done.last_insert_rowid()),
            Err(e) if is_unique_violation(&e) => {
                Err(StoreError::duplicate_bucket(variable.as_str(), bucket))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn count_all(&self, variable: &Variable) -> StoreResult<u64> {
        // ---
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM observation_hourly WHERE variable = ?")
                .bind(variable.as_str())
                .fetch_one(&self.pool)
                .await?;

        Ok(count.max(0) as u64)
    }

    /// Delete up to `count` of the oldest rows and return how many went.
    ///
    /// Oldest means earliest bucket, ties broken by id. Asking for more rows
    /// than exist deletes everything and is not an error.
    pub async fn delete_oldest(&self, variable: &Variable, count: u64) -> StoreResult<u64> {
        // ---
        if count == 0 {
            return Ok(0);
        }

        let result = sqlx::query(
            r#"
            DELETE FROM observation_hourly
            WHERE id IN (
                SELECT id FROM observation_hourly
                WHERE variable = ?
                ORDER BY bucket_ms ASC, id ASC
                LIMIT ?
            )
            "#,
        )
        .bind(variable.as_str())
        .bind(i64::try_from(count).unwrap_or(i64::MAX))
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Keep only the newest `capacity` rows for `variable`; returns rows deleted.
    ///
    /// One statement, so two overlapping trims of the same variable can never
    /// remove more than the excess between them.
    pub async fn trim_to_capacity(&self, variable: &Variable, capacity: u64) -> StoreResult<u64> {
        // ---
        let result = sqlx::query(
            r#"
            DELETE FROM observation_hourly
            WHERE variable = ?
              AND id NOT IN (
                SELECT id FROM observation_hourly
                WHERE variable = ?
                ORDER BY bucket_ms DESC, id DESC
                LIMIT ?
              )
            "#,
        )
        .bind(variable.as_str())
        .bind(variable.as_str())
        .bind(i64::try_from(capacity).unwrap_or(i64::MAX))
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    pub async fn exists_for_bucket(
        &self,
        variable: &Variable,
        bucket: DateTime<Utc>,
    ) -> StoreResult<bool> {
        // ---
        let found: i64 = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM observation_hourly
                WHERE variable = ? AND bucket_ms = ?
            )
            "#,
        )
        .bind(variable.as_str())
        .bind(time::hour_bucket(bucket).timestamp_millis())
        .fetch_one(&self.pool)
        .await?;

        Ok(found != 0)
    }

    /// Most recent `n` hours, returned oldest first.
    pub async fn latest_n(&self, variable: &Variable, n: u32) -> StoreResult<Vec<HourlyObservation>> {
        // ---
        let rows: Vec<HourlyRow> = sqlx::query_as(
            r#"
            SELECT id, bucket_ms, variable, value FROM observation_hourly
            WHERE variable = ?
            ORDER BY bucket_ms DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(variable.as_str())
        .bind(i64::from(n))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .rev()
            .map(HourlyObservation::try_from)
            .collect()
    }

    /// Drop the whole hourly series for `variable`.
    pub async fn clear(&self, variable: &Variable) -> StoreResult<u64> {
        // ---
        let result = sqlx::query("DELETE FROM observation_hourly WHERE variable = ?")
            .bind(variable.as_str())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
