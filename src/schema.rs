//! Database schema management for `sensorflow-hourly`.
//!
//! Ensures required tables and indexes exist before ingesting or serving.
//! Applied once on startup from `main.rs` (EMBP: single gateway call).

use sqlx::SqlitePool;

// ---

/// Create or update the database schema (idempotent).
///
/// Creates `observation_realtime` for raw samples and `observation_hourly`
/// for per-hour averages. Timestamps are UTC epoch milliseconds. The unique
/// index on `(variable, bucket_ms)` is what turns a second insert for the same
/// hour into `DuplicateBucket`.
pub async fn create_schema(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    // ---
    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS observation_realtime (
            id            INTEGER PRIMARY KEY AUTOINCREMENT,
            timestamp_ms  INTEGER NOT NULL,
            variable      TEXT    NOT NULL,
            value         REAL    NOT NULL
        );
        "#,
    )
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS observation_hourly (
            id            INTEGER PRIMARY KEY AUTOINCREMENT,
            bucket_ms     INTEGER NOT NULL,
            variable      TEXT    NOT NULL,
            value         REAL    NOT NULL
        );
        "#,
    )
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_observation_realtime_variable_time
            ON observation_realtime (variable, timestamp_ms);
        "#,
    )
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        CREATE UNIQUE INDEX IF NOT EXISTS idx_observation_hourly_variable_bucket
            ON observation_hourly (variable, bucket_ms);
        "#,
    )
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(())
}
