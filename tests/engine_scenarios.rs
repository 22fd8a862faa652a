use std::collections::HashSet;

use anyhow::Result;
use chrono::{DateTime, TimeDelta, TimeZone, Utc};

use sensorflow_hourly::{Aggregator, Reconciler, RetentionManager, Store, Variable};

fn hour(n: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 21, 0, 0, 0).unwrap() + TimeDelta::hours(n)
}

fn at(h: i64, minute: i64) -> DateTime<Utc> {
    hour(h) + TimeDelta::minutes(minute)
}

#[tokio::test]
async fn three_samples_then_next_hour_average_to_42() -> Result<()> {
    // ---
    let store = Store::in_memory().await?;
    let agg = Aggregator::new(store.clone(), 720);
    let humidity = Variable::humidity();

    agg.ingest_at(&humidity, 40.0, at(7, 5)).await?;
    agg.ingest_at(&humidity, 42.0, at(7, 25)).await?;
    agg.ingest_at(&humidity, 44.0, at(7, 45)).await?;
    let outcome = agg.ingest_at(&humidity, 10.0, at(8, 1)).await?;

    assert!(outcome.aggregated);
    assert_eq!(outcome.average_value, Some(42.0));

    let rows = store.hourly().latest_n(&humidity, 10).await?;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].bucket, hour(7));
    assert_eq!(rows[0].value, 42.0);
    Ok(())
}

#[tokio::test]
async fn capacity_two_keeps_the_two_most_recent_hours() -> Result<()> {
    // ---
    let store = Store::in_memory().await?;
    let agg = Aggregator::new(store.clone(), 2);
    let temperature = Variable::temperature();

    // hours 0..=2 get aggregated when hours 1..=3 start
    for h in 0..=3 {
        agg.ingest_at(&temperature, 20.0 + h as f64, at(h, 30)).await?;
    }

    assert_eq!(store.hourly().count_all(&temperature).await?, 2);
    let buckets: Vec<DateTime<Utc>> = store
        .hourly()
        .latest_n(&temperature, 10)
        .await?
        .into_iter()
        .map(|o| o.bucket)
        .collect();
    assert_eq!(buckets, vec![hour(1), hour(2)]);
    Ok(())
}

#[tokio::test]
async fn offline_previous_hour_writes_nothing() -> Result<()> {
    // ---
    let store = Store::in_memory().await?;
    let agg = Aggregator::new(store.clone(), 720);
    let humidity = Variable::humidity();

    agg.ingest_at(&humidity, 40.0, at(1, 0)).await?;
    let outcome = agg.ingest_at(&humidity, 41.0, at(5, 0)).await?;

    assert!(!outcome.aggregated);
    assert_eq!(outcome.average_value, None);
    assert_eq!(store.hourly().count_all(&humidity).await?, 0);
    Ok(())
}

#[tokio::test]
async fn reconcile_fills_skipped_hour_but_not_the_gap() -> Result<()> {
    // ---
    let store = Store::in_memory().await?;
    let agg = Aggregator::new(store.clone(), 720);
    let reconciler = Reconciler::new(store.clone(), 720);
    let humidity = Variable::humidity();

    agg.ingest_at(&humidity, 40.0, at(1, 10)).await?;
    agg.ingest_at(&humidity, 50.0, at(1, 40)).await?;
    // hours 2 and 3 are silent
    agg.ingest_at(&humidity, 60.0, at(4, 0)).await?;
    assert_eq!(store.hourly().count_all(&humidity).await?, 0);

    let report = reconciler
        .reconcile_at(&humidity, TimeDelta::hours(24), at(4, 30))
        .await?;
    assert_eq!(report.created, vec![hour(1)]);

    let rows = store.hourly().latest_n(&humidity, 10).await?;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].value, 45.0);
    for gap in [hour(2), hour(3)] {
        assert!(!store.hourly().exists_for_bucket(&humidity, gap).await?);
    }

    let again = reconciler
        .reconcile_at(&humidity, TimeDelta::hours(24), at(4, 30))
        .await?;
    assert!(again.created.is_empty());
    Ok(())
}

#[tokio::test]
async fn interleaved_ingest_and_reconcile_never_duplicate_buckets() -> Result<()> {
    // ---
    let store = Store::in_memory().await?;
    let agg = Aggregator::new(store.clone(), 720);
    let reconciler = Reconciler::new(store.clone(), 720);
    let variables = [Variable::humidity(), Variable::temperature()];

    for h in 0..12 {
        for (i, variable) in variables.iter().enumerate() {
            for minute in [0, 20, 40] {
                agg.ingest_at(variable, (h * 10 + minute) as f64, at(h, minute + i as i64))
                    .await?;
            }
            if h % 3 == 0 {
                reconciler
                    .reconcile_at(variable, TimeDelta::hours(24), at(h, 50))
                    .await?;
            }
        }
    }

    for variable in &variables {
        let rows = store.hourly().latest_n(variable, 100).await?;
        let unique: HashSet<DateTime<Utc>> = rows.iter().map(|r| r.bucket).collect();
        assert_eq!(unique.len(), rows.len());
        // hours 0..=10 are closed, hour 11 is still open
        assert_eq!(rows.len(), 11);
    }
    Ok(())
}

#[tokio::test]
async fn enforce_bounds_every_variable() -> Result<()> {
    // ---
    let store = Store::in_memory().await?;
    let retention = RetentionManager::new(store.hourly());
    let variables = [Variable::humidity(), Variable::temperature(), Variable::new("pressure")];

    for (i, variable) in variables.iter().enumerate() {
        for h in 0..(5 + i as i64 * 3) {
            store.hourly().append(variable, hour(h), h as f64).await?;
        }
    }

    for capacity in [6_u64, 3, 1] {
        for variable in &variables {
            retention.enforce(variable, capacity).await?;
            assert!(store.hourly().count_all(variable).await? <= capacity);
        }
    }
    Ok(())
}
