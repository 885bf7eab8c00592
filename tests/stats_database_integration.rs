//! Integration tests for the SQLite statistics backend

use chrono::{Duration, Utc};
use std::sync::Arc;

use tvgrid::stats::{SqliteStatsStore, StatsBackend, MAX_RANKED_CHANNELS};

async fn setup_backend() -> Arc<SqliteStatsStore> {
    let backend = SqliteStatsStore::new("sqlite::memory:", 1).await.unwrap();
    backend.init().await.unwrap();
    Arc::new(backend)
}

fn day_key(days_ago: i64) -> String {
    (Utc::now() - Duration::days(days_ago))
        .format("%Y-%m-%d")
        .to_string()
}

#[tokio::test]
async fn test_record_visit_creates_and_updates_bucket() {
    let backend = setup_backend().await;
    let today = day_key(0);

    let first = backend
        .record_visit(&today, "fp1", "UA1", Some("BBC"))
        .await
        .unwrap();
    assert_eq!(first.visits, 1);
    assert_eq!(first.unique_visitors, vec!["fp1".to_string()]);
    assert_eq!(first.channels_played, 1);

    let second = backend
        .record_visit(&today, "fp1", "UA1", Some("BBC"))
        .await
        .unwrap();
    assert_eq!(second.visits, 2);
    assert_eq!(second.unique_visitors.len(), 1);
    assert_eq!(second.channels_played, 2);
    assert_eq!(second.popular_channels.len(), 1);
    assert_eq!(second.popular_channels[0].play_count, 2);
    assert_eq!(second.user_agents.len(), 2);
}

#[tokio::test]
async fn test_distinct_fingerprints_accumulate() {
    let backend = setup_backend().await;
    let today = day_key(0);

    backend
        .record_visit(&today, "fp1", "UA1", None)
        .await
        .unwrap();
    let bucket = backend
        .record_visit(&today, "fp2", "UA2", None)
        .await
        .unwrap();

    assert_eq!(bucket.visits, 2);
    assert_eq!(bucket.unique_visitors.len(), 2);
    assert_eq!(bucket.channels_played, 0);
}

#[tokio::test]
async fn test_bucket_round_trips_json_columns() {
    let backend = setup_backend().await;
    let today = day_key(0);

    backend
        .record_visit(&today, "fp1", "Mozilla/5.0", Some("BBC One"))
        .await
        .unwrap();

    let buckets = backend.recent_days(1).await.unwrap();
    assert_eq!(buckets.len(), 1);
    let bucket = &buckets[0];
    assert_eq!(bucket.date, today);
    assert_eq!(bucket.unique_visitors, vec!["fp1".to_string()]);
    assert_eq!(bucket.popular_channels[0].name, "BBC One");
    assert_eq!(bucket.user_agents, vec!["Mozilla/5.0".to_string()]);
}

#[tokio::test]
async fn test_recent_days_newest_first_with_limit() {
    let backend = setup_backend().await;

    for days_ago in [3, 1, 2, 0] {
        backend
            .record_visit(&day_key(days_ago), "fp", "UA", None)
            .await
            .unwrap();
    }

    let buckets = backend.recent_days(3).await.unwrap();
    assert_eq!(buckets.len(), 3);
    assert_eq!(buckets[0].date, day_key(0));
    assert_eq!(buckets[1].date, day_key(1));
    assert_eq!(buckets[2].date, day_key(2));
}

#[tokio::test]
async fn test_purge_older_than_cutoff() {
    let backend = setup_backend().await;

    backend
        .record_visit(&day_key(40), "fp", "UA", None)
        .await
        .unwrap();
    backend
        .record_visit(&day_key(35), "fp", "UA", None)
        .await
        .unwrap();
    backend
        .record_visit(&day_key(5), "fp", "UA", None)
        .await
        .unwrap();

    let removed = backend.purge_older_than(&day_key(30)).await.unwrap();
    assert_eq!(removed, 2);

    let buckets = backend.recent_days(50).await.unwrap();
    assert_eq!(buckets.len(), 1);
    assert_eq!(buckets[0].date, day_key(5));

    // A second purge finds nothing left to delete.
    assert_eq!(backend.purge_older_than(&day_key(30)).await.unwrap(), 0);
}

#[tokio::test]
async fn test_ranking_capped_in_database() {
    let backend = setup_backend().await;
    let today = day_key(0);

    for _ in 0..5 {
        backend
            .record_visit(&today, "fp", "UA", Some("Favourite"))
            .await
            .unwrap();
    }
    for i in 0..60 {
        let name = format!("Channel {i}");
        backend
            .record_visit(&today, "fp", "UA", Some(name.as_str()))
            .await
            .unwrap();
    }

    let buckets = backend.recent_days(1).await.unwrap();
    assert!(buckets[0].popular_channels.len() <= MAX_RANKED_CHANNELS);
    assert!(buckets[0]
        .popular_channels
        .iter()
        .any(|c| c.name == "Favourite" && c.play_count == 5));
}

#[tokio::test]
async fn test_ping_succeeds_on_live_pool() {
    let backend = setup_backend().await;
    backend.ping().await.unwrap();
}
