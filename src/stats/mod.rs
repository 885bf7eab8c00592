//! Anonymized visit and channel-play statistics
//!
//! The store keeps one aggregate bucket per UTC calendar day and writes it
//! through one of two interchangeable backends: a SQL database (SQLite or
//! PostgreSQL) when one is configured and reachable, or a local JSON file
//! otherwise. Failover is per call and driven by a connectivity flag that
//! only lifecycle events may flip.

pub mod backend;
pub mod fingerprint;
pub mod health;
pub mod local;
pub mod models;
pub mod postgres;
pub mod sqlite;
pub mod store;

pub use backend::{StatsBackend, StatsError, StatsResult};
pub use fingerprint::Fingerprinter;
pub use health::{spawn_monitor, BackendHealth};
pub use local::LocalStatsStore;
pub use models::{
    ChannelPlay, DailyBucket, DayStats, StorageKind, SummaryStats, VisitReceipt,
    MAX_RANKED_CHANNELS, TOP_CHANNELS_LIMIT,
};
pub use postgres::PostgresStatsStore;
pub use sqlite::SqliteStatsStore;
pub use store::{StatsStore, DEFAULT_STATS_DAYS};

use chrono::Utc;

/// Today's UTC date key (`YYYY-MM-DD`).
pub(crate) fn today() -> String {
    Utc::now().format("%Y-%m-%d").to_string()
}

/// Oldest date still inside the retention window; buckets dated strictly
/// before it are eligible for deletion.
pub(crate) fn retention_cutoff(retention_days: u32) -> String {
    (Utc::now() - chrono::Duration::days(i64::from(retention_days)))
        .format("%Y-%m-%d")
        .to_string()
}
