use async_trait::async_trait;
use thiserror::Error;

use crate::stats::models::DailyBucket;

#[derive(Debug, Error)]
pub enum StatsError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type StatsResult<T> = Result<T, StatsError>;

/// One statistics backend: a durable database or the local JSON file.
///
/// Implementations own their atomicity: the SQL stores run the
/// read-modify-write inside a transaction, the file store serializes
/// writers behind a mutex.
#[async_trait]
pub trait StatsBackend: Send + Sync {
    /// Prepare the backing storage (create tables, parent directories).
    async fn init(&self) -> StatsResult<()>;

    /// Cheap liveness probe, used by the connectivity monitor.
    async fn ping(&self) -> StatsResult<()>;

    /// Apply one visit to the bucket for `date`, creating the bucket if it
    /// does not exist yet, and return the updated bucket.
    async fn record_visit(
        &self,
        date: &str,
        fingerprint: &str,
        user_agent: &str,
        channel_name: Option<&str>,
    ) -> StatsResult<DailyBucket>;

    /// The most recent `limit` buckets, newest first.
    async fn recent_days(&self, limit: u32) -> StatsResult<Vec<DailyBucket>>;

    /// Delete buckets dated strictly before `cutoff_date` (`YYYY-MM-DD`);
    /// returns how many were removed.
    async fn purge_older_than(&self, cutoff_date: &str) -> StatsResult<u64>;
}

/// Row shape shared by the SQL backends; the ranking and visitor arrays are
/// stored as JSON text columns.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct StatsRow {
    pub date: String,
    pub visits: i64,
    pub unique_visitors: String,
    pub channels_played: i64,
    pub popular_channels: String,
    pub user_agents: String,
    pub created_at: i64,
    pub updated_at: i64,
}

impl StatsRow {
    pub(crate) fn into_bucket(self) -> StatsResult<DailyBucket> {
        Ok(DailyBucket {
            date: self.date,
            visits: self.visits,
            unique_visitors: serde_json::from_str(&self.unique_visitors)?,
            channels_played: self.channels_played,
            popular_channels: serde_json::from_str(&self.popular_channels)?,
            user_agents: serde_json::from_str(&self.user_agents)?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}
