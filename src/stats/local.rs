//! Flat-file statistics backend
//!
//! The whole multi-day collection lives in one JSON document keyed by date.
//! Every write reads the document, mutates today's bucket, prunes expired
//! days and rewrites the file. A single mutex serializes access so
//! concurrent writers cannot lose each other's increments.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tokio::sync::Mutex;
use tracing::warn;

use crate::stats::backend::{StatsBackend, StatsResult};
use crate::stats::models::{ChannelPlay, DailyBucket};
use crate::stats::retention_cutoff;

/// Bucket as it sits in the JSON file; the date lives in the map key.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredBucket {
    visits: i64,
    unique_visitors: Vec<String>,
    channels_played: i64,
    popular_channels: Vec<ChannelPlay>,
    user_agents: Vec<String>,
    created_at: i64,
    updated_at: i64,
}

impl StoredBucket {
    fn into_bucket(self, date: &str) -> DailyBucket {
        DailyBucket {
            date: date.to_string(),
            visits: self.visits,
            unique_visitors: self.unique_visitors,
            channels_played: self.channels_played,
            popular_channels: self.popular_channels,
            user_agents: self.user_agents,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    fn from_bucket(bucket: &DailyBucket) -> Self {
        Self {
            visits: bucket.visits,
            unique_visitors: bucket.unique_visitors.clone(),
            channels_played: bucket.channels_played,
            popular_channels: bucket.popular_channels.clone(),
            user_agents: bucket.user_agents.clone(),
            created_at: bucket.created_at,
            updated_at: bucket.updated_at,
        }
    }
}

pub struct LocalStatsStore {
    path: PathBuf,
    retention_days: u32,
    // Guards the read-modify-write cycle on the JSON file.
    lock: Mutex<()>,
}

impl LocalStatsStore {
    pub fn new(path: PathBuf, retention_days: u32) -> Self {
        Self {
            path,
            retention_days,
            lock: Mutex::new(()),
        }
    }

    /// Read the whole collection; a missing or unparseable file counts as
    /// an empty store and never propagates an error.
    async fn read_all(&self) -> BTreeMap<String, StoredBucket> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => match serde_json::from_slice(&bytes) {
                Ok(all) => all,
                Err(e) => {
                    warn!(
                        "Statistics file {} is unreadable, starting fresh: {e}",
                        self.path.display()
                    );
                    BTreeMap::new()
                }
            },
            Err(_) => BTreeMap::new(),
        }
    }

    async fn write_all(&self, all: &BTreeMap<String, StoredBucket>) -> StatsResult<()> {
        let bytes = serde_json::to_vec_pretty(all)?;
        tokio::fs::write(&self.path, bytes).await?;
        Ok(())
    }
}

#[async_trait]
impl StatsBackend for LocalStatsStore {
    async fn init(&self) -> StatsResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        Ok(())
    }

    async fn ping(&self) -> StatsResult<()> {
        Ok(())
    }

    async fn record_visit(
        &self,
        date: &str,
        fingerprint: &str,
        user_agent: &str,
        channel_name: Option<&str>,
    ) -> StatsResult<DailyBucket> {
        let _guard = self.lock.lock().await;

        let mut all = self.read_all().await;

        let mut bucket = all
            .remove(date)
            .map(|stored| stored.into_bucket(date))
            .unwrap_or_else(|| DailyBucket::new(date));
        bucket.apply_visit(fingerprint, user_agent, channel_name);
        all.insert(date.to_string(), StoredBucket::from_bucket(&bucket));

        // Inline retention: drop expired days before persisting so the file
        // never grows past the window. Dates sort lexicographically.
        let cutoff = retention_cutoff(self.retention_days);
        all.retain(|day, _| day.as_str() >= cutoff.as_str());

        self.write_all(&all).await?;

        Ok(bucket)
    }

    async fn recent_days(&self, limit: u32) -> StatsResult<Vec<DailyBucket>> {
        let _guard = self.lock.lock().await;

        let all = self.read_all().await;
        Ok(all
            .into_iter()
            .rev()
            .take(limit as usize)
            .map(|(date, stored)| stored.into_bucket(&date))
            .collect())
    }

    async fn purge_older_than(&self, cutoff_date: &str) -> StatsResult<u64> {
        let _guard = self.lock.lock().await;

        let mut all = self.read_all().await;
        let before = all.len();
        all.retain(|day, _| day.as_str() >= cutoff_date);
        let removed = (before - all.len()) as u64;

        if removed > 0 {
            self.write_all(&all).await?;
        }

        Ok(removed)
    }
}
