//! Dual-backend statistics store
//!
//! Every operation picks a backend at call time: the durable database when
//! the health flag says it is reachable, the local JSON file otherwise. A
//! database failure mid-call falls back to the file for that call only —
//! the flag itself is owned by the connectivity monitor.

use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::stats::backend::{StatsBackend, StatsResult};
use crate::stats::fingerprint::Fingerprinter;
use crate::stats::health::BackendHealth;
use crate::stats::local::LocalStatsStore;
use crate::stats::models::{
    ChannelPlay, DayStats, StorageKind, SummaryStats, VisitReceipt, TOP_CHANNELS_LIMIT,
};
use crate::stats::{retention_cutoff, today};

/// Window reduced by `get_summary_stats`.
const SUMMARY_WINDOW_DAYS: u32 = 30;

/// Days returned by the stats endpoints when none are requested.
pub const DEFAULT_STATS_DAYS: u32 = 7;

pub struct StatsStore {
    durable: Option<Arc<dyn StatsBackend>>,
    local: Arc<LocalStatsStore>,
    health: Arc<BackendHealth>,
    fingerprinter: Fingerprinter,
    retention_days: u32,
}

impl StatsStore {
    pub fn new(
        durable: Option<Arc<dyn StatsBackend>>,
        local: Arc<LocalStatsStore>,
        health: Arc<BackendHealth>,
        fingerprinter: Fingerprinter,
        retention_days: u32,
    ) -> Self {
        Self {
            durable,
            local,
            health,
            fingerprinter,
            retention_days,
        }
    }

    /// Which backend the next operation will try first.
    pub fn active_storage(&self) -> StorageKind {
        if self.durable.is_some() && self.health.is_available() {
            StorageKind::Database
        } else {
            StorageKind::Local
        }
    }

    fn durable_if_available(&self) -> Option<&Arc<dyn StatsBackend>> {
        self.durable.as_ref().filter(|_| self.health.is_available())
    }

    /// Record one visit, optionally tagged with the channel being played.
    ///
    /// Never fails outward: a database error retries against the file for
    /// this call, and a file error becomes a `success: false` receipt.
    pub async fn record_visit(
        &self,
        user_agent: &str,
        channel_name: Option<&str>,
        client_ip: Option<&str>,
    ) -> VisitReceipt {
        let today = today();
        let fingerprint =
            self.fingerprinter
                .fingerprint(user_agent, client_ip.unwrap_or_default(), &today);

        if let Some(durable) = self.durable_if_available() {
            match durable
                .record_visit(&today, &fingerprint, user_agent, channel_name)
                .await
            {
                Ok(bucket) => return VisitReceipt::from_bucket(&bucket, StorageKind::Database),
                Err(e) => {
                    warn!("Database visit write failed, falling back to local storage: {e}")
                }
            }
        }

        match self
            .local
            .record_visit(&today, &fingerprint, user_agent, channel_name)
            .await
        {
            Ok(bucket) => VisitReceipt::from_bucket(&bucket, StorageKind::Local),
            Err(e) => {
                error!("Local visit write failed: {e}");
                VisitReceipt::failure(StorageKind::Local, e.to_string())
            }
        }
    }

    /// The most recent `days` buckets, newest first.
    ///
    /// When neither backend yields anything readable the result is a single
    /// zeroed entry for today rather than an empty list or an error.
    pub async fn get_stats(&self, days: u32) -> Vec<DayStats> {
        let days = days.max(1);

        if let Some(durable) = self.durable_if_available() {
            match durable.recent_days(days).await {
                Ok(buckets) => {
                    return buckets
                        .iter()
                        .map(|b| DayStats::from_bucket(b, StorageKind::Database))
                        .collect();
                }
                Err(e) => warn!("Database stats read failed, falling back to local storage: {e}"),
            }
        }

        match self.local.recent_days(days).await {
            Ok(buckets) if !buckets.is_empty() => buckets
                .iter()
                .map(|b| DayStats::from_bucket(b, StorageKind::Local))
                .collect(),
            Ok(_) => vec![DayStats::empty_today(StorageKind::Local)],
            Err(e) => {
                warn!("Local stats read failed: {e}");
                vec![DayStats::empty_today(StorageKind::Local)]
            }
        }
    }

    /// Reduce the recent window into dashboard totals. Infallible by
    /// construction: `get_stats` already degrades to zeros.
    pub async fn get_summary_stats(&self) -> SummaryStats {
        let days = self.get_stats(SUMMARY_WINDOW_DAYS).await;

        let total_visits: i64 = days.iter().map(|d| d.visits).sum();
        let total_unique_visitors: i64 = days.iter().map(|d| d.unique_visitors).sum();
        let total_channels_played: i64 = days.iter().map(|d| d.channels_played).sum();
        let average_daily_visits = if days.is_empty() {
            0
        } else {
            (total_visits as f64 / days.len() as f64).round() as i64
        };

        SummaryStats {
            total_visits,
            total_unique_visitors,
            total_channels_played,
            average_daily_visits,
            most_popular_channels: merge_channel_rankings(&days),
            storage: self.active_storage(),
            error: None,
        }
    }

    /// Delete durable buckets past the retention window; returns how many
    /// were removed. The file backend prunes inline on every write instead,
    /// so there is nothing to do when the database is unavailable.
    pub async fn cleanup(&self) -> StatsResult<u64> {
        let Some(durable) = self.durable_if_available() else {
            return Ok(0);
        };

        let cutoff = retention_cutoff(self.retention_days);
        let removed = durable.purge_older_than(&cutoff).await?;
        info!("Cleaned up {removed} expired statistics buckets");
        Ok(removed)
    }
}

/// Merge per-day top lists by summing counts per channel name.
fn merge_channel_rankings(days: &[DayStats]) -> Vec<ChannelPlay> {
    let mut counts: HashMap<&str, i64> = HashMap::new();
    for day in days {
        for channel in &day.popular_channels {
            *counts.entry(channel.name.as_str()).or_insert(0) += channel.play_count;
        }
    }

    let mut merged: Vec<ChannelPlay> = counts
        .into_iter()
        .map(|(name, play_count)| ChannelPlay {
            name: name.to_string(),
            play_count,
        })
        .collect();
    merged.sort_by(|a, b| b.play_count.cmp(&a.play_count));
    merged.truncate(TOP_CHANNELS_LIMIT);
    merged
}
