//! Data models for visit statistics

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// At-rest cap on a bucket's channel ranking.
pub const MAX_RANKED_CHANNELS: usize = 50;

/// How many channels query responses carry.
pub const TOP_CHANNELS_LIMIT: usize = 10;

/// Which backend served a statistics operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    Database,
    Local,
}

/// One entry in a bucket's channel ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelPlay {
    pub name: String,
    pub play_count: i64,
}

/// Per-calendar-day aggregate of visit and play counters.
///
/// The UTC date string is the unique key in every backend. `unique_visitors`
/// is a deduplicated array rather than a set so it round-trips through JSON
/// unchanged in both storage representations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyBucket {
    pub date: String,
    pub visits: i64,
    pub unique_visitors: Vec<String>,
    pub channels_played: i64,
    pub popular_channels: Vec<ChannelPlay>,
    pub user_agents: Vec<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl DailyBucket {
    /// Fresh zeroed bucket for the given date.
    pub fn new(date: &str) -> Self {
        let now = Utc::now().timestamp();
        Self {
            date: date.to_string(),
            visits: 0,
            unique_visitors: Vec::new(),
            channels_played: 0,
            popular_channels: Vec::new(),
            user_agents: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply one visit to the bucket.
    ///
    /// Re-adding a known fingerprint is idempotent for the unique-visitor
    /// set; the ranking is re-capped whenever a play pushes it past
    /// [`MAX_RANKED_CHANNELS`].
    pub fn apply_visit(&mut self, fingerprint: &str, user_agent: &str, channel_name: Option<&str>) {
        self.visits += 1;

        if !self.unique_visitors.iter().any(|v| v == fingerprint) {
            self.unique_visitors.push(fingerprint.to_string());
        }

        if !user_agent.trim().is_empty() {
            self.user_agents.push(user_agent.to_string());
        }

        if let Some(name) = channel_name.map(str::trim).filter(|n| !n.is_empty()) {
            self.channels_played += 1;

            match self.popular_channels.iter_mut().find(|c| c.name == name) {
                Some(entry) => entry.play_count += 1,
                None => self.popular_channels.push(ChannelPlay {
                    name: name.to_string(),
                    play_count: 1,
                }),
            }

            if self.popular_channels.len() > MAX_RANKED_CHANNELS {
                self.popular_channels
                    .sort_by(|a, b| b.play_count.cmp(&a.play_count));
                self.popular_channels.truncate(MAX_RANKED_CHANNELS);
            }
        }

        self.updated_at = Utc::now().timestamp();
    }

    /// The ranking sorted by play count descending, truncated to `limit`.
    pub fn top_channels(&self, limit: usize) -> Vec<ChannelPlay> {
        let mut ranked = self.popular_channels.clone();
        ranked.sort_by(|a, b| b.play_count.cmp(&a.play_count));
        ranked.truncate(limit);
        ranked
    }
}

/// One day's aggregate as returned by queries.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayStats {
    pub date: String,
    pub visits: i64,
    pub unique_visitors: i64,
    pub channels_played: i64,
    pub popular_channels: Vec<ChannelPlay>,
    pub storage: StorageKind,
}

impl DayStats {
    pub fn from_bucket(bucket: &DailyBucket, storage: StorageKind) -> Self {
        Self {
            date: bucket.date.clone(),
            visits: bucket.visits,
            unique_visitors: bucket.unique_visitors.len() as i64,
            channels_played: bucket.channels_played,
            popular_channels: bucket.top_channels(TOP_CHANNELS_LIMIT),
            storage,
        }
    }

    /// Zeroed placeholder for today, used when no data is readable at all.
    pub fn empty_today(storage: StorageKind) -> Self {
        Self {
            date: Utc::now().format("%Y-%m-%d").to_string(),
            visits: 0,
            unique_visitors: 0,
            channels_played: 0,
            popular_channels: Vec::new(),
            storage,
        }
    }
}

/// Dashboard roll-up over the recent window.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryStats {
    pub total_visits: i64,
    pub total_unique_visitors: i64,
    pub total_channels_played: i64,
    pub average_daily_visits: i64,
    pub most_popular_channels: Vec<ChannelPlay>,
    pub storage: StorageKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Outcome of a `record_visit` call. Never an `Err`: failures degrade to
/// `success: false` with the error message carried along.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitReceipt {
    pub success: bool,
    pub storage: StorageKind,
    pub visits: i64,
    pub unique_visitors: i64,
    pub channels_played: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl VisitReceipt {
    pub fn from_bucket(bucket: &DailyBucket, storage: StorageKind) -> Self {
        Self {
            success: true,
            storage,
            visits: bucket.visits,
            unique_visitors: bucket.unique_visitors.len() as i64,
            channels_played: bucket.channels_played,
            error: None,
        }
    }

    pub fn failure(storage: StorageKind, error: String) -> Self {
        Self {
            success: false,
            storage,
            visits: 0,
            unique_visitors: 0,
            channels_played: 0,
            error: Some(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_visit_counts_and_dedupes() {
        let mut bucket = DailyBucket::new("2026-08-07");

        bucket.apply_visit("fp1", "UA1", Some("BBC"));
        bucket.apply_visit("fp1", "UA1", Some("BBC"));

        assert_eq!(bucket.visits, 2);
        assert_eq!(bucket.unique_visitors.len(), 1);
        assert_eq!(bucket.channels_played, 2);
        assert_eq!(bucket.popular_channels.len(), 1);
        assert_eq!(bucket.popular_channels[0].play_count, 2);
        assert_eq!(bucket.user_agents.len(), 2);
    }

    #[test]
    fn test_apply_visit_skips_blank_fields() {
        let mut bucket = DailyBucket::new("2026-08-07");

        bucket.apply_visit("fp1", "  ", Some("  "));

        assert_eq!(bucket.visits, 1);
        assert_eq!(bucket.channels_played, 0);
        assert!(bucket.user_agents.is_empty());
        assert!(bucket.popular_channels.is_empty());
    }

    #[test]
    fn test_ranking_capped_at_fifty() {
        let mut bucket = DailyBucket::new("2026-08-07");

        // A heavy hitter followed by a long tail of single plays.
        for _ in 0..5 {
            bucket.apply_visit("fp", "UA", Some("Favourite"));
        }
        for i in 0..60 {
            let name = format!("Channel {i}");
            bucket.apply_visit("fp", "UA", Some(name.as_str()));
        }

        assert!(bucket.popular_channels.len() <= MAX_RANKED_CHANNELS);
        assert!(bucket
            .popular_channels
            .iter()
            .any(|c| c.name == "Favourite" && c.play_count == 5));
    }

    #[test]
    fn test_top_channels_orders_descending() {
        let mut bucket = DailyBucket::new("2026-08-07");
        bucket.apply_visit("fp", "UA", Some("A"));
        bucket.apply_visit("fp", "UA", Some("B"));
        bucket.apply_visit("fp", "UA", Some("B"));

        let top = bucket.top_channels(TOP_CHANNELS_LIMIT);
        assert_eq!(top[0].name, "B");
        assert_eq!(top[0].play_count, 2);
        assert_eq!(top.len(), 2);
    }
}
