use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::sync::Arc;

use crate::stats::backend::{StatsBackend, StatsResult, StatsRow};
use crate::stats::models::DailyBucket;

pub struct PostgresStatsStore {
    pool: Arc<PgPool>,
}

impl PostgresStatsStore {
    pub async fn new(database_url: &str, max_connections: u32) -> StatsResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self {
            pool: Arc::new(pool),
        })
    }
}

#[async_trait]
impl StatsBackend for PostgresStatsStore {
    async fn init(&self) -> StatsResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS statistics (
                id BIGSERIAL PRIMARY KEY,
                date TEXT NOT NULL UNIQUE,
                visits BIGINT NOT NULL DEFAULT 0,
                unique_visitors TEXT NOT NULL DEFAULT '[]',
                channels_played BIGINT NOT NULL DEFAULT 0,
                popular_channels TEXT NOT NULL DEFAULT '[]',
                user_agents TEXT NOT NULL DEFAULT '[]',
                created_at BIGINT NOT NULL,
                updated_at BIGINT NOT NULL
            )
            "#,
        )
        .execute(self.pool.as_ref())
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_statistics_date ON statistics(date)")
            .execute(self.pool.as_ref())
            .await?;

        Ok(())
    }

    async fn ping(&self) -> StatsResult<()> {
        sqlx::query("SELECT 1").execute(self.pool.as_ref()).await?;
        Ok(())
    }

    async fn record_visit(
        &self,
        date: &str,
        fingerprint: &str,
        user_agent: &str,
        channel_name: Option<&str>,
    ) -> StatsResult<DailyBucket> {
        // Same atomic upsert contract as the SQLite store: the whole
        // read-modify-write happens inside one transaction.
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, StatsRow>(
            r#"
            SELECT date, visits, unique_visitors, channels_played,
                   popular_channels, user_agents, created_at, updated_at
            FROM statistics
            WHERE date = $1
            FOR UPDATE
            "#,
        )
        .bind(date)
        .fetch_optional(&mut *tx)
        .await?;

        let mut bucket = match row {
            Some(row) => row.into_bucket()?,
            None => DailyBucket::new(date),
        };
        bucket.apply_visit(fingerprint, user_agent, channel_name);

        sqlx::query(
            r#"
            INSERT INTO statistics (date, visits, unique_visitors, channels_played,
                                    popular_channels, user_agents, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (date) DO UPDATE SET
                visits = excluded.visits,
                unique_visitors = excluded.unique_visitors,
                channels_played = excluded.channels_played,
                popular_channels = excluded.popular_channels,
                user_agents = excluded.user_agents,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&bucket.date)
        .bind(bucket.visits)
        .bind(serde_json::to_string(&bucket.unique_visitors)?)
        .bind(bucket.channels_played)
        .bind(serde_json::to_string(&bucket.popular_channels)?)
        .bind(serde_json::to_string(&bucket.user_agents)?)
        .bind(bucket.created_at)
        .bind(bucket.updated_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(bucket)
    }

    async fn recent_days(&self, limit: u32) -> StatsResult<Vec<DailyBucket>> {
        let rows = sqlx::query_as::<_, StatsRow>(
            r#"
            SELECT date, visits, unique_visitors, channels_played,
                   popular_channels, user_agents, created_at, updated_at
            FROM statistics
            ORDER BY date DESC
            LIMIT $1
            "#,
        )
        .bind(limit as i64)
        .fetch_all(self.pool.as_ref())
        .await?;

        rows.into_iter().map(StatsRow::into_bucket).collect()
    }

    async fn purge_older_than(&self, cutoff_date: &str) -> StatsResult<u64> {
        let result = sqlx::query("DELETE FROM statistics WHERE date < $1")
            .bind(cutoff_date)
            .execute(self.pool.as_ref())
            .await?;

        Ok(result.rows_affected())
    }
}
