use anyhow::Result;
use clap::{Parser, Subcommand};
use std::sync::Arc;

use tvgrid::config::{Config, DatabaseBackend};
use tvgrid::stats::{
    BackendHealth, Fingerprinter, LocalStatsStore, PostgresStatsStore, SqliteStatsStore,
    StatsBackend, StatsStore,
};

#[derive(Parser)]
#[command(name = "tvgrid-admin")]
#[command(about = "tvgrid statistics management CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show per-day statistics
    Stats {
        /// How many recent days to display
        #[arg(long, default_value_t = 7)]
        days: u32,
    },
    /// Show the 30-day roll-up
    Summary,
    /// Delete statistics past the retention window
    Cleanup,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    let durable: Option<Arc<dyn StatsBackend>> = match config.database.backend {
        DatabaseBackend::Sqlite => Some(Arc::new(
            SqliteStatsStore::new(&config.database.url, config.database.max_connections).await?,
        )),
        DatabaseBackend::Postgres => Some(Arc::new(
            PostgresStatsStore::new(&config.database.url, config.database.max_connections).await?,
        )),
        DatabaseBackend::None => None,
    };
    if let Some(backend) = durable.as_ref() {
        backend.init().await?;
    }

    let health = Arc::new(BackendHealth::new(durable.is_some()));
    let local = Arc::new(LocalStatsStore::new(
        config.stats.file_path.clone(),
        config.stats.retention_days,
    ));
    local.init().await?;

    let store = StatsStore::new(
        durable,
        local,
        health,
        Fingerprinter::new(&config.admin.fingerprint_secret)?,
        config.stats.retention_days,
    );

    match cli.command {
        Commands::Stats { days } => {
            let stats = store.get_stats(days).await;
            println!(
                "{:<12} {:>8} {:>8} {:>8}  Top channels",
                "Date", "Visits", "Unique", "Plays"
            );
            println!("{}", "-".repeat(72));
            for day in stats {
                let top = day
                    .popular_channels
                    .iter()
                    .take(3)
                    .map(|c| format!("{} ({})", c.name, c.play_count))
                    .collect::<Vec<_>>()
                    .join(", ");
                println!(
                    "{:<12} {:>8} {:>8} {:>8}  {}",
                    day.date, day.visits, day.unique_visitors, day.channels_played, top
                );
            }
        }
        Commands::Summary => {
            let summary = store.get_summary_stats().await;
            println!("Total visits:          {}", summary.total_visits);
            println!("Total unique visitors: {}", summary.total_unique_visitors);
            println!("Total channels played: {}", summary.total_channels_played);
            println!("Average daily visits:  {}", summary.average_daily_visits);
            if !summary.most_popular_channels.is_empty() {
                println!("Most popular channels:");
                for channel in summary.most_popular_channels {
                    println!("  {:<40} {}", channel.name, channel.play_count);
                }
            }
        }
        Commands::Cleanup => {
            let removed = store.cleanup().await?;
            println!("✓ Removed {removed} expired statistics buckets");
        }
    }

    Ok(())
}
