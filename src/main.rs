use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};

use tvgrid::api::{self, AppState};
use tvgrid::auth::AuthService;
use tvgrid::config::{Config, DatabaseBackend, DatabaseConfig};
use tvgrid::stats::{
    self, BackendHealth, Fingerprinter, LocalStatsStore, PostgresStatsStore, SqliteStatsStore,
    StatsBackend, StatsStore,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    // Load configuration
    let config = Config::from_env()?;
    info!("Loaded configuration");

    // Connect the durable statistics backend, if one is configured. A
    // failed connection is not fatal: statistics degrade to the local file
    // until the monitor sees the database come back.
    let durable = connect_durable(&config.database).await;

    let health = Arc::new(BackendHealth::new(durable.is_some()));
    if let Some(backend) = durable.clone() {
        // Detached; the monitor runs for the lifetime of the process.
        let _monitor = stats::spawn_monitor(
            Arc::clone(&health),
            backend,
            config.database.ping_interval_secs,
        );
    }

    let local = Arc::new(LocalStatsStore::new(
        config.stats.file_path.clone(),
        config.stats.retention_days,
    ));
    local.init().await?;

    let fingerprinter = Fingerprinter::new(&config.admin.fingerprint_secret)?;
    let stats_store = Arc::new(StatsStore::new(
        durable,
        local,
        Arc::clone(&health),
        fingerprinter,
        config.stats.retention_days,
    ));

    let auth_service = Arc::new(AuthService::new(
        &config.admin.jwt_secret,
        &config.admin.password,
        config.admin.token_ttl_secs,
    ));

    let state = Arc::new(AppState::new(
        stats_store,
        auth_service,
        config.playlist.url.clone(),
        config.playlist.cache_ttl_secs,
    ));

    if let Some(ref static_dir) = config.frontend.static_dir {
        info!("Serving frontend from directory: {}", static_dir);
    }

    let router = api::create_router(state, config.frontend.static_dir.clone());

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("🚀 tvgrid listening on http://{}", addr);
    info!("   - Player API at http://{}/api/...", addr);
    info!("   - Admin API at http://{}/admin/...", addr);

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

async fn connect_durable(config: &DatabaseConfig) -> Option<Arc<dyn StatsBackend>> {
    let backend: Arc<dyn StatsBackend> = match config.backend {
        DatabaseBackend::Sqlite => {
            info!("Using SQLite statistics backend: {}", config.url);
            match SqliteStatsStore::new(&config.url, config.max_connections).await {
                Ok(store) => Arc::new(store),
                Err(e) => {
                    warn!("SQLite connection failed, statistics fall back to local storage: {e}");
                    return None;
                }
            }
        }
        DatabaseBackend::Postgres => {
            info!("Using PostgreSQL statistics backend");
            match PostgresStatsStore::new(&config.url, config.max_connections).await {
                Ok(store) => Arc::new(store),
                Err(e) => {
                    warn!(
                        "PostgreSQL connection failed, statistics fall back to local storage: {e}"
                    );
                    return None;
                }
            }
        }
        DatabaseBackend::None => {
            info!("No database configured, statistics use local storage");
            return None;
        }
    };

    if let Err(e) = backend.init().await {
        warn!("Database initialization failed, statistics fall back to local storage: {e}");
        return None;
    }

    Some(backend)
}
