use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub stats: StatsConfig,
    pub playlist: PlaylistConfig,
    pub admin: AdminConfig,
    pub frontend: FrontendConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub backend: DatabaseBackend,
    pub url: String,
    pub max_connections: u32,
    pub ping_interval_secs: u64,
}

/// Durable statistics backend. `None` runs the service on the local JSON
/// file alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseBackend {
    None,
    Sqlite,
    Postgres,
}

#[derive(Debug, Clone)]
pub struct StatsConfig {
    pub file_path: PathBuf,
    pub retention_days: u32,
}

#[derive(Debug, Clone)]
pub struct PlaylistConfig {
    /// Upstream M3U URL; kept server-side so clients never see it directly.
    pub url: String,
    pub cache_ttl_secs: u64,
}

#[derive(Debug, Clone)]
pub struct AdminConfig {
    pub password: String,
    pub jwt_secret: String,
    /// Keys the visitor-fingerprint HMAC; defaults to the JWT secret.
    pub fingerprint_secret: String,
    pub token_ttl_secs: u64,
}

#[derive(Debug, Clone)]
pub struct FrontendConfig {
    /// Directory of static frontend files to serve, if any.
    pub static_dir: Option<String>,
}

impl AdminConfig {
    const fn default_token_ttl_secs() -> u64 {
        86_400
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()?;

        let backend_str = std::env::var("DATABASE_BACKEND").unwrap_or_else(|_| "none".to_string());
        let backend = match backend_str.to_lowercase().as_str() {
            "sqlite" => DatabaseBackend::Sqlite,
            "postgres" | "postgresql" => DatabaseBackend::Postgres,
            "none" | "" => DatabaseBackend::None,
            other => {
                tracing::warn!(
                    "Unknown DATABASE_BACKEND '{other}', statistics will use local storage. \
                     Supported values: sqlite, postgres, none"
                );
                DatabaseBackend::None
            }
        };

        let database_url =
            std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://./tvgrid.db".to_string());
        let max_connections = std::env::var("DATABASE_MAX_CONNECTIONS")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(5);
        let ping_interval_secs = std::env::var("DB_PING_INTERVAL_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(30);

        let stats_file =
            std::env::var("STATS_FILE").unwrap_or_else(|_| "./tvgrid-stats.json".to_string());
        let retention_days = std::env::var("STATS_RETENTION_DAYS")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(30);

        let playlist_url = std::env::var("PLAYLIST_URL").unwrap_or_default();
        if playlist_url.is_empty() {
            tracing::warn!("PLAYLIST_URL is not set; /api/playlist and /api/channels will be unavailable");
        }
        let cache_ttl_secs = std::env::var("PLAYLIST_CACHE_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(300);

        let password = match std::env::var("ADMIN_PASSWORD") {
            Ok(p) if !p.is_empty() => p,
            _ => {
                tracing::warn!("ADMIN_PASSWORD is not set, using the default development password");
                "admin123".to_string()
            }
        };
        let jwt_secret = match std::env::var("JWT_SECRET") {
            Ok(s) if !s.is_empty() => s,
            _ => {
                tracing::warn!("JWT_SECRET is not set, using an insecure development secret");
                "insecure-dev-secret-change-me".to_string()
            }
        };
        let fingerprint_secret =
            std::env::var("FINGERPRINT_SECRET").unwrap_or_else(|_| jwt_secret.clone());
        let token_ttl_secs = std::env::var("ADMIN_TOKEN_TTL_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or_else(AdminConfig::default_token_ttl_secs);

        let frontend_static_dir = std::env::var("FRONTEND_STATIC_DIR").ok();

        Ok(Config {
            server: ServerConfig { host, port },
            database: DatabaseConfig {
                backend,
                url: database_url,
                max_connections,
                ping_interval_secs,
            },
            stats: StatsConfig {
                file_path: PathBuf::from(stats_file),
                retention_days,
            },
            playlist: PlaylistConfig {
                url: playlist_url,
                cache_ttl_secs,
            },
            admin: AdminConfig {
                password,
                jwt_secret,
                fingerprint_secret,
                token_ttl_secs,
            },
            frontend: FrontendConfig {
                static_dir: frontend_static_dir,
            },
        })
    }
}
