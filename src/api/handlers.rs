use axum::{
    extract::{ConnectInfo, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use moka::future::Cache;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::api::client_ip::client_ip;
use crate::auth::AuthService;
use crate::playlist::{self, Channel};
use crate::stats::{DayStats, StatsStore, StorageKind, SummaryStats, DEFAULT_STATS_DAYS};

/// Widest window the stats endpoint will serve.
const MAX_STATS_DAYS: u32 = 90;

pub struct AppState {
    pub stats: Arc<StatsStore>,
    pub auth: Arc<AuthService>,
    pub playlist_url: String,
    pub http: reqwest::Client,
    /// Parsed playlist keyed by source URL, refreshed after the TTL.
    pub channel_cache: Cache<String, Arc<Vec<Channel>>>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(
        stats: Arc<StatsStore>,
        auth: Arc<AuthService>,
        playlist_url: String,
        cache_ttl_secs: u64,
    ) -> Self {
        let channel_cache = Cache::builder()
            .max_capacity(4)
            .time_to_live(Duration::from_secs(cache_ttl_secs))
            .build();

        Self {
            stats,
            auth,
            playlist_url,
            http: reqwest::Client::new(),
            channel_cache,
            started_at: Instant::now(),
        }
    }
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    status: &'static str,
    storage: StorageKind,
    uptime_secs: u64,
}

pub async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy",
        storage: state.stats.active_storage(),
        uptime_secs: state.started_at.elapsed().as_secs(),
    })
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VisitRequest {
    pub user_agent: Option<String>,
    pub channel_name: Option<String>,
}

/// Record a visit, optionally tagged with the channel being played.
/// Always answers 200; failures ride along in the receipt.
pub async fn record_visit(
    State(state): State<Arc<AppState>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(payload): Json<VisitRequest>,
) -> impl IntoResponse {
    let user_agent = payload
        .user_agent
        .or_else(|| header_user_agent(&headers))
        .unwrap_or_default();
    let ip = client_ip(&headers, addr.ip()).to_string();

    let receipt = state
        .stats
        .record_visit(&user_agent, payload.channel_name.as_deref(), Some(&ip))
        .await;

    Json(receipt)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistResponse {
    playlist_url: String,
}

/// Hand the (hidden) upstream playlist URL to the player, counting the
/// request as a visit.
pub async fn get_playlist(
    State(state): State<Arc<AppState>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> impl IntoResponse {
    if state.playlist_url.is_empty() {
        return playlist_unconfigured();
    }

    let user_agent = header_user_agent(&headers).unwrap_or_default();
    let ip = client_ip(&headers, addr.ip()).to_string();
    state.stats.record_visit(&user_agent, None, Some(&ip)).await;

    Json(PlaylistResponse {
        playlist_url: state.playlist_url.clone(),
    })
    .into_response()
}

#[derive(Debug, Default, Deserialize)]
pub struct ChannelsQuery {
    pub group: Option<String>,
    pub search: Option<String>,
}

#[derive(Serialize)]
struct ChannelsResponse {
    total: usize,
    groups: Vec<String>,
    channels: Vec<Channel>,
}

/// Server-side fetch and parse of the upstream playlist, with optional
/// group/search filtering.
pub async fn get_channels(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ChannelsQuery>,
) -> axum::response::Response {
    if state.playlist_url.is_empty() {
        return playlist_unconfigured();
    }

    let channels = match state.channel_cache.get(&state.playlist_url).await {
        Some(channels) => channels,
        None => match fetch_channels(&state).await {
            Ok(channels) => channels,
            Err(e) => {
                tracing::error!("Failed to load playlist: {e}");
                return (
                    StatusCode::BAD_GATEWAY,
                    Json(ErrorResponse {
                        error: "Failed to load playlist".to_string(),
                    }),
                )
                    .into_response();
            }
        },
    };

    let groups = playlist::groups(&channels);

    let matched: Vec<&Channel> = match query.search.as_deref() {
        Some(q) => playlist::search(&channels, q),
        None => channels.iter().collect(),
    };
    let filtered: Vec<Channel> = matched
        .into_iter()
        .filter(|c| query.group.as_deref().map_or(true, |g| c.group == g))
        .cloned()
        .collect();

    Json(ChannelsResponse {
        total: filtered.len(),
        groups,
        channels: filtered,
    })
    .into_response()
}

async fn fetch_channels(state: &AppState) -> Result<Arc<Vec<Channel>>, reqwest::Error> {
    let text = state
        .http
        .get(&state.playlist_url)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;

    let channels = Arc::new(playlist::parse(&text));
    tracing::info!("Loaded {} channels from upstream playlist", channels.len());

    state
        .channel_cache
        .insert(state.playlist_url.clone(), Arc::clone(&channels))
        .await;

    Ok(channels)
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub password: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LoginResponse {
    success: bool,
    token: String,
    expires_in_secs: u64,
}

pub async fn admin_login(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LoginRequest>,
) -> axum::response::Response {
    if payload.password.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "Password is required".to_string(),
            }),
        )
            .into_response();
    }

    if !state.auth.verify_password(&payload.password) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse {
                error: "Invalid password".to_string(),
            }),
        )
            .into_response();
    }

    match state.auth.issue_token() {
        Ok(token) => Json(LoginResponse {
            success: true,
            token,
            expires_in_secs: state.auth.token_ttl_secs(),
        })
        .into_response(),
        Err(e) => {
            tracing::error!("Failed to issue admin token: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Server error during login".to_string(),
                }),
            )
                .into_response()
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct StatsQuery {
    #[serde(default = "default_days")]
    pub days: u32,
}

fn default_days() -> u32 {
    DEFAULT_STATS_DAYS
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StatsResponse {
    success: bool,
    requested_days: u32,
    data: Vec<DayStats>,
}

/// Detailed per-day statistics. Degrades to zeroed data, never a 5xx.
pub async fn admin_stats(
    State(state): State<Arc<AppState>>,
    Query(query): Query<StatsQuery>,
) -> impl IntoResponse {
    let days = query.days.clamp(1, MAX_STATS_DAYS);
    let data = state.stats.get_stats(days).await;

    Json(StatsResponse {
        success: true,
        requested_days: days,
        data,
    })
}

#[derive(Serialize)]
struct SummaryResponse {
    success: bool,
    data: SummaryStats,
}

pub async fn admin_summary(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(SummaryResponse {
        success: true,
        data: state.stats.get_summary_stats().await,
    })
}

#[derive(Serialize)]
struct CleanupResponse {
    success: bool,
    removed: u64,
}

pub async fn admin_cleanup(State(state): State<Arc<AppState>>) -> axum::response::Response {
    match state.stats.cleanup().await {
        Ok(removed) => Json(CleanupResponse {
            success: true,
            removed,
        })
        .into_response(),
        Err(e) => {
            tracing::error!("Cleanup failed: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to perform cleanup".to_string(),
                }),
            )
                .into_response()
        }
    }
}

fn header_user_agent(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::USER_AGENT)
        .and_then(|h| h.to_str().ok())
        .map(str::to_string)
}

fn playlist_unconfigured() -> axum::response::Response {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(ErrorResponse {
            error: "Playlist URL is not configured".to_string(),
        }),
    )
        .into_response()
}
