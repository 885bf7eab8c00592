use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

use crate::auth::admin_auth_middleware;

use super::handlers::{
    admin_cleanup, admin_login, admin_stats, admin_summary, get_channels, get_playlist,
    health_check, record_visit, AppState,
};

pub fn create_router(state: Arc<AppState>, static_dir: Option<String>) -> Router {
    let auth_service = Arc::clone(&state.auth);

    let admin_routes = Router::new()
        .route("/admin/stats", get(admin_stats))
        .route("/admin/stats/summary", get(admin_summary))
        .route("/admin/cleanup", post(admin_cleanup))
        .route_layer(middleware::from_fn(move |headers, req, next| {
            let auth = Arc::clone(&auth_service);
            admin_auth_middleware(auth, headers, req, next)
        }))
        .with_state(Arc::clone(&state));

    let mut router = Router::new()
        .route("/health", get(health_check))
        .route("/api/visit", post(record_visit))
        .route("/api/playlist", get(get_playlist))
        .route("/api/channels", get(get_channels))
        .route("/admin/login", post(admin_login))
        .with_state(state)
        .merge(admin_routes)
        .layer(CorsLayer::permissive());

    if let Some(dir) = static_dir {
        router = router.fallback_service(ServeDir::new(dir));
    }

    router
}
