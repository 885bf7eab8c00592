//! HTTP API layer: thin glue mapping routes onto the playlist parser and
//! the statistics store.

pub mod client_ip;
pub mod handlers;
pub mod routes;

pub use handlers::AppState;
pub use routes::create_router;
