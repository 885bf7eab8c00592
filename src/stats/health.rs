//! Durable-backend connectivity tracking
//!
//! The store never flips this flag on an individual call failure; only
//! lifecycle events from the monitor task (or the initial connection
//! attempt) change it. A transient query error therefore falls back for
//! that one call while the next call tries the database again.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::stats::backend::StatsBackend;

pub struct BackendHealth {
    available: AtomicBool,
}

impl BackendHealth {
    pub fn new(initially_available: bool) -> Self {
        Self {
            available: AtomicBool::new(initially_available),
        }
    }

    pub fn is_available(&self) -> bool {
        self.available.load(Ordering::Relaxed)
    }

    pub fn mark_connected(&self) {
        if !self.available.swap(true, Ordering::Relaxed) {
            info!("Statistics database connection established");
        }
    }

    pub fn mark_disconnected(&self) {
        if self.available.swap(false, Ordering::Relaxed) {
            warn!("Statistics database unreachable, switching to local storage");
        }
    }
}

/// Spawn the connectivity monitor: pings the durable backend on an interval
/// and drives the health flag from the outcome.
pub fn spawn_monitor(
    health: Arc<BackendHealth>,
    backend: Arc<dyn StatsBackend>,
    interval_secs: u64,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));
        // The first tick fires immediately; skip it, the caller has just
        // connected.
        interval.tick().await;

        loop {
            interval.tick().await;
            match backend.ping().await {
                Ok(()) => health.mark_connected(),
                Err(e) => {
                    warn!("Statistics database ping failed: {e}");
                    health.mark_disconnected();
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_transitions() {
        let health = BackendHealth::new(false);
        assert!(!health.is_available());

        health.mark_connected();
        assert!(health.is_available());

        // Idempotent re-mark.
        health.mark_connected();
        assert!(health.is_available());

        health.mark_disconnected();
        assert!(!health.is_available());
    }
}
