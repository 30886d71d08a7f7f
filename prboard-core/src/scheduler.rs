//! Background refresh of the configured grid

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::dashboard::Dashboard;

/// Keeps the configured grid fresh for the lifetime of the process
///
/// Populates immediately on start, then sleeps until the stored grid
/// expires and refreshes again. A failed refresh is retried one TTL later;
/// readers keep seeing the previous grid in the meantime.
pub struct RefreshScheduler {
    dashboard: Arc<Dashboard>,
}

impl RefreshScheduler {
    pub fn new(dashboard: Arc<Dashboard>) -> Self {
        Self { dashboard }
    }

    /// Run the refresh loop on the tokio runtime
    ///
    /// The loop never ends on its own; abort the handle to stop it.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Refresh forever
    pub async fn run(self) {
        info!(ttl_secs = self.dashboard.ttl().as_secs(), "Starting refresh scheduler");
        loop {
            let next = self.tick().await;
            tokio::time::sleep_until(next).await;
        }
    }

    /// Refresh once and return when the next refresh is due
    async fn tick(&self) -> Instant {
        match self.dashboard.refresh().await {
            Ok(Some(grid)) => info!(rows = grid.len(), "Refreshed review grid"),
            Ok(None) => debug!("Refresh already in progress"),
            Err(e) => warn!(error = %e, "Failed to refresh review grid"),
        }

        let purged = self.dashboard.purge_expired_queries().await;
        if purged > 0 {
            debug!(purged, "Dropped expired query results");
        }

        let now = Instant::now();
        self.dashboard
            .current_grid_expires_at()
            .await
            .filter(|expires_at| *expires_at > now)
            .unwrap_or(now + self.dashboard.ttl())
    }
}
