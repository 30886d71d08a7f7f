//! Serve command - run the refresh scheduler and the dashboard HTTP server

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use prboard_core::{Config, Dashboard, RefreshScheduler};
use prboard_github::{GitHubClient, SearchClient};

use crate::server;

/// Arguments for the serve command
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Port to listen on (overrides config and env)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Directory of static dashboard assets (overrides config and env)
    #[arg(long)]
    pub static_dir: Option<PathBuf>,
}

impl ServeArgs {
    /// Execute the serve command
    pub async fn execute(&self, config: Config) -> anyhow::Result<()> {
        let config = config.with_cli_overrides(self.port, self.static_dir.clone());

        let client = GitHubClient::new()?;
        let authenticated = client.is_authenticated();
        let source = Arc::new(SearchClient::new(client, config.search.clone().into()));
        let dashboard = Arc::new(Dashboard::new(
            source,
            config.repos.clone(),
            config.authors.clone(),
            config.cache.ttl,
        ));

        let scheduler = RefreshScheduler::new(dashboard.clone()).spawn();

        let app = server::router(dashboard, config.server.static_dir.clone());
        let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bind to port {}: {}", config.server.port, e))?;

        tracing::info!(
            repos = config.repos.len(),
            authors = config.authors.len(),
            authenticated,
            "Dashboard running on http://localhost:{}",
            config.server.port
        );

        let served = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await;

        scheduler.abort();
        tracing::info!("Dashboard stopped");

        served?;
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
