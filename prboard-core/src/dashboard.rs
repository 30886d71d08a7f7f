//! The dashboard service: cached grids for the configured and ad-hoc queries

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info};

use crate::cache::QueryCache;
use crate::fingerprint::Fingerprint;
use crate::grid;
use crate::model::{Author, Grid, PullRequest, RepositoryRef};
use crate::source::PullRequestSource;
use crate::Result;

/// Cache key of the grid for the configured repositories and authors
pub const CONFIGURED_GRID_KEY: &str = "prs";

/// Serves review grids from two caches
///
/// The configured query's grid lives under a single key and is only ever
/// written by [`Dashboard::refresh`], so readers never reach upstream.
/// Ad-hoc queries are cached as raw PR lists keyed by fingerprint; the grid
/// is rebuilt per request so that each caller gets its own row order.
pub struct Dashboard {
    source: Arc<dyn PullRequestSource>,
    repositories: Vec<RepositoryRef>,
    authors: Vec<Author>,
    configured: QueryCache<Grid>,
    queries: QueryCache<Vec<PullRequest>>,
}

impl Dashboard {
    pub fn new(
        source: Arc<dyn PullRequestSource>,
        repositories: Vec<RepositoryRef>,
        authors: Vec<Author>,
        ttl: Duration,
    ) -> Self {
        Self {
            source,
            repositories,
            authors,
            configured: QueryCache::new(ttl),
            queries: QueryCache::new(ttl),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.configured.ttl()
    }

    fn configured_key() -> Fingerprint {
        Fingerprint::named(CONFIGURED_GRID_KEY)
    }

    /// The last successfully built grid for the configured query, if any
    ///
    /// May be past its TTL when the latest refresh failed.
    pub async fn current_grid(&self) -> Option<Arc<Grid>> {
        self.configured.peek(&Self::configured_key()).await
    }

    /// When the configured grid next needs refreshing
    pub async fn current_grid_expires_at(&self) -> Option<Instant> {
        self.configured.expires_at(&Self::configured_key()).await
    }

    /// Refetch and rebuild the configured grid
    ///
    /// Returns `Ok(None)` if a refresh is already running.
    pub async fn refresh(&self) -> Result<Option<Arc<Grid>>> {
        self.configured
            .refresh(&Self::configured_key(), || self.build_configured())
            .await
    }

    async fn build_configured(&self) -> Result<Grid> {
        info!(
            repos = self.repositories.len(),
            authors = self.authors.len(),
            "Fetching pull requests for configured grid"
        );
        let prs = self.source.fetch_all(&self.repositories, &self.authors).await?;
        Ok(grid::build(&self.repositories, &self.authors, &prs))
    }

    /// Grid for an arbitrary query, served from the per-query cache
    pub async fn grid_for(
        &self,
        repositories: &[RepositoryRef],
        authors: &[Author],
    ) -> Result<Grid> {
        let key = Fingerprint::of(repositories, authors);
        debug!(key = %key, "Building grid for query");

        let prs = self
            .queries
            .get_or_populate(&key, || self.source.fetch_all(repositories, authors))
            .await?;

        Ok(grid::build(repositories, authors, &prs))
    }

    /// Drop expired per-query entries
    pub async fn purge_expired_queries(&self) -> usize {
        self.queries.purge_expired().await
    }
}
