//! GitHub API client using octocrab

use async_trait::async_trait;
use octocrab::models::issues::Issue as OctocrabIssue;
use octocrab::Octocrab;
use prboard_core::{PullRequest, Secrets};
use tracing::{debug, info, warn};

use crate::search::{SearchPage, SearchPages};
use crate::{Error, Result};

/// GitHub API client for issue/PR search
pub struct GitHubClient {
    client: Octocrab,
    authenticated: bool,
}

impl GitHubClient {
    /// Create a client using the token from the environment or secrets file
    ///
    /// Token is loaded from (in priority order):
    /// 1. GITHUB_TOKEN environment variable
    /// 2. ~/.config/prboard/secrets.toml
    ///
    /// Falls back to anonymous access when neither is set.
    pub fn new() -> Result<Self> {
        let secrets = Secrets::load().map_err(|e| Error::Auth(e.to_string()))?;
        Self::with_token(secrets.github_token())
    }

    /// Create a client with an explicit token, or anonymous if `None`
    pub fn with_token(token: Option<String>) -> Result<Self> {
        let authenticated = token.is_some();
        let builder = match token {
            Some(token) => Octocrab::builder().personal_token(token),
            None => {
                warn!("No GitHub token configured, using anonymous search (low rate limit)");
                Octocrab::builder()
            }
        };

        let client = builder
            .build()
            .map_err(|e| Error::Auth(format!("Failed to create GitHub client: {}", e)))?;

        info!(authenticated, "Created GitHub client");

        Ok(Self {
            client,
            authenticated,
        })
    }

    /// Whether requests carry a token
    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }
}

impl std::fmt::Debug for GitHubClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubClient")
            .field("authenticated", &self.authenticated)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl SearchPages for GitHubClient {
    async fn search_page(&self, query: &str, per_page: u8, page: u32) -> Result<SearchPage> {
        debug!(page, per_page, "Requesting search page");

        let results = self
            .client
            .search()
            .issues_and_pull_requests(query)
            .per_page(per_page)
            .page(page)
            .send()
            .await
            .map_err(classify_api_error)?;

        Ok(SearchPage {
            total_count: results.total_count.unwrap_or_default(),
            items: results.items.into_iter().map(pull_request_from_issue).collect(),
        })
    }
}

/// Convert a search hit into the grid's PR representation
fn pull_request_from_issue(issue: OctocrabIssue) -> PullRequest {
    PullRequest {
        login: issue.user.login,
        repository_url: issue.repository_url.to_string(),
        labels: issue.labels.into_iter().map(|l| l.name).collect(),
        html_url: Some(issue.html_url.to_string()),
    }
}

fn classify_api_error(err: octocrab::Error) -> Error {
    match err {
        octocrab::Error::GitHub { source, .. } => {
            let message = source.message.to_lowercase();
            if message.contains("rate limit") {
                Error::RateLimited(source.message)
            } else if message.contains("bad credentials") {
                Error::Auth("Invalid GitHub token".to_string())
            } else {
                Error::Other(format!("GitHub search failed: {}", source.message))
            }
        }
        other => Error::Api(other),
    }
}
