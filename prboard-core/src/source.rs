//! Abstraction over the upstream pull request search

use async_trait::async_trait;

use crate::model::{Author, PullRequest, RepositoryRef};
use crate::Result;

/// Something that can list the open pull requests for a query
#[async_trait]
pub trait PullRequestSource: Send + Sync {
    /// Fetch every open PR by `authors` in `repositories`
    ///
    /// Returns results in upstream order. Failures surface as
    /// [`crate::Error::Upstream`].
    async fn fetch_all(
        &self,
        repositories: &[RepositoryRef],
        authors: &[Author],
    ) -> Result<Vec<PullRequest>>;
}
