//! Paginated issue/PR search

use std::time::Duration;

use async_trait::async_trait;
use prboard_core::config::SearchConfig;
use prboard_core::{Author, PullRequest, PullRequestSource, RepositoryRef};
use tracing::{debug, info};

use crate::Result;

/// One page of search results
#[derive(Debug, Clone, Default)]
pub struct SearchPage {
    pub items: Vec<PullRequest>,
    /// Total matches reported by upstream, across all pages
    pub total_count: u64,
}

/// A search backend that returns one page at a time
#[async_trait]
pub trait SearchPages: Send + Sync {
    /// Fetch page `page` (1-based) of `query`
    async fn search_page(&self, query: &str, per_page: u8, page: u32) -> Result<SearchPage>;
}

/// Paging limits for [`fetch_all`]
#[derive(Debug, Clone)]
pub struct SearchOptions {
    pub per_page: u8,
    pub page_cap: u32,
    pub page_delay: Duration,
}

impl Default for SearchOptions {
    fn default() -> Self {
        SearchConfig::default().into()
    }
}

impl From<SearchConfig> for SearchOptions {
    fn from(config: SearchConfig) -> Self {
        Self {
            per_page: config.per_page,
            page_cap: config.page_cap,
            page_delay: config.page_delay,
        }
    }
}

/// Search query for open items by any of `authors` in any of `repositories`
pub fn build_query(repositories: &[RepositoryRef], authors: &[Author]) -> String {
    let mut terms = vec!["is:open".to_string()];
    terms.extend(repositories.iter().map(|repo| format!("repo:{}", repo)));
    terms.extend(authors.iter().map(|author| format!("author:{}", author.github_user)));
    terms.join(" ")
}

/// Fetch every page of results for the query, up to the page cap
///
/// Stops once the reported total has been collected, the page cap is
/// reached, or upstream returns an empty page. Waits `page_delay` between
/// requests. Any failed page fails the whole fetch.
pub async fn fetch_all<S>(
    pages: &S,
    repositories: &[RepositoryRef],
    authors: &[Author],
    options: &SearchOptions,
) -> Result<Vec<PullRequest>>
where
    S: SearchPages + ?Sized,
{
    if repositories.is_empty() || authors.is_empty() {
        debug!("Empty repository or author list, skipping search");
        return Ok(Vec::new());
    }

    let query = build_query(repositories, authors);
    info!(query = %query, "Searching GitHub for open pull requests");

    let mut all = Vec::new();
    let mut page = 1u32;
    loop {
        let result = pages.search_page(&query, options.per_page, page).await?;
        let received = result.items.len();
        all.extend(result.items);

        debug!(
            page,
            received,
            collected = all.len(),
            total = result.total_count,
            "Fetched search page"
        );

        page += 1;
        let more = (all.len() as u64) < result.total_count
            && page <= options.page_cap
            && received > 0;
        if !more {
            break;
        }

        tokio::time::sleep(options.page_delay).await;
    }

    info!(count = all.len(), pages = page - 1, "Fetched pull requests");
    Ok(all)
}

/// [`PullRequestSource`] backed by a paged search backend
pub struct SearchClient<S> {
    pages: S,
    options: SearchOptions,
}

impl<S: SearchPages> SearchClient<S> {
    pub fn new(pages: S, options: SearchOptions) -> Self {
        Self { pages, options }
    }
}

#[async_trait]
impl<S: SearchPages> PullRequestSource for SearchClient<S> {
    async fn fetch_all(
        &self,
        repositories: &[RepositoryRef],
        authors: &[Author],
    ) -> prboard_core::Result<Vec<PullRequest>> {
        Ok(fetch_all(&self.pages, repositories, authors, &self.options).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use std::sync::Mutex;
    use tokio::time::Instant;

    /// Serves `total` synthetic results, recording each request
    struct FakePages {
        total: u64,
        reported_total: u64,
        fail_on_page: Option<u32>,
        requests: Mutex<Vec<(String, u8, u32, Instant)>>,
    }

    impl FakePages {
        fn new(total: u64) -> Self {
            Self {
                total,
                reported_total: total,
                fail_on_page: None,
                requests: Mutex::new(Vec::new()),
            }
        }

        fn pages_requested(&self) -> Vec<u32> {
            self.requests.lock().unwrap().iter().map(|r| r.2).collect()
        }
    }

    #[async_trait]
    impl SearchPages for FakePages {
        async fn search_page(&self, query: &str, per_page: u8, page: u32) -> Result<SearchPage> {
            self.requests
                .lock()
                .unwrap()
                .push((query.to_string(), per_page, page, Instant::now()));

            if self.fail_on_page == Some(page) {
                return Err(Error::RateLimited("secondary rate limit".to_string()));
            }

            let start = u64::from(page - 1) * u64::from(per_page);
            let end = (start + u64::from(per_page)).min(self.total);
            let items = (start..end)
                .map(|n| PullRequest {
                    login: "alice".to_string(),
                    repository_url: "https://api.github.com/repos/org/a".to_string(),
                    labels: vec![],
                    html_url: Some(format!("https://github.com/org/a/pull/{n}")),
                })
                .collect();

            Ok(SearchPage {
                items,
                total_count: self.reported_total,
            })
        }
    }

    fn repos() -> Vec<RepositoryRef> {
        vec![
            RepositoryRef::parse("org/a").unwrap(),
            RepositoryRef::parse("org/b").unwrap(),
        ]
    }

    fn authors() -> Vec<Author> {
        vec![Author::new("Alice", "alice"), Author::new("Bob", "bob")]
    }

    fn options(per_page: u8, page_cap: u32) -> SearchOptions {
        SearchOptions {
            per_page,
            page_cap,
            page_delay: Duration::from_millis(100),
        }
    }

    #[test]
    fn test_build_query() {
        assert_eq!(
            build_query(&repos(), &authors()),
            "is:open repo:org/a repo:org/b author:alice author:bob"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_page() {
        let pages = FakePages::new(3);

        let prs = fetch_all(&pages, &repos(), &authors(), &options(100, 5))
            .await
            .unwrap();

        assert_eq!(prs.len(), 3);
        assert_eq!(pages.pages_requested(), vec![1]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_paginates_until_total_collected() {
        let pages = FakePages::new(25);

        let prs = fetch_all(&pages, &repos(), &authors(), &options(10, 5))
            .await
            .unwrap();

        assert_eq!(prs.len(), 25);
        assert_eq!(pages.pages_requested(), vec![1, 2, 3]);
        assert_eq!(
            prs.last().unwrap().html_url.as_deref(),
            Some("https://github.com/org/a/pull/24")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_stops_at_page_cap() {
        let pages = FakePages::new(10_000);

        let prs = fetch_all(&pages, &repos(), &authors(), &options(100, 5))
            .await
            .unwrap();

        assert_eq!(prs.len(), 500);
        assert_eq!(pages.pages_requested(), vec![1, 2, 3, 4, 5]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stops_on_empty_page() {
        let mut pages = FakePages::new(15);
        pages.reported_total = 1_000;

        let prs = fetch_all(&pages, &repos(), &authors(), &options(10, 10))
            .await
            .unwrap();

        assert_eq!(prs.len(), 15);
        assert_eq!(pages.pages_requested(), vec![1, 2, 3]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_waits_between_pages() {
        let pages = FakePages::new(30);

        fetch_all(&pages, &repos(), &authors(), &options(10, 5))
            .await
            .unwrap();

        let requests = pages.requests.lock().unwrap();
        for pair in requests.windows(2) {
            assert!(pair[1].3 - pair[0].3 >= Duration::from_millis(100));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_sends_query_and_page_size() {
        let pages = FakePages::new(1);

        fetch_all(&pages, &repos(), &authors(), &options(42, 5))
            .await
            .unwrap();

        let requests = pages.requests.lock().unwrap();
        assert_eq!(
            requests[0].0,
            "is:open repo:org/a repo:org/b author:alice author:bob"
        );
        assert_eq!(requests[0].1, 42);
    }

    #[tokio::test(start_paused = true)]
    async fn test_page_failure_fails_whole_fetch() {
        let mut pages = FakePages::new(300);
        pages.fail_on_page = Some(2);

        let result = fetch_all(&pages, &repos(), &authors(), &options(100, 5)).await;

        assert!(matches!(result, Err(Error::RateLimited(_))));
        assert_eq!(pages.pages_requested(), vec![1, 2]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_inputs_skip_upstream() {
        let pages = FakePages::new(10);

        let no_repos = fetch_all(&pages, &[], &authors(), &options(100, 5))
            .await
            .unwrap();
        let no_authors = fetch_all(&pages, &repos(), &[], &options(100, 5))
            .await
            .unwrap();

        assert!(no_repos.is_empty());
        assert!(no_authors.is_empty());
        assert!(pages.pages_requested().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_search_client_maps_errors_to_upstream() {
        let mut pages = FakePages::new(10);
        pages.fail_on_page = Some(1);
        let client = SearchClient::new(pages, options(100, 5));

        let err = PullRequestSource::fetch_all(&client, &repos(), &authors())
            .await
            .unwrap_err();

        assert!(err.is_upstream());
        assert!(err.to_string().contains("rate limit"));
    }
}
