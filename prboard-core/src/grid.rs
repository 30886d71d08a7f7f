//! Grid building: the author × repository review status matrix

use tracing::debug;

use crate::model::{Author, Grid, GridRow, PullRequest, RepositoryRef, NO_LINK};
use crate::status::classify;

/// Build the full grid for the given repositories and authors
///
/// Every (repository, author) pair gets exactly one row, enumerated
/// repository-major in the given order. When several PRs share a login and
/// repository the first one in `prs` is used. Rows are then stably sorted by
/// review status, so ties keep their enumeration order.
pub fn build(repositories: &[RepositoryRef], authors: &[Author], prs: &[PullRequest]) -> Grid {
    // Resolve each PR's owning repository once rather than per cell
    let resolved: Vec<(Option<String>, &PullRequest)> =
        prs.iter().map(|pr| (pr.repository(), pr)).collect();
    let resolved = &resolved;

    let mut grid: Grid = repositories
        .iter()
        .flat_map(move |repo| {
            authors.iter().map(move |author| {
                let matched = resolved
                    .iter()
                    .find(|(pr_repo, pr)| {
                        pr.login == author.github_user
                            && pr_repo.as_deref() == Some(repo.as_str())
                    })
                    .map(|(_, pr)| *pr);

                GridRow {
                    author: author.name.clone(),
                    repository: repo.name().to_string(),
                    review_status: classify(matched),
                    link: matched
                        .and_then(|pr| pr.html_url.clone())
                        .unwrap_or_else(|| NO_LINK.to_string()),
                }
            })
        })
        .collect();

    // Vec::sort_by_key is stable
    grid.sort_by_key(|row| row.review_status);

    debug!(
        repositories = repositories.len(),
        authors = authors.len(),
        prs = prs.len(),
        rows = grid.len(),
        "Built review grid"
    );

    grid
}
