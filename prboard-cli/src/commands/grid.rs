//! Grid command - fetch the configured grid once and print it

use clap::Args;
use prboard_core::{grid, Config, Grid, PullRequestSource};
use prboard_github::{GitHubClient, SearchClient};

/// Arguments for the grid command
#[derive(Args, Debug)]
pub struct GridArgs {
    /// Print the grid as JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

impl GridArgs {
    /// Execute the grid command
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let client = GitHubClient::new()?;
        let source = SearchClient::new(client, config.search.clone().into());

        let prs = source.fetch_all(&config.repos, &config.authors).await?;
        let grid = grid::build(&config.repos, &config.authors, &prs);

        if self.json {
            println!("{}", serde_json::to_string_pretty(&grid)?);
        } else {
            print_table(&grid);
        }

        Ok(())
    }
}

fn print_table(grid: &Grid) {
    if grid.is_empty() {
        println!("No repositories or authors configured.");
        return;
    }

    let author_width = column_width(grid.iter().map(|r| r.author.as_str()), "Author");
    let repo_width = column_width(grid.iter().map(|r| r.repository.as_str()), "Repository");

    println!(
        "{:<aw$}  {:<rw$}  {:<10}  Link",
        "Author",
        "Repository",
        "Status",
        aw = author_width,
        rw = repo_width
    );
    for row in grid {
        println!(
            "{:<aw$}  {:<rw$}  {:<10}  {}",
            row.author,
            row.repository,
            row.review_status.as_str(),
            row.link,
            aw = author_width,
            rw = repo_width
        );
    }
}

fn column_width<'a>(values: impl Iterator<Item = &'a str>, header: &str) -> usize {
    values.map(str::len).max().unwrap_or(0).max(header.len())
}
