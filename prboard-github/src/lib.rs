//! prboard GitHub - GitHub search integration for prboard
//!
//! This crate pages through GitHub's issue/PR search and exposes the result
//! as a [`prboard_core::PullRequestSource`].

mod client;
mod error;
pub mod search;

pub use client::GitHubClient;
pub use error::{Error, Result};
pub use search::{build_query, fetch_all, SearchClient, SearchOptions, SearchPage, SearchPages};
