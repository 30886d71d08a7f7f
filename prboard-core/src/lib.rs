//! prboard core - pull request review grid engine
//!
//! This crate turns the open pull requests of a set of authors across a set
//! of repositories into a review status grid, caches it with a TTL and keeps
//! it refreshed in the background.

pub mod cache;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod fingerprint;
pub mod grid;
pub mod model;
pub mod scheduler;
pub mod secrets;
pub mod source;
pub mod status;

pub use cache::QueryCache;
pub use config::Config;
pub use dashboard::Dashboard;
pub use error::{Error, Result};
pub use fingerprint::Fingerprint;
pub use model::{Author, Grid, GridRow, PullRequest, RepositoryRef, ReviewStatus, NO_LINK};
pub use scheduler::RefreshScheduler;
pub use secrets::Secrets;
pub use source::PullRequestSource;
pub use status::classify;
