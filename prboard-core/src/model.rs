//! Domain types shared by the grid builder, the cache and the HTTP layer

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use url::Url;

use crate::{Error, Result};

/// Link shown for a cell with no matching pull request
pub const NO_LINK: &str = "-";

/// A person whose pull requests are tracked
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Author {
    /// Display name shown in the grid
    #[serde(deserialize_with = "coerce_string")]
    pub name: String,
    /// GitHub login used for `author:` search terms and PR matching
    #[serde(rename = "githubUser", alias = "github_user", deserialize_with = "coerce_string")]
    pub github_user: String,
}

impl Author {
    /// Create a new author
    pub fn new(name: impl Into<String>, github_user: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            github_user: github_user.into(),
        }
    }
}

/// Accept strings, numbers and booleans for identifier-like fields
///
/// Hand-edited config files and dashboard request bodies sometimes carry
/// numeric logins (`"githubUser": 1234`); these are read as their string form.
fn coerce_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Scalar {
        Str(String),
        Int(i64),
        UInt(u64),
        Float(f64),
        Bool(bool),
    }

    Ok(match Scalar::deserialize(deserializer)? {
        Scalar::Str(s) => s,
        Scalar::Int(n) => n.to_string(),
        Scalar::UInt(n) => n.to_string(),
        Scalar::Float(n) => n.to_string(),
        Scalar::Bool(b) => b.to_string(),
    })
}

/// A repository reference of the form `owner/name`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RepositoryRef(String);

impl RepositoryRef {
    /// Parse and validate an `owner/name` reference
    pub fn parse(value: &str) -> Result<Self> {
        let value = value.trim();
        match value.split_once('/') {
            Some((owner, name))
                if !owner.is_empty() && !name.is_empty() && !name.contains('/') =>
            {
                Ok(Self(value.to_string()))
            }
            _ => Err(Error::InvalidRepository(value.to_string())),
        }
    }

    /// The full `owner/name` form
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The owner part
    pub fn owner(&self) -> &str {
        self.0.split_once('/').map(|(owner, _)| owner).unwrap_or(&self.0)
    }

    /// The short repository name shown in the grid
    pub fn name(&self) -> &str {
        self.0.split_once('/').map(|(_, name)| name).unwrap_or(&self.0)
    }
}

impl FromStr for RepositoryRef {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for RepositoryRef {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<RepositoryRef> for String {
    fn from(repo: RepositoryRef) -> Self {
        repo.0
    }
}

impl fmt::Display for RepositoryRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An open pull request as returned by the upstream search
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequest {
    /// Login of the PR author
    pub login: String,
    /// API URL of the owning repository, e.g. `https://api.github.com/repos/org/a`
    pub repository_url: String,
    /// Label names
    pub labels: Vec<String>,
    /// Web URL of the pull request
    pub html_url: Option<String>,
}

impl PullRequest {
    /// The owning repository as `owner/name`, taken from the last two path
    /// segments of the repository URL
    pub fn repository(&self) -> Option<String> {
        let path = match Url::parse(&self.repository_url) {
            Ok(url) => url.path().to_string(),
            Err(_) => self.repository_url.clone(),
        };

        let mut segments = path.split('/').filter(|s| !s.is_empty()).rev();
        let name = segments.next()?;
        let owner = segments.next()?;
        Some(format!("{owner}/{name}"))
    }

    /// Whether the PR carries a label with exactly this name
    pub fn has_label(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l == label)
    }
}

/// Review status of one grid cell
///
/// Variants are declared in display priority order: `requested` sorts first,
/// `missing` last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewStatus {
    Requested,
    Unreviewed,
    Reviewed,
    Missing,
}

impl ReviewStatus {
    /// All statuses in priority order
    pub const ALL: [ReviewStatus; 4] = [
        ReviewStatus::Requested,
        ReviewStatus::Unreviewed,
        ReviewStatus::Reviewed,
        ReviewStatus::Missing,
    ];

    /// Lowercase name as used on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewStatus::Requested => "requested",
            ReviewStatus::Unreviewed => "unreviewed",
            ReviewStatus::Reviewed => "reviewed",
            ReviewStatus::Missing => "missing",
        }
    }
}

impl fmt::Display for ReviewStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One (author, repository) cell of the grid
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridRow {
    /// Author display name
    pub author: String,
    /// Short repository name
    pub repository: String,
    pub review_status: ReviewStatus,
    /// PR web URL, or [`NO_LINK`]
    pub link: String,
}

/// The full author × repository status matrix
pub type Grid = Vec<GridRow>;
