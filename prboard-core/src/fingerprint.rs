//! Canonical cache keys for (repository-set, author-set) queries

use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::model::{Author, RepositoryRef};

/// Hash identifying a query shape, independent of element order and duplicates
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Fingerprint a query over the given repositories and authors
    pub fn of(repositories: &[RepositoryRef], authors: &[Author]) -> Self {
        #[derive(Serialize)]
        struct Canonical<'a> {
            repos: BTreeSet<&'a str>,
            authors: BTreeSet<(&'a str, &'a str)>,
        }

        let canonical = Canonical {
            repos: repositories.iter().map(RepositoryRef::as_str).collect(),
            authors: authors
                .iter()
                .map(|a| (a.name.as_str(), a.github_user.as_str()))
                .collect(),
        };

        // Serializing sets of strings cannot fail
        let bytes = serde_json::to_vec(&canonical).unwrap_or_default();
        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        Self(format!("{:x}", hasher.finalize()))
    }

    /// A fixed, human-chosen key (single-config deployments)
    pub fn named(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
