//! GitHub credentials for prboard
//!
//! The dashboard works against the public search API without a token, but
//! anonymous search is limited to a handful of requests per minute. A token
//! is picked up from (in priority order):
//! 1. The `GITHUB_TOKEN` environment variable
//! 2. `~/.config/prboard/secrets.toml`, which must not be group/world readable

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{Error, Result};

/// Environment variable consulted before the secrets file
pub const TOKEN_ENV_VAR: &str = "GITHUB_TOKEN";

/// Secrets file contents
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Secrets {
    pub github: GitHubSecrets,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct GitHubSecrets {
    /// GitHub personal access token
    pub token: Option<String>,
}

impl Secrets {
    /// Load secrets from the default location, or empty secrets if absent
    pub fn load() -> Result<Self> {
        match Self::default_secrets_path() {
            Some(path) if path.exists() => Self::load_from_file(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load secrets from a specific file, refusing loosely permissioned files
    pub fn load_from_file(path: &Path) -> Result<Self> {
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;

            let mode = std::fs::metadata(path)?.permissions().mode();
            if mode & 0o077 != 0 {
                return Err(Error::Config(format!(
                    "Secrets file {} has insecure permissions {:o}. \
                     Please run: chmod 600 {}",
                    path.display(),
                    mode & 0o777,
                    path.display()
                )));
            }
        }

        let contents = std::fs::read_to_string(path)?;
        let mut secrets: Secrets = toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse secrets: {}", e)))?;

        secrets.github.token = secrets
            .github
            .token
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());

        debug!(path = %path.display(), "Loaded secrets file");
        Ok(secrets)
    }

    /// `~/.config/prboard/secrets.toml` on Unix
    pub fn default_secrets_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("prboard").join("secrets.toml"))
    }

    /// GitHub token, preferring the environment over the secrets file
    pub fn github_token(&self) -> Option<String> {
        let from_env = std::env::var(TOKEN_ENV_VAR).ok();
        self.resolve_token(from_env)
    }

    fn resolve_token(&self, from_env: Option<String>) -> Option<String> {
        if let Some(token) = from_env.map(|t| t.trim().to_string()) {
            if !token.is_empty() {
                debug!("Using GitHub token from {}", TOKEN_ENV_VAR);
                return Some(token);
            }
        }

        self.github.token.clone().filter(|t| !t.is_empty())
    }
}
