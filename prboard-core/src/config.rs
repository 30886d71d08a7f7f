//! Configuration management for prboard
//!
//! Configuration is loaded with the following priority (highest to lowest):
//! 1. CLI flags
//! 2. Environment variables (PRBOARD_*)
//! 3. Config file (`--config` path, or ~/.config/prboard/config.toml)
//! 4. Default values

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::model::{Author, RepositoryRef};
use crate::{Error, Result};

/// Largest page size the GitHub search API accepts
pub const MAX_PER_PAGE: u8 = 100;

/// HTTP server settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Port to listen on
    pub port: u16,

    /// Directory of static dashboard assets, served for unmatched paths
    pub static_dir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            static_dir: None,
        }
    }
}

/// Query cache settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    /// How long a fetched grid or PR list is served before refetching
    #[serde(with = "humantime_serde")]
    pub ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(60),
        }
    }
}

/// Upstream search paging settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Results requested per page
    pub per_page: u8,

    /// Hard limit on pages fetched per query, whatever the reported total
    pub page_cap: u32,

    /// Pause between consecutive page requests
    #[serde(with = "humantime_serde")]
    pub page_delay: Duration,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            per_page: MAX_PER_PAGE,
            page_cap: 5,
            page_delay: Duration::from_millis(100),
        }
    }
}

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Repositories shown in the grid, in display order
    pub repos: Vec<RepositoryRef>,

    /// Authors shown in the grid, in display order
    pub authors: Vec<Author>,

    pub server: ServerConfig,
    pub cache: CacheConfig,
    pub search: SearchConfig,
}

impl Config {
    /// Load configuration from the default config file location
    ///
    /// Returns default config if file doesn't exist
    pub fn load() -> Result<Self> {
        match Self::default_config_path() {
            Some(path) if path.exists() => Self::load_from_file(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default config file path
    ///
    /// Returns `~/.config/prboard/config.toml` on Unix
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("prboard").join("config.toml"))
    }

    /// Reject settings the search loop cannot work with
    ///
    /// Empty repository or author lists are allowed and produce an empty grid.
    pub fn validate(&self) -> Result<()> {
        if self.search.per_page == 0 || self.search.per_page > MAX_PER_PAGE {
            return Err(Error::Config(format!(
                "search.per_page must be between 1 and {}, got {}",
                MAX_PER_PAGE, self.search.per_page
            )));
        }
        if self.search.page_cap == 0 {
            return Err(Error::Config("search.page_cap must be at least 1".to_string()));
        }
        if self.cache.ttl.is_zero() {
            return Err(Error::Config("cache.ttl must be greater than zero".to_string()));
        }
        if self.repos.is_empty() || self.authors.is_empty() {
            warn!(
                repos = self.repos.len(),
                authors = self.authors.len(),
                "No repositories or authors configured, the grid will be empty"
            );
        }
        Ok(())
    }

    /// Apply environment variable overrides
    ///
    /// Supported variables:
    /// - PRBOARD_PORT: Port to listen on
    /// - PRBOARD_STATIC_DIR: Static asset directory
    /// - PRBOARD_CACHE_TTL: Cache TTL as a duration (e.g. "60s", "5m")
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|name| std::env::var(name).ok())
    }

    fn with_overrides_from(mut self, var: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(port) = var("PRBOARD_PORT") {
            match port.parse() {
                Ok(port) => self.server.port = port,
                Err(_) => warn!(value = %port, "Ignoring invalid PRBOARD_PORT"),
            }
        }

        if let Some(dir) = var("PRBOARD_STATIC_DIR") {
            self.server.static_dir = Some(PathBuf::from(dir));
        }

        if let Some(ttl) = var("PRBOARD_CACHE_TTL") {
            match humantime::parse_duration(&ttl) {
                Ok(ttl) if !ttl.is_zero() => self.cache.ttl = ttl,
                _ => warn!(value = %ttl, "Ignoring invalid PRBOARD_CACHE_TTL"),
            }
        }

        self
    }

    /// Apply CLI flag overrides
    pub fn with_cli_overrides(mut self, port: Option<u16>, static_dir: Option<PathBuf>) -> Self {
        if let Some(port) = port {
            self.server.port = port;
        }

        if let Some(dir) = static_dir {
            self.server.static_dir = Some(dir);
        }

        self
    }

    /// Load configuration with all overrides applied
    ///
    /// Priority: CLI > env > config file > defaults
    pub fn load_with_overrides(
        path: Option<&Path>,
        port: Option<u16>,
        static_dir: Option<PathBuf>,
    ) -> Result<Self> {
        let config = match path {
            Some(path) => Self::load_from_file(path)?,
            None => Self::load()?,
        };

        Ok(config
            .with_env_overrides()
            .with_cli_overrides(port, static_dir))
    }
}
