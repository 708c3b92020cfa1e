//! Configuration for a dashboard session.

use crate::{Result, error::DashboardError, pagination::PageSize, store::RefreshPolicy};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

pub const ENV_API_URL: &str = "JOBDECK_API_URL";
pub const ENV_REFRESH_SECS: &str = "JOBDECK_REFRESH_SECS";
pub const ENV_PAGE_SIZE: &str = "JOBDECK_PAGE_SIZE";

/// Main configuration for a dashboard session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Base URL of the scheduler's job API
    pub api_base_url: String,

    /// Period of the background list refresh
    pub refresh_interval: Duration,

    /// Timeout applied to every repository request
    pub request_timeout: Duration,

    /// Initial rows per page
    pub page_size: PageSize,

    /// How overlapping refreshes resolve
    pub refresh_policy: RefreshPolicy,

    /// User agent sent with every request
    pub user_agent: String,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:3000".to_string(),
            refresh_interval: Duration::from_secs(30),
            request_timeout: Duration::from_secs(30),
            page_size: PageSize::default(),
            refresh_policy: RefreshPolicy::default(),
            user_agent: format!("jobdeck/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl DashboardConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_api_base_url(mut self, url: &str) -> Self {
        self.api_base_url = url.to_string();
        self
    }

    pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = interval;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_page_size(mut self, page_size: PageSize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_refresh_policy(mut self, policy: RefreshPolicy) -> Self {
        self.refresh_policy = policy;
        self
    }

    /// Defaults, then the user config file if present, then environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(path) = Self::default_path() {
            if path.exists() {
                debug!("Loading configuration from {}", path.display());
                config = Self::from_file(&path)?;
            }
        }

        config.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply `JOBDECK_*` overrides looked up through `lookup`.
    pub fn apply_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(url) = lookup(ENV_API_URL) {
            self.api_base_url = url;
        }

        if let Some(secs) = lookup(ENV_REFRESH_SECS) {
            let secs: u64 = secs.trim().parse().map_err(|_| {
                DashboardError::Config(format!("{} must be a number of seconds", ENV_REFRESH_SECS))
            })?;
            self.refresh_interval = Duration::from_secs(secs);
        }

        if let Some(size) = lookup(ENV_PAGE_SIZE) {
            let size: u32 = size.trim().parse().map_err(|_| {
                DashboardError::Config(format!("{} must be 5, 10, 20 or 50", ENV_PAGE_SIZE))
            })?;
            self.page_size = PageSize::try_from(size).map_err(DashboardError::Config)?;
        }

        Ok(self)
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// `<config dir>/jobdeck/config.toml`
    pub fn default_path() -> Result<PathBuf> {
        let mut path = dirs::config_dir()
            .or_else(dirs::home_dir)
            .ok_or_else(|| DashboardError::Config("Cannot find config directory".to_string()))?;

        path.push("jobdeck");
        path.push("config.toml");
        Ok(path)
    }
}
