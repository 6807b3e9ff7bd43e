//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (SEOSCOPE_*)
//! 2. TOML config file (if SEOSCOPE_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use crate::cache::CacheOptions;
use crate::stats::StatsOptions;

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (SEOSCOPE_*)
/// 2. TOML config file (if SEOSCOPE_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Directory holding `stats.json` and any legacy `statistics.json`.
    ///
    /// Set via SEOSCOPE_DATA_DIR environment variable.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// User-Agent string for page fetches and link probes.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Maximum bytes to fetch per page.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// Outer deadline for one analysis (fetch plus link checking), in milliseconds.
    #[serde(default = "default_analysis_timeout_ms")]
    pub analysis_timeout_ms: u64,

    /// Primary page fetch timeout in milliseconds.
    #[serde(default = "default_fetch_timeout_ms")]
    pub fetch_timeout_ms: u64,

    /// Deadline for the whole link fan-out in milliseconds.
    #[serde(default = "default_link_check_timeout_ms")]
    pub link_check_timeout_ms: u64,

    /// Timeout for a single link probe in milliseconds.
    #[serde(default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,

    /// Maximum number of link probes in flight at once.
    #[serde(default = "default_probe_concurrency")]
    pub probe_concurrency: usize,

    /// Analysis cache TTL in seconds.
    #[serde(default = "default_analysis_cache_ttl_secs")]
    pub analysis_cache_ttl_secs: u64,

    /// Link cache TTL in seconds.
    #[serde(default = "default_link_cache_ttl_secs")]
    pub link_cache_ttl_secs: u64,

    /// Maximum number of cached analyses.
    #[serde(default = "default_max_cache_size")]
    pub max_cache_size: usize,

    /// Maximum number of cached link verdicts.
    #[serde(default = "default_max_link_cache_size")]
    pub max_link_cache_size: usize,

    /// Cache sweep period in seconds.
    ///
    /// Also the threshold after which a request triggers an opportunistic sweep.
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,

    /// Statistics persistence period in seconds.
    #[serde(default = "default_stats_flush_interval_secs")]
    pub stats_flush_interval_secs: u64,

    /// Months kept before the current one by the daily retention pass.
    #[serde(default = "default_stats_retain_months")]
    pub stats_retain_months: u32,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_user_agent() -> String {
    "SEOAnalyzer/1.0".into()
}

fn default_max_bytes() -> usize {
    10 * 1024 * 1024
}

fn default_analysis_timeout_ms() -> u64 {
    30_000
}

fn default_fetch_timeout_ms() -> u64 {
    15_000
}

fn default_link_check_timeout_ms() -> u64 {
    15_000
}

fn default_probe_timeout_ms() -> u64 {
    5_000
}

fn default_probe_concurrency() -> usize {
    10
}

fn default_analysis_cache_ttl_secs() -> u64 {
    30 * 60
}

fn default_link_cache_ttl_secs() -> u64 {
    10 * 60
}

fn default_max_cache_size() -> usize {
    1_000
}

fn default_max_link_cache_size() -> usize {
    10_000
}

fn default_sweep_interval_secs() -> u64 {
    5 * 60
}

fn default_stats_flush_interval_secs() -> u64 {
    60
}

fn default_stats_retain_months() -> u32 {
    1
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            user_agent: default_user_agent(),
            max_bytes: default_max_bytes(),
            analysis_timeout_ms: default_analysis_timeout_ms(),
            fetch_timeout_ms: default_fetch_timeout_ms(),
            link_check_timeout_ms: default_link_check_timeout_ms(),
            probe_timeout_ms: default_probe_timeout_ms(),
            probe_concurrency: default_probe_concurrency(),
            analysis_cache_ttl_secs: default_analysis_cache_ttl_secs(),
            link_cache_ttl_secs: default_link_cache_ttl_secs(),
            max_cache_size: default_max_cache_size(),
            max_link_cache_size: default_max_link_cache_size(),
            sweep_interval_secs: default_sweep_interval_secs(),
            stats_flush_interval_secs: default_stats_flush_interval_secs(),
            stats_retain_months: default_stats_retain_months(),
        }
    }
}

impl AppConfig {
    /// Outer analysis deadline.
    pub fn analysis_timeout(&self) -> Duration {
        Duration::from_millis(self.analysis_timeout_ms)
    }

    /// Page fetch timeout for use with reqwest.
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }

    /// Nested deadline for link checking.
    pub fn link_check_timeout(&self) -> Duration {
        Duration::from_millis(self.link_check_timeout_ms)
    }

    /// Per-probe timeout.
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    /// Sweep period shared by both caches and the janitor.
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    /// Options for the analysis cache.
    pub fn cache_options(&self) -> CacheOptions {
        CacheOptions {
            ttl: Duration::from_secs(self.analysis_cache_ttl_secs),
            max_size: self.max_cache_size,
            sweep_interval: self.sweep_interval(),
        }
    }

    /// Options for the link cache.
    pub fn link_cache_options(&self) -> CacheOptions {
        CacheOptions {
            ttl: Duration::from_secs(self.link_cache_ttl_secs),
            max_size: self.max_link_cache_size,
            sweep_interval: self.sweep_interval(),
        }
    }

    /// Options for the statistics store.
    pub fn stats_options(&self) -> StatsOptions {
        StatsOptions {
            data_dir: self.data_dir.clone(),
            flush_interval: Duration::from_secs(self.stats_flush_interval_secs),
            retain_months: Some(self.stats_retain_months),
        }
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `SEOSCOPE_`
    /// 2. TOML file from `SEOSCOPE_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("SEOSCOPE_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("SEOSCOPE_")
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.data_dir, PathBuf::from("./data"));
        assert_eq!(config.user_agent, "SEOAnalyzer/1.0");
        assert_eq!(config.analysis_timeout_ms, 30_000);
        assert_eq!(config.link_check_timeout_ms, 15_000);
        assert_eq!(config.probe_timeout_ms, 5_000);
        assert_eq!(config.probe_concurrency, 10);
        assert_eq!(config.max_cache_size, 1_000);
        assert_eq!(config.max_link_cache_size, 10_000);
        assert_eq!(config.stats_retain_months, 1);
    }

    #[test]
    fn test_duration_accessors() {
        let config = AppConfig::default();
        assert_eq!(config.analysis_timeout(), Duration::from_secs(30));
        assert_eq!(config.fetch_timeout(), Duration::from_secs(15));
        assert_eq!(config.link_check_timeout(), Duration::from_secs(15));
        assert_eq!(config.probe_timeout(), Duration::from_secs(5));
        assert_eq!(config.sweep_interval(), Duration::from_secs(300));
    }

    #[test]
    fn test_cache_options() {
        let config = AppConfig { max_cache_size: 5, analysis_cache_ttl_secs: 2, ..Default::default() };
        let options = config.cache_options();
        assert_eq!(options.max_size, 5);
        assert_eq!(options.ttl, Duration::from_secs(2));

        let link_options = config.link_cache_options();
        assert_eq!(link_options.max_size, 10_000);
        assert_eq!(link_options.ttl, Duration::from_secs(600));
    }

    #[test]
    fn test_stats_options() {
        let config = AppConfig { data_dir: PathBuf::from("/tmp/seo"), ..Default::default() };
        let options = config.stats_options();
        assert_eq!(options.data_dir, PathBuf::from("/tmp/seo"));
        assert_eq!(options.flush_interval, Duration::from_secs(60));
        assert_eq!(options.retain_months, Some(1));
    }
}
