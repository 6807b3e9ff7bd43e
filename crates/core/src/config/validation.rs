//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::AppConfig;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },
}

const MIN_TIMEOUT_MS: u64 = 100;
const MAX_TIMEOUT_MS: u64 = 300_000;

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid { field: field.into(), reason: reason.into() }
}

fn check_timeout(field: &str, value: u64) -> Result<(), ConfigError> {
    if value < MIN_TIMEOUT_MS {
        return Err(invalid(field, "must be at least 100ms"));
    }
    if value > MAX_TIMEOUT_MS {
        return Err(invalid(field, "must not exceed 5 minutes (300000ms)"));
    }
    Ok(())
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `max_bytes` is 0 or exceeds 50MB
    /// - any timeout is below 100ms or above 5 minutes
    /// - the link deadline exceeds the analysis deadline, or a probe exceeds the link deadline
    /// - `probe_concurrency` is 0 or above 64
    /// - a cache size or TTL is 0
    /// - `user_agent` is empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_bytes == 0 {
            return Err(invalid("max_bytes", "must be greater than 0"));
        }
        if self.max_bytes > 50 * 1024 * 1024 {
            return Err(invalid("max_bytes", "must not exceed 50MB"));
        }

        check_timeout("analysis_timeout_ms", self.analysis_timeout_ms)?;
        check_timeout("fetch_timeout_ms", self.fetch_timeout_ms)?;
        check_timeout("link_check_timeout_ms", self.link_check_timeout_ms)?;
        check_timeout("probe_timeout_ms", self.probe_timeout_ms)?;

        if self.link_check_timeout_ms > self.analysis_timeout_ms {
            return Err(invalid("link_check_timeout_ms", "must not exceed analysis_timeout_ms"));
        }
        if self.probe_timeout_ms > self.link_check_timeout_ms {
            return Err(invalid("probe_timeout_ms", "must not exceed link_check_timeout_ms"));
        }

        if self.probe_concurrency == 0 || self.probe_concurrency > 64 {
            return Err(invalid("probe_concurrency", "must be between 1 and 64"));
        }

        if self.max_cache_size == 0 {
            return Err(invalid("max_cache_size", "must be greater than 0"));
        }
        if self.max_link_cache_size == 0 {
            return Err(invalid("max_link_cache_size", "must be greater than 0"));
        }
        if self.analysis_cache_ttl_secs == 0 {
            return Err(invalid("analysis_cache_ttl_secs", "must be greater than 0"));
        }
        if self.link_cache_ttl_secs == 0 {
            return Err(invalid("link_cache_ttl_secs", "must be greater than 0"));
        }
        if self.sweep_interval_secs == 0 {
            return Err(invalid("sweep_interval_secs", "must be greater than 0"));
        }
        if self.stats_flush_interval_secs == 0 {
            return Err(invalid("stats_flush_interval_secs", "must be greater than 0"));
        }

        if self.user_agent.is_empty() {
            return Err(invalid("user_agent", "must not be empty"));
        }

        if self.fetch_timeout_ms > self.analysis_timeout_ms {
            tracing::warn!(
                fetch_timeout_ms = self.fetch_timeout_ms,
                analysis_timeout_ms = self.analysis_timeout_ms,
                "fetch timeout exceeds the analysis deadline; the analysis deadline wins"
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_default_config() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_max_bytes_zero() {
        let config = AppConfig { max_bytes: 0, ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "max_bytes"));
    }

    #[test]
    fn test_validate_timeout_too_small() {
        let config = AppConfig { probe_timeout_ms: 50, ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "probe_timeout_ms"));
    }

    #[test]
    fn test_validate_timeout_exceeds_limit() {
        let config = AppConfig { analysis_timeout_ms: 301_000, ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "analysis_timeout_ms"));
    }

    #[test]
    fn test_validate_link_deadline_nested() {
        let config = AppConfig { analysis_timeout_ms: 10_000, link_check_timeout_ms: 15_000, ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "link_check_timeout_ms"));
    }

    #[test]
    fn test_validate_probe_within_link_deadline() {
        let config = AppConfig { link_check_timeout_ms: 4_000, ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "probe_timeout_ms"));
    }

    #[test]
    fn test_validate_probe_concurrency() {
        let config = AppConfig { probe_concurrency: 0, ..Default::default() };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { field, .. }) if field == "probe_concurrency"));

        let config = AppConfig { probe_concurrency: 65, ..Default::default() };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { field, .. }) if field == "probe_concurrency"));
    }

    #[test]
    fn test_validate_zero_cache_size() {
        let config = AppConfig { max_link_cache_size: 0, ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "max_link_cache_size"));
    }

    #[test]
    fn test_validate_empty_user_agent() {
        let config = AppConfig { user_agent: String::new(), ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "user_agent"));
    }

    #[test]
    fn test_validate_edge_case_values() {
        let config = AppConfig {
            max_bytes: 1,
            analysis_timeout_ms: 100,
            fetch_timeout_ms: 100,
            link_check_timeout_ms: 100,
            probe_timeout_ms: 100,
            probe_concurrency: 1,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }
}
