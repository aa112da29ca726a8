//! Cache configuration.
//!
//! Mirrors the `[cache]` table of `quire.toml`. Unlike the settings layer,
//! construction here never clamps: a zero capacity or a zero TTL is rejected.

use std::num::NonZeroUsize;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_CAPACITY: usize = 100;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CacheError {
    #[error("invalid cache configuration for `{field}`: {reason}")]
    InvalidConfiguration { field: &'static str, reason: String },
}

impl CacheError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            field,
            reason: reason.into(),
        }
    }
}

/// Cache configuration from `quire.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Enable caching in front of the content loader.
    pub enabled: bool,
    /// Maximum entries held by each cache instance.
    pub capacity: usize,
    /// Optional expiry in milliseconds, measured from insertion.
    pub ttl_ms: Option<u64>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            capacity: DEFAULT_CAPACITY,
            ttl_ms: None,
        }
    }
}

impl From<&crate::config::CacheSettings> for CacheConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        Self {
            enabled: settings.enabled,
            capacity: settings.capacity.get(),
            ttl_ms: settings
                .ttl
                .map(|ttl| u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX)),
        }
    }
}

impl CacheConfig {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            ..Self::default()
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl_ms = Some(u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX));
        self
    }

    pub fn capacity_non_zero(&self) -> Result<NonZeroUsize, CacheError> {
        NonZeroUsize::new(self.capacity)
            .ok_or_else(|| CacheError::invalid("capacity", "must be greater than zero"))
    }

    pub fn ttl(&self) -> Result<Option<Duration>, CacheError> {
        match self.ttl_ms {
            None => Ok(None),
            Some(0) => Err(CacheError::invalid("ttl_ms", "must be greater than zero")),
            Some(ms) => Ok(Some(Duration::from_millis(ms))),
        }
    }

    /// Check every field, returning the first violation.
    pub fn validate(&self) -> Result<(), CacheError> {
        self.capacity_non_zero()?;
        self.ttl()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values() {
        let config = CacheConfig::default();
        assert!(config.enabled);
        assert_eq!(config.capacity, 100);
        assert_eq!(config.ttl_ms, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let err = CacheConfig::with_capacity(0)
            .validate()
            .expect_err("zero capacity");
        assert!(matches!(
            err,
            CacheError::InvalidConfiguration {
                field: "capacity",
                ..
            }
        ));
    }

    #[test]
    fn zero_ttl_is_rejected() {
        let config = CacheConfig {
            ttl_ms: Some(0),
            ..Default::default()
        };
        let err = config.validate().expect_err("zero ttl");
        assert!(matches!(
            err,
            CacheError::InvalidConfiguration { field: "ttl_ms", .. }
        ));
    }

    #[test]
    fn ttl_converts_to_duration() {
        let config = CacheConfig::default().with_ttl(Duration::from_secs(2));
        assert_eq!(config.ttl_ms, Some(2000));
        assert_eq!(config.ttl().expect("ttl"), Some(Duration::from_secs(2)));
    }
}
