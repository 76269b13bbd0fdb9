//! Configuration loading and representation.

use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

use bazaar_core::PaginationConfig;
use bazaar_core::pagination::{DEFAULT_LIMIT, DEFAULT_MAX_LIMIT};

pub const ENV_DATABASE_URL: &str = "BAZAAR_DATABASE_URL";
pub const ENV_DEFAULT_PAGE_SIZE: &str = "BAZAAR_DEFAULT_PAGE_SIZE";
pub const ENV_MAX_PAGE_SIZE: &str = "BAZAAR_MAX_PAGE_SIZE";
pub const ENV_MAX_CONNECTIONS: &str = "BAZAAR_MAX_CONNECTIONS";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key} must be a positive integer, got '{value}'")]
    InvalidNumber { key: &'static str, value: String },

    #[error("default page size {default} exceeds max page size {max}")]
    PageSizeOrder { default: u64, max: u64 },
}

/// Infrastructure settings.
///
/// Loaded from the environment with [`InfraConfig::from_env`], or deserialized
/// from any serde source; missing keys fall back to [`Default`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InfraConfig {
    /// Postgres connection string. `None` selects the in-memory stores.
    pub database_url: Option<String>,

    pub default_page_size: u64,

    pub max_page_size: u64,

    pub max_connections: u32,
}

impl Default for InfraConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            default_page_size: DEFAULT_LIMIT,
            max_page_size: DEFAULT_MAX_LIMIT,
            max_connections: 5,
        }
    }
}

impl InfraConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (the environment, a map in tests).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let config = Self {
            database_url: lookup(ENV_DATABASE_URL).filter(|url| !url.trim().is_empty()),
            default_page_size: positive(&lookup, ENV_DEFAULT_PAGE_SIZE)?
                .unwrap_or(defaults.default_page_size),
            max_page_size: positive(&lookup, ENV_MAX_PAGE_SIZE)?
                .unwrap_or(defaults.max_page_size),
            max_connections: positive(&lookup, ENV_MAX_CONNECTIONS)?
                .map(|n| u32::try_from(n).unwrap_or(u32::MAX))
                .unwrap_or(defaults.max_connections),
        };
        config.validate()?;

        if config.database_url.is_none() {
            warn!("{ENV_DATABASE_URL} not set; using in-memory stores");
        }
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (key, value) in [
            ("default_page_size", self.default_page_size),
            ("max_page_size", self.max_page_size),
            ("max_connections", u64::from(self.max_connections)),
        ] {
            if value == 0 {
                return Err(ConfigError::InvalidNumber {
                    key,
                    value: value.to_string(),
                });
            }
        }
        if self.default_page_size > self.max_page_size {
            return Err(ConfigError::PageSizeOrder {
                default: self.default_page_size,
                max: self.max_page_size,
            });
        }
        Ok(())
    }

    pub fn pagination(&self) -> PaginationConfig {
        PaginationConfig {
            default_limit: self.default_page_size,
            max_limit: self.max_page_size,
        }
    }
}

fn positive<F>(lookup: &F, key: &'static str) -> Result<Option<u64>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(key) else {
        return Ok(None);
    };
    match raw.trim().parse::<u64>() {
        Ok(n) if n > 0 => Ok(Some(n)),
        _ => Err(ConfigError::InvalidNumber { key, value: raw }),
    }
}
