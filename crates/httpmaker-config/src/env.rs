//! Environment variable handling.

use crate::types::{CacheConfig, MakerConfig};
use std::env;
use std::path::PathBuf;
use thiserror::Error;

/// Environment variable errors.
#[derive(Debug, Error)]
pub enum EnvError {
    #[error("required environment variable not set: {var}")]
    NotSet { var: String },

    #[error("invalid value for {var}: {message}")]
    InvalidValue { var: String, message: String },
}

/// Environment variable names.
pub mod vars {
    pub const HTTPMAKER_BASE_URL: &str = "HTTPMAKER_BASE_URL";
    pub const HTTPMAKER_MAX_ATTEMPTS: &str = "HTTPMAKER_MAX_ATTEMPTS";
    pub const HTTPMAKER_TIMEOUT_SECS: &str = "HTTPMAKER_TIMEOUT_SECS";
    pub const HTTPMAKER_CACHE_DIR: &str = "HTTPMAKER_CACHE_DIR";
    pub const HTTPMAKER_CONFIG_PATH: &str = "HTTPMAKER_CONFIG_PATH";
}

/// Environment access helpers.
pub struct Environment {
    _guard: (),
}

impl Environment {
    /// Load `.env` then `.env.local` (later overrides earlier). Missing files are ignored.
    pub fn init() -> Self {
        let _ = dotenvy::from_filename(".env");
        let _ = dotenvy::from_filename(".env.local");
        Self { _guard: () }
    }

    /// Get a required string variable.
    pub fn require(var: &str) -> Result<String, EnvError> {
        env::var(var).map_err(|_| EnvError::NotSet {
            var: var.to_string(),
        })
    }

    /// Get an optional string variable.
    pub fn get(var: &str) -> Option<String> {
        env::var(var).ok()
    }

    /// Get an integer variable.
    pub fn get_int<T: std::str::FromStr>(var: &str) -> Result<Option<T>, EnvError> {
        match env::var(var) {
            Ok(v) => v.trim().parse().map(Some).map_err(|_| EnvError::InvalidValue {
                var: var.to_string(),
                message: format!("expected integer, got {v:?}"),
            }),
            Err(_) => Ok(None),
        }
    }
}

/// Apply `HTTPMAKER_*` overrides on top of a loaded configuration.
pub fn apply_env_overrides(mut config: MakerConfig) -> Result<MakerConfig, EnvError> {
    if let Some(base_url) = Environment::get(vars::HTTPMAKER_BASE_URL) {
        config.base_url = base_url;
    }

    if let Some(attempts) = Environment::get_int::<u32>(vars::HTTPMAKER_MAX_ATTEMPTS)? {
        config.retry.max_attempts = attempts;
    }

    if let Some(timeout) = Environment::get_int::<u64>(vars::HTTPMAKER_TIMEOUT_SECS)? {
        config.retry.timeout_secs = timeout;
    }

    if let Some(dir) = Environment::get(vars::HTTPMAKER_CACHE_DIR) {
        let cache = config.cache.get_or_insert_with(CacheConfig::default);
        cache.dir = PathBuf::from(dir);
    }

    Ok(config)
}
