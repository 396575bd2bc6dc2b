//! Configuration types for httpmaker.
//!
//! An executor is described by a [`MakerConfig`], usually read from an
//! `httpmaker.yaml` file and then adjusted through `HTTPMAKER_*` variables.

pub mod env;
pub mod loader;
pub mod types;

pub use env::*;
pub use loader::*;
pub use types::*;

use std::path::PathBuf;

/// Load configuration the way applications normally want it: `.env` files,
/// then the YAML file (`HTTPMAKER_CONFIG_PATH` or `./httpmaker.yaml`), then
/// environment overrides, then validation.
pub fn load_config() -> Result<MakerConfig, ConfigError> {
    Environment::init();

    let config = match Environment::get(vars::HTTPMAKER_CONFIG_PATH) {
        Some(path) => {
            let path = PathBuf::from(path);
            ConfigLoader::default().load_file(path)?
        }
        None => ConfigLoader::default().load()?,
    };

    let config = apply_env_overrides(config)?;
    validate(&config)?;
    Ok(config)
}
