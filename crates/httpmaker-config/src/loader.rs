//! Configuration file loading and parsing.

use crate::types::MakerConfig;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name looked up inside the project directory.
pub const CONFIG_FILE_NAME: &str = "httpmaker.yaml";

static ENV_VAR_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\$\{([^}:]+)(?::-([^}]*))?\}").expect("env var pattern is a valid regex")
});

/// Config loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    NotFound { path: PathBuf },

    #[error("failed to read config: {source}")]
    ReadError {
        #[from]
        source: std::io::Error,
    },

    #[error(
        "invalid YAML at line {}: {message}",
        line.map(|l| l.to_string()).unwrap_or_else(|| "unknown".to_string())
    )]
    ParseError { line: Option<usize>, message: String },

    #[error("validation error: {message}")]
    ValidationError { message: String },

    #[error("environment variable not found: {var}")]
    EnvVarNotFound { var: String },

    #[error(transparent)]
    Env(#[from] crate::env::EnvError),
}

/// Configuration loader.
pub struct ConfigLoader {
    base_path: PathBuf,
}

impl ConfigLoader {
    /// Create a loader for the given project directory.
    pub fn new(project_dir: impl AsRef<Path>) -> Self {
        Self {
            base_path: project_dir.as_ref().to_path_buf(),
        }
    }

    /// Path of the config file this loader reads.
    pub fn config_path(&self) -> PathBuf {
        self.base_path.join(CONFIG_FILE_NAME)
    }

    /// Load `httpmaker.yaml`, falling back to defaults when it does not exist.
    pub fn load(&self) -> Result<MakerConfig, ConfigError> {
        let config_path = self.config_path();

        if !config_path.exists() {
            return Ok(MakerConfig::default());
        }

        self.load_file(&config_path)
    }

    /// Load a specific file. Missing files are an error here.
    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<MakerConfig, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.to_path_buf(),
            });
        }

        let contents = std::fs::read_to_string(path)?;
        self.parse(&contents)
    }

    /// Parse YAML text, expanding `${VAR}` references first.
    pub fn parse(&self, contents: &str) -> Result<MakerConfig, ConfigError> {
        let expanded = self.expand_env_vars(contents)?;

        let config: MakerConfig =
            serde_yaml::from_str(&expanded).map_err(|e| ConfigError::ParseError {
                line: e.location().map(|l| l.line()),
                message: e.to_string(),
            })?;

        validate(&config)?;
        Ok(config)
    }

    /// Expand environment variables in the form `${VAR}` or `${VAR:-default}`.
    fn expand_env_vars(&self, content: &str) -> Result<String, ConfigError> {
        let mut result = content.to_string();

        for cap in ENV_VAR_PATTERN.captures_iter(content) {
            let full_match = &cap[0];
            let var_name = &cap[1];
            let default = cap.get(2).map(|m| m.as_str());

            let value = match std::env::var(var_name) {
                Ok(v) => v,
                Err(_) => match default {
                    Some(d) => d.to_string(),
                    None => {
                        return Err(ConfigError::EnvVarNotFound {
                            var: var_name.to_string(),
                        })
                    }
                },
            };

            result = result.replace(full_match, &value);
        }

        Ok(result)
    }

    /// Save configuration to `httpmaker.yaml`.
    pub fn save(&self, config: &MakerConfig) -> Result<(), ConfigError> {
        std::fs::create_dir_all(&self.base_path)?;

        let yaml = serde_yaml::to_string(config).map_err(|e| ConfigError::ParseError {
            line: None,
            message: e.to_string(),
        })?;

        std::fs::write(self.config_path(), yaml)?;
        Ok(())
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new(std::env::current_dir().unwrap_or_default())
    }
}

/// Validate configuration values.
pub fn validate(config: &MakerConfig) -> Result<(), ConfigError> {
    if config.retry.max_attempts == 0 {
        return Err(ConfigError::ValidationError {
            message: "retry.max_attempts must be greater than 0".to_string(),
        });
    }

    if config.retry.timeout_secs == 0 {
        return Err(ConfigError::ValidationError {
            message: "retry.timeout_secs must be greater than 0".to_string(),
        });
    }

    if !config.base_url.is_empty()
        && !(config.base_url.starts_with("http://") || config.base_url.starts_with("https://"))
    {
        return Err(ConfigError::ValidationError {
            message: format!("base_url must be an http(s) URL, got {}", config.base_url),
        });
    }

    if let Some(cache) = &config.cache {
        if cache.dir.as_os_str().is_empty() {
            return Err(ConfigError::ValidationError {
                message: "cache.dir must not be empty".to_string(),
            });
        }
    }

    Ok(())
}
