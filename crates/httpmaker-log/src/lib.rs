//! Logging infrastructure for httpmaker.
//!
//! Library crates only emit `tracing` events; binaries and tests call
//! [`init`] once to install a subscriber.

use std::io;
use std::path::PathBuf;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer, Registry,
};

/// Distributed tracing utilities.
pub mod spans;

/// Convenience macros re-exported from tracing.
pub use tracing::{debug, error, info, trace, warn};

/// Environment variable names read by [`LogConfig::from_env`].
pub mod vars {
    pub const HTTPMAKER_LOG_LEVEL: &str = "HTTPMAKER_LOG_LEVEL";
    pub const HTTPMAKER_LOG_FORMAT: &str = "HTTPMAKER_LOG_FORMAT";
    pub const HTTPMAKER_LOG_FILE: &str = "HTTPMAKER_LOG_FILE";
    pub const HTTPMAKER_LOG_SOURCE: &str = "HTTPMAKER_LOG_SOURCE";
    pub const HTTPMAKER_LOG_SPANS: &str = "HTTPMAKER_LOG_SPANS";
    pub const RUST_LOG: &str = "RUST_LOG";
}

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Minimum log level.
    pub level: LogLevel,
    /// Output format.
    pub format: LogFormat,
    /// Log file path (if file logging enabled).
    pub file_path: Option<PathBuf>,
    /// Include source location.
    pub source_location: bool,
    /// Include span open/close events.
    pub span_events: bool,
}

/// Log level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Parse from string. `critical`/`crit` map to `Error`, since tracing
    /// has no level above it.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "trace" => Some(Self::Trace),
            "debug" => Some(Self::Debug),
            "info" => Some(Self::Info),
            "warn" | "warning" => Some(Self::Warn),
            "error" | "crit" | "critical" => Some(Self::Error),
            _ => None,
        }
    }

    fn as_directive(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl From<LogLevel> for tracing_subscriber::filter::LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => tracing_subscriber::filter::LevelFilter::TRACE,
            LogLevel::Debug => tracing_subscriber::filter::LevelFilter::DEBUG,
            LogLevel::Info => tracing_subscriber::filter::LevelFilter::INFO,
            LogLevel::Warn => tracing_subscriber::filter::LevelFilter::WARN,
            LogLevel::Error => tracing_subscriber::filter::LevelFilter::ERROR,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable pretty format.
    #[default]
    Pretty,
    /// Compact single-line format.
    Compact,
    /// JSON structured format.
    Json,
}

impl LogFormat {
    /// Parse from string, defaulting to `Pretty` for unknown values.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "json" => Self::Json,
            "compact" => Self::Compact,
            _ => Self::Pretty,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::default(),
            format: LogFormat::default(),
            file_path: None,
            source_location: false,
            span_events: false,
        }
    }
}

fn flag(value: &str) -> bool {
    value.eq_ignore_ascii_case("true") || value == "1"
}

impl LogConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        let level = std::env::var(vars::HTTPMAKER_LOG_LEVEL)
            .or_else(|_| std::env::var(vars::RUST_LOG))
            .ok()
            .and_then(|l| LogLevel::parse(&l));
        if let Some(level) = level {
            config.level = level;
        }

        if let Ok(format) = std::env::var(vars::HTTPMAKER_LOG_FORMAT) {
            config.format = LogFormat::parse(&format);
        }

        if let Ok(file_path) = std::env::var(vars::HTTPMAKER_LOG_FILE) {
            config.file_path = Some(PathBuf::from(file_path));
        }

        if let Ok(source_location) = std::env::var(vars::HTTPMAKER_LOG_SOURCE) {
            config.source_location = flag(&source_location);
        }

        if let Ok(span_events) = std::env::var(vars::HTTPMAKER_LOG_SPANS) {
            config.span_events = flag(&span_events);
        }

        config
    }

    fn span_events(&self) -> FmtSpan {
        if self.span_events {
            FmtSpan::NEW | FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        }
    }

    /// Build the stderr layer plus an optional file layer for this config.
    fn layers(&self) -> Result<Vec<Box<dyn Layer<Registry> + Send + Sync>>, LogError> {
        let mut layers = vec![self.format_layer(fmt::layer().with_writer(io::stderr), true)];

        if let Some(file_path) = &self.file_path {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(file_path)?;
            let writer = std::sync::Mutex::new(file);
            layers.push(self.format_layer(fmt::layer().with_writer(writer), false));
        }

        Ok(layers)
    }

    fn format_layer<W>(
        &self,
        layer: fmt::Layer<Registry, fmt::format::DefaultFields, fmt::format::Format, W>,
        ansi: bool,
    ) -> Box<dyn Layer<Registry> + Send + Sync>
    where
        W: for<'w> fmt::MakeWriter<'w> + Send + Sync + 'static,
    {
        let layer = layer.with_span_events(self.span_events());

        match self.format {
            LogFormat::Pretty => layer
                .with_ansi(ansi)
                .with_target(true)
                .with_file(self.source_location)
                .with_line_number(self.source_location)
                .boxed(),
            LogFormat::Compact => layer.compact().with_ansi(ansi).boxed(),
            LogFormat::Json => layer.json().boxed(),
        }
    }
}

/// Initialize logging with the given configuration.
///
/// `RUST_LOG` directives, when set and valid, take precedence over
/// `config.level`.
pub fn init(config: LogConfig) -> Result<(), LogError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.as_directive()));

    tracing_subscriber::registry()
        .with(config.layers()?)
        .with(filter)
        .try_init()
        .map_err(|e| LogError::InitError(e.to_string()))
}

/// Logging errors.
#[derive(Debug, thiserror::Error)]
pub enum LogError {
    #[error("failed to initialize logging: {0}")]
    InitError(String),

    #[error("failed to open log file: {0}")]
    FileError(#[from] io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn test_log_level_parse() {
        assert_eq!(LogLevel::parse("info"), Some(LogLevel::Info));
        assert_eq!(LogLevel::parse("DEBUG"), Some(LogLevel::Debug));
        assert_eq!(LogLevel::parse("Warning"), Some(LogLevel::Warn));
        assert_eq!(LogLevel::parse("crit"), Some(LogLevel::Error));
        assert_eq!(LogLevel::parse("trace"), Some(LogLevel::Trace));
        assert_eq!(LogLevel::parse("invalid"), None);
    }

    #[test]
    fn test_log_format_parse() {
        assert_eq!(LogFormat::parse("JSON"), LogFormat::Json);
        assert_eq!(LogFormat::parse("compact"), LogFormat::Compact);
        assert_eq!(LogFormat::parse("whatever"), LogFormat::Pretty);
    }

    #[test]
    fn test_log_level_from() {
        use tracing_subscriber::filter::LevelFilter;
        assert_eq!(LevelFilter::from(LogLevel::Trace), LevelFilter::TRACE);
        assert_eq!(LevelFilter::from(LogLevel::Error), LevelFilter::ERROR);
    }

    #[test]
    fn test_default_config() {
        let config = LogConfig::default();
        assert_eq!(config.level, LogLevel::Info);
        assert_eq!(config.format, LogFormat::Pretty);
        assert!(config.file_path.is_none());
        assert!(!config.source_location);
        assert!(!config.span_events);
    }

    #[test]
    fn test_config_from_env() {
        env::set_var(vars::HTTPMAKER_LOG_LEVEL, "debug");
        env::set_var(vars::HTTPMAKER_LOG_FORMAT, "json");
        env::set_var(vars::HTTPMAKER_LOG_FILE, "/tmp/httpmaker-test.log");
        env::set_var(vars::HTTPMAKER_LOG_SOURCE, "true");
        env::set_var(vars::HTTPMAKER_LOG_SPANS, "1");

        let config = LogConfig::from_env();
        assert_eq!(config.level, LogLevel::Debug);
        assert_eq!(config.format, LogFormat::Json);
        assert_eq!(config.file_path, Some(PathBuf::from("/tmp/httpmaker-test.log")));
        assert!(config.source_location);
        assert!(config.span_events);

        env::remove_var(vars::HTTPMAKER_LOG_LEVEL);
        env::remove_var(vars::HTTPMAKER_LOG_FORMAT);
        env::remove_var(vars::HTTPMAKER_LOG_FILE);
        env::remove_var(vars::HTTPMAKER_LOG_SOURCE);
        env::remove_var(vars::HTTPMAKER_LOG_SPANS);
    }

    #[test]
    fn test_layers_with_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = LogConfig {
            format: LogFormat::Compact,
            file_path: Some(dir.path().join("httpmaker.log")),
            ..LogConfig::default()
        };

        let layers = config.layers().unwrap();
        assert_eq!(layers.len(), 2);
        assert!(dir.path().join("httpmaker.log").exists());
    }

    #[test]
    fn test_layers_with_unwritable_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = LogConfig {
            file_path: Some(dir.path().join("missing").join("httpmaker.log")),
            ..LogConfig::default()
        };

        assert!(matches!(config.layers(), Err(LogError::FileError(_))));
    }
}
