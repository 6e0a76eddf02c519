//! Configuration for warden-core

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main engine configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WardenConfig {
    /// Decision cache configuration
    #[serde(default)]
    pub cache: CacheConfig,

    /// Evaluation configuration
    #[serde(default)]
    pub evaluation: EvaluationConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Decision cache configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Memoize actor queries in the actor's decision cache
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Evaluation configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationConfig {
    /// Maximum nesting of definitions and label references
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Denial message when a policy supplies none
    #[serde(default = "default_denial_message")]
    pub default_denial_message: String,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            default_denial_message: default_denial_message(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level, used when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,

    /// JSON format
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// Default value helpers
fn default_true() -> bool {
    true
}

fn default_max_depth() -> usize {
    64
}

fn default_denial_message() -> String {
    "You are not authorized to access this content".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl WardenConfig {
    /// Load configuration: defaults, then an optional file, then
    /// `WARDEN_*` environment variables (`WARDEN_EVALUATION__MAX_DEPTH=8`).
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder();

        builder = builder.add_source(config::Config::try_from(&WardenConfig::default())?);

        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("WARDEN")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: WardenConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.evaluation.max_depth == 0 {
            return Err(ConfigError::Invalid(
                "evaluation.max_depth must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Create a development configuration
    pub fn development() -> Self {
        Self {
            logging: LoggingConfig {
                level: "debug".to_string(),
                json: false,
            },
            ..Default::default()
        }
    }
}
