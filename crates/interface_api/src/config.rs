//! API and training configuration
//!
//! Both binaries read their settings from the environment through the
//! `config` crate: `API_*` variables for the server, `TRAIN_*` for the
//! training driver. Anything unset falls back to the defaults below.

use rust_decimal::Decimal;
use serde::Deserialize;
use std::path::PathBuf;

use domain_fraud::AnalyticsPolicy;

/// Output format for the tracing subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// API server configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// Log level
    pub log_level: String,
    pub log_format: LogFormat,
    /// Directory holding the ensemble artifacts
    pub model_dir: PathBuf,
    /// Load the ensemble at startup instead of on the first request
    pub preload_models: bool,
    /// Scores at or above this count as detected fraud in analytics
    pub fraud_threshold: f64,
    /// Loss assumed prevented per detected fraud
    pub prevented_loss_per_fraud: Decimal,
}

impl Default for ApiConfig {
    fn default() -> Self {
        let analytics = AnalyticsPolicy::default();
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
            model_dir: PathBuf::from("models"),
            preload_models: false,
            fraud_threshold: analytics.fraud_threshold,
            prevented_loss_per_fraud: analytics.prevented_loss_per_fraud,
        }
    }
}

impl ApiConfig {
    /// Loads configuration from environment
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::Environment::with_prefix("API").try_parsing(true))
            .build()?
            .try_deserialize()
    }

    /// Returns the server address
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn analytics_policy(&self) -> AnalyticsPolicy {
        AnalyticsPolicy {
            fraud_threshold: self.fraud_threshold,
            prevented_loss_per_fraud: self.prevented_loss_per_fraud,
        }
    }
}

/// Offline training configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TrainConfig {
    /// Where artifacts and the training report are written
    pub model_dir: PathBuf,
    /// Number of synthetic claims to generate
    pub samples: usize,
    pub seed: u64,
    /// Cross-validation folds
    pub folds: usize,
    pub log_level: String,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("models"),
            samples: 12_000,
            seed: 42,
            folds: 5,
            log_level: "info".to_string(),
        }
    }
}

impl TrainConfig {
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::Environment::with_prefix("TRAIN").try_parsing(true))
            .build()?
            .try_deserialize()
    }
}
