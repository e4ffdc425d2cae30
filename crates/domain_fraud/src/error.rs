//! Fraud domain errors

use thiserror::Error;

use core_kernel::CoreError;

/// Errors that can occur while scoring, training, or persisting models
#[derive(Debug, Error)]
pub enum FraudError {
    /// Malformed or missing claim fields. Surfaced to the caller, never retried.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Ensemble artifacts absent or corrupt at first use
    #[error("Model load error: {0}")]
    ModelLoad(String),

    /// Weights, boundaries or hyperparameters rejected at construction
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Training error: {0}")]
    Training(String),

    /// A classifier or scaler was used before `fit`
    #[error("Not fitted: {0}")]
    NotFitted(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A monetary aggregate left the range `Decimal` can hold
    #[error("Arithmetic overflow: {0}")]
    Overflow(String),

    #[error("Lock poisoned: {0}")]
    LockPoisoned(String),

    #[error(transparent)]
    Core(#[from] CoreError),
}

impl FraudError {
    pub fn validation(message: impl Into<String>) -> Self {
        FraudError::Validation(message.into())
    }

    pub fn model_load(message: impl Into<String>) -> Self {
        FraudError::ModelLoad(message.into())
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        FraudError::Configuration(message.into())
    }

    pub fn training(message: impl Into<String>) -> Self {
        FraudError::Training(message.into())
    }

    /// True for errors caused by the caller's input rather than engine state
    pub fn is_client_error(&self) -> bool {
        matches!(self, FraudError::Validation(_) | FraudError::Core(CoreError::Validation(_)))
    }
}
