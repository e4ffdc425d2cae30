//! Kernel error type

use std::fmt::Display;
use thiserror::Error;

/// Errors raised by the kernel value types
#[derive(Debug, Error)]
pub enum CoreError {
    /// A value outside its allowed domain, such as a probability above 1
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid {kind} '{value}': {reason}")]
    InvalidIdentifier {
        kind: &'static str,
        value: String,
        reason: String,
    },
}

impl CoreError {
    pub fn validation(message: impl Into<String>) -> Self {
        CoreError::Validation(message.into())
    }

    pub fn invalid_identifier(kind: &'static str, value: impl Into<String>, reason: impl Display) -> Self {
        CoreError::InvalidIdentifier {
            kind,
            value: value.into(),
            reason: reason.to_string(),
        }
    }
}
