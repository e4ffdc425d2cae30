//! API error handling

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::error;
use validator::ValidationErrors;

use domain_fraud::FraudError;

/// API error types
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        details: Option<Vec<String>>,
    },

    /// The ensemble has no usable model set
    #[error("Models unavailable: {0}")]
    ModelsUnavailable(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Error response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<String>>,
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation {
            message: message.into(),
            details: None,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::ModelsUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (error_type, message, details) = match self {
            ApiError::Validation { message, details } => ("validation_error", message, details),
            ApiError::ModelsUnavailable(msg) => ("models_unavailable", msg, None),
            ApiError::Internal(msg) => {
                error!(error = %msg, "Request failed");
                ("internal_error", msg, None)
            }
        };

        let body = ErrorResponse {
            error: error_type.to_string(),
            message,
            details,
        };

        (status, Json(body)).into_response()
    }
}

impl From<FraudError> for ApiError {
    fn from(err: FraudError) -> Self {
        match err {
            e if e.is_client_error() => ApiError::validation(e.to_string()),
            FraudError::ModelLoad(msg) => ApiError::ModelsUnavailable(msg),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        let mut details: Vec<String> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| match &e.message {
                    Some(message) => format!("{field}: {message}"),
                    None => format!("{field}: {}", e.code),
                })
            })
            .collect();
        details.sort();
        ApiError::Validation {
            message: "Request body failed validation".to_string(),
            details: Some(details),
        }
    }
}
