//! Health and status DTOs

use serde::{Deserialize, Serialize};

use domain_fraud::LifecycleState;

pub const API_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Routes listed by the status endpoint
pub const ENDPOINTS: [&str; 8] = [
    "/health",
    "/health/ready",
    "/api/v1/predict-fraud",
    "/api/v1/predict-fraud/ensemble",
    "/api/v1/claims",
    "/api/v1/analytics",
    "/api/v1/fraud-stats",
    "/api/v1/status",
];

#[derive(Debug, Serialize, Deserialize)]
pub struct RootResponse {
    pub message: String,
    pub status: String,
    pub version: String,
    pub ai_enabled: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Components {
    pub api: String,
    pub claim_store: String,
    /// Ensemble lifecycle state
    pub ml_models: LifecycleState,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub components: Components,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub api_version: String,
    pub ai_enabled: bool,
    pub models_loaded: bool,
    pub ensemble_state: LifecycleState,
    pub total_claims_processed: usize,
    pub endpoints: Vec<String>,
}
