//! Health check handlers

use axum::{extract::State, http::StatusCode, Json};

use domain_fraud::LifecycleState;

use crate::dto::status::*;
use crate::{error::ApiError, AppState};

pub async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        message: "Insurance Fraud Detection API is running!".to_string(),
        status: "healthy".to_string(),
        version: API_VERSION.to_string(),
        ai_enabled: true,
    })
}

fn health(status: &str, ml_models: LifecycleState) -> HealthResponse {
    HealthResponse {
        status: status.to_string(),
        version: API_VERSION.to_string(),
        components: Components {
            api: "active".to_string(),
            claim_store: "active".to_string(),
            ml_models,
        },
    }
}

/// Health check endpoint. The heuristic scorer is always available, so the
/// service is healthy whatever the ensemble state.
pub async fn health_check(State(state): State<AppState>) -> Result<Json<HealthResponse>, ApiError> {
    let models = state.engine.ensemble_state()?;
    Ok(Json(health("healthy", models)))
}

/// Readiness check. With `preload_models` set, the service is only ready
/// once the ensemble is fitted.
pub async fn readiness_check(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<HealthResponse>), ApiError> {
    let models = state.engine.ensemble_state()?;
    if state.config.preload_models && models != LifecycleState::Fitted {
        return Ok((StatusCode::SERVICE_UNAVAILABLE, Json(health("not_ready", models))));
    }
    Ok((StatusCode::OK, Json(health("ready", models))))
}

pub async fn api_status(State(state): State<AppState>) -> Result<Json<StatusResponse>, ApiError> {
    let models = state.engine.ensemble_state()?;
    let processed = state.claims.count().await?;
    Ok(Json(StatusResponse {
        api_version: API_VERSION.to_string(),
        ai_enabled: true,
        models_loaded: models == LifecycleState::Fitted,
        ensemble_state: models,
        total_claims_processed: processed,
        endpoints: ENDPOINTS.iter().map(|e| e.to_string()).collect(),
    }))
}
