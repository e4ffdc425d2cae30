//! Fraud prediction handlers

use axum::{extract::State, Json};
use tracing::info;
use validator::Validate;

use domain_fraud::{ClaimFeatures, ModelClaim, PredictionResult, RngSource};

use crate::dto::prediction::*;
use crate::{error::ApiError, AppState};

/// Heuristic scoring with thread-local randomness
pub(crate) fn score_heuristic(state: &AppState, claim: &ClaimFeatures) -> Result<PredictionResult, ApiError> {
    let result = state.engine.score_heuristic(claim, &mut RngSource::thread())?;
    Ok(result)
}

/// Scores a claim with the rule-based heuristic
pub async fn predict_fraud(
    State(state): State<AppState>,
    Json(request): Json<ClaimRequest>,
) -> Result<Json<FraudPredictionResponse>, ApiError> {
    request.validate()?;
    let claim = ClaimFeatures::from(request);
    let result = score_heuristic(&state, &claim)?;

    info!(
        scorer = "heuristic",
        probability = result.fraud_probability.value(),
        risk_level = %result.risk_level,
        "Claim scored"
    );
    Ok(Json(result.into()))
}

/// Scores a claim with the weighted ensemble.
///
/// The first call may load the model set from disk, so scoring runs on the
/// blocking pool. Missing artifacts answer 503; there is no fallback to the
/// heuristic.
pub async fn predict_fraud_ensemble(
    State(state): State<AppState>,
    Json(request): Json<ModelClaimRequest>,
) -> Result<Json<FraudPredictionResponse>, ApiError> {
    request.validate()?;
    let claim = ModelClaim::from(request);
    let engine = state.engine.clone();
    let result = tokio::task::spawn_blocking(move || engine.score_ensemble(&claim))
        .await
        .map_err(|e| ApiError::Internal(format!("ensemble scoring task failed: {e}")))??;

    info!(
        scorer = "ensemble",
        probability = result.fraud_probability.value(),
        risk_level = %result.risk_level,
        "Claim scored"
    );
    Ok(Json(result.into()))
}
