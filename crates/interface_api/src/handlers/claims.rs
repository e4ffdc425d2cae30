//! Claims handlers

use axum::{extract::State, http::StatusCode, Json};
use validator::Validate;

use domain_fraud::{ClaimFeatures, NewScoredClaim};

use crate::dto::claims::*;
use crate::dto::prediction::ClaimRequest;
use crate::handlers::predict::score_heuristic;
use crate::{error::ApiError, AppState};

/// Scores a new claim with the heuristic and stores the record
pub async fn create_claim(
    State(state): State<AppState>,
    Json(request): Json<ClaimRequest>,
) -> Result<(StatusCode, Json<ClaimCreatedResponse>), ApiError> {
    request.validate()?;
    let claim = ClaimFeatures::from(request);
    let prediction = score_heuristic(&state, &claim)?;

    let record = state
        .claims
        .insert(NewScoredClaim::from_prediction(&claim, &prediction)?)
        .await?;

    tracing::info!(
        claim_id = %record.id,
        claim_number = record.claim_number,
        risk_level = %record.risk_level,
        "Claim created"
    );
    Ok((
        StatusCode::CREATED,
        Json(ClaimCreatedResponse::new(&record, prediction.into())),
    ))
}

/// Lists stored claims in creation order
pub async fn list_claims(State(state): State<AppState>) -> Result<Json<Vec<ClaimRecordResponse>>, ApiError> {
    let records = state.claims.list().await?;
    Ok(Json(records.into_iter().map(ClaimRecordResponse::from).collect()))
}
