//! Analytics handlers

use axum::{extract::State, Json};

use domain_fraud::{FraudAnalytics, FraudStatistics};

use crate::dto::analytics::*;
use crate::{error::ApiError, AppState};

pub async fn get_analytics(State(state): State<AppState>) -> Result<Json<AnalyticsResponse>, ApiError> {
    let records = state.claims.list().await?;
    let summary = FraudAnalytics::summarize(&records, &state.config.analytics_policy())?;
    Ok(Json(summary.into()))
}

/// Detailed statistics for the executive dashboard
pub async fn fraud_statistics(State(state): State<AppState>) -> Result<Json<FraudStatsResponse>, ApiError> {
    let records = state.claims.list().await?;
    let stats = FraudStatistics::compute(&records, &state.config.analytics_policy())?;
    Ok(Json(stats.into()))
}
