//! Prediction DTOs

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use validator::Validate;

use domain_fraud::{ClaimFeatures, ModelClaim, PredictionResult, RiskLevel, ScorerKind};

/// Claim as submitted by an adjuster, scored by the heuristic
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ClaimRequest {
    #[validate(range(exclusive_min = 0.0, max = 1_000_000_000_000.0, message = "must be positive and at most 1e12"))]
    pub claim_amount: f64,
    #[validate(length(min = 1, max = 100))]
    pub claim_type: String,
    #[validate(range(min = 0, max = 150))]
    pub customer_age: i32,
    #[validate(range(min = 0, max = 150))]
    pub policy_tenure: i32,
    #[validate(length(max = 2000))]
    pub claim_description: String,
    #[validate(length(max = 500))]
    pub location: String,
    #[validate(range(max = 1000))]
    pub witness_count: u32,
}

impl From<ClaimRequest> for ClaimFeatures {
    fn from(request: ClaimRequest) -> Self {
        ClaimFeatures {
            claim_amount: request.claim_amount,
            claim_type: request.claim_type,
            customer_age: request.customer_age,
            policy_tenure: request.policy_tenure,
            witness_count: request.witness_count,
            claim_description: request.claim_description,
            location: request.location,
        }
    }
}

/// Claim in the schema the ensemble models were trained on
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ModelClaimRequest {
    #[validate(range(exclusive_min = 0.0, max = 1_000_000_000_000.0, message = "must be positive and at most 1e12"))]
    pub claim_amount: f64,
    #[validate(range(max = 4))]
    pub claim_type: u8,
    pub customer_history: u32,
    #[validate(range(max = 23))]
    pub claim_hour: u8,
    #[validate(range(max = 2))]
    pub risk_region: u8,
    #[validate(range(min = 1))]
    pub policy_age_months: u32,
    pub documentation_flag: bool,
}

impl From<ModelClaimRequest> for ModelClaim {
    fn from(request: ModelClaimRequest) -> Self {
        ModelClaim {
            claim_amount: request.claim_amount,
            claim_type: request.claim_type,
            customer_history: request.customer_history,
            claim_hour: request.claim_hour,
            risk_region: request.risk_region,
            policy_age_months: request.policy_age_months,
            documentation_flag: request.documentation_flag,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FraudPredictionResponse {
    pub fraud_probability: f64,
    pub risk_level: RiskLevel,
    pub confidence: f64,
    pub recommendation: String,
    pub model_version: String,
    /// e.g. `"0.002 seconds"`
    pub processing_time: String,
    pub scorer: ScorerKind,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub risk_factors: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub model_scores: BTreeMap<String, f64>,
}

impl From<PredictionResult> for FraudPredictionResponse {
    fn from(result: PredictionResult) -> Self {
        Self {
            processing_time: result.processing_time_display(),
            fraud_probability: result.fraud_probability.value(),
            risk_level: result.risk_level,
            confidence: result.confidence.value(),
            recommendation: result.recommendation,
            model_version: result.model_version,
            scorer: result.scorer,
            risk_factors: result.risk_factors,
            model_scores: result.model_scores,
        }
    }
}
