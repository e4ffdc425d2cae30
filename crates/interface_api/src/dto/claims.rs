//! Claims DTOs

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

use core_kernel::ClaimId;
use domain_fraud::{RiskLevel, ScoredClaim};

use super::prediction::FraudPredictionResponse;

#[derive(Debug, Serialize, Deserialize)]
pub struct ClaimCreatedResponse {
    pub claim_created: bool,
    /// Sequential claim number
    pub claim_id: u64,
    pub record_id: ClaimId,
    pub fraud_analysis: FraudPredictionResponse,
    pub message: String,
}

impl ClaimCreatedResponse {
    pub fn new(record: &ScoredClaim, fraud_analysis: FraudPredictionResponse) -> Self {
        Self {
            claim_created: true,
            claim_id: record.claim_number,
            record_id: record.id,
            message: format!(
                "Claim {} created with {} risk level",
                record.claim_number,
                record.risk_level.as_str()
            ),
            fraud_analysis,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ClaimRecordResponse {
    pub claim_id: u64,
    pub record_id: ClaimId,
    pub claim_amount: f64,
    pub claim_type: String,
    pub customer_age: i32,
    pub fraud_score: f64,
    pub risk_level: RiskLevel,
    pub recommendation: String,
    pub created_at: DateTime<Utc>,
}

impl From<ScoredClaim> for ClaimRecordResponse {
    fn from(record: ScoredClaim) -> Self {
        Self {
            claim_id: record.claim_number,
            record_id: record.id,
            claim_amount: record.claim_amount.to_f64().unwrap_or_default(),
            claim_type: record.claim_type,
            customer_age: record.customer_age,
            fraud_score: record.fraud_score.value(),
            risk_level: record.risk_level,
            recommendation: record.recommendation,
            created_at: record.created_at,
        }
    }
}
