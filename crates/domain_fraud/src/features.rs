//! Feature derivation
//!
//! Turns raw claim attributes into the inputs each scorer expects. The
//! heuristic path only normalizes text; the ensemble path appends two
//! engineered features. Both are pure functions of their input.
//!
//! The model vector order is fixed by [`MODEL_FEATURE_NAMES`]. The scaler and
//! every classifier are fitted on vectors in this order, so inference must
//! produce exactly the same layout.

use serde::{Deserialize, Serialize};

use crate::claim::{ClaimFeatures, ModelClaim};
use crate::error::FraudError;

/// Feature layout of the ensemble models, in vector order
pub const MODEL_FEATURE_NAMES: [&str; 9] = [
    "claim_amount",
    "claim_type",
    "customer_history",
    "claim_hour",
    "risk_region",
    "policy_age_months",
    "documentation_flag",
    "amount_per_history",
    "hour_risk",
];

/// Width of the derived model feature vector
pub const MODEL_FEATURE_COUNT: usize = MODEL_FEATURE_NAMES.len();

/// Hours of the day (inclusive) treated as high-risk filing times
pub const HIGH_RISK_HOURS: std::ops::RangeInclusive<u8> = 0..=3;

/// Inputs of the heuristic scorer
#[derive(Debug, Clone, PartialEq)]
pub struct HeuristicFeatures {
    pub amount: f64,
    pub age: i32,
    pub tenure: i32,
    pub witnesses: u32,
    /// Lower-cased claim description
    pub description: String,
    /// Lower-cased location
    pub location: String,
}

impl HeuristicFeatures {
    /// Validates the claim and normalizes its text fields
    pub fn derive(claim: &ClaimFeatures) -> Result<Self, FraudError> {
        claim.validate()?;
        Ok(Self {
            amount: claim.claim_amount,
            age: claim.customer_age,
            tenure: claim.policy_tenure,
            witnesses: claim.witness_count,
            description: claim.claim_description.to_lowercase(),
            location: claim.location.to_lowercase(),
        })
    }
}

/// Derived ensemble input, ordered as [`MODEL_FEATURE_NAMES`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector(pub [f64; MODEL_FEATURE_COUNT]);

impl FeatureVector {
    /// Validates the claim and appends `amount_per_history` and `hour_risk`
    pub fn derive(claim: &ModelClaim) -> Result<Self, FraudError> {
        claim.validate()?;
        Ok(Self([
            claim.claim_amount,
            f64::from(claim.claim_type),
            f64::from(claim.customer_history),
            f64::from(claim.claim_hour),
            f64::from(claim.risk_region),
            f64::from(claim.policy_age_months),
            if claim.documentation_flag { 1.0 } else { 0.0 },
            amount_per_history(claim.claim_amount, claim.customer_history),
            hour_risk(claim.claim_hour),
        ]))
    }

    /// Derives a row-major matrix for a batch of claims
    pub fn derive_batch(claims: &[ModelClaim]) -> Result<Vec<Vec<f64>>, FraudError> {
        claims
            .iter()
            .map(|c| Self::derive(c).map(|v| v.0.to_vec()))
            .collect()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// Looks up a feature by name
    pub fn get(&self, name: &str) -> Option<f64> {
        MODEL_FEATURE_NAMES
            .iter()
            .position(|n| *n == name)
            .map(|i| self.0[i])
    }
}

/// Claim amount spread over the customer's claim history.
/// The denominator always carries `+ 1`, so zero history is safe.
pub fn amount_per_history(claim_amount: f64, customer_history: u32) -> f64 {
    claim_amount / (f64::from(customer_history) + 1.0)
}

/// 1.0 when the claim was filed inside [`HIGH_RISK_HOURS`], else 0.0
pub fn hour_risk(claim_hour: u8) -> f64 {
    if HIGH_RISK_HOURS.contains(&claim_hour) {
        1.0
    } else {
        0.0
    }
}
