//! Scored claim records and portfolio analytics
//!
//! Money is accumulated as `Decimal`; scores stay probabilities.

use chrono::{DateTime, Utc};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use core_kernel::{ClaimId, Probability};

use crate::claim::ClaimFeatures;
use crate::error::FraudError;
use crate::prediction::{PredictionResult, ScorerKind};
use crate::risk::RiskLevel;

/// A claim that has been scored, ready to be stored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewScoredClaim {
    pub claim_amount: Decimal,
    pub claim_type: String,
    pub customer_age: i32,
    pub fraud_score: Probability,
    pub risk_level: RiskLevel,
    pub recommendation: String,
    pub scorer: ScorerKind,
}

impl NewScoredClaim {
    pub fn from_prediction(claim: &ClaimFeatures, prediction: &PredictionResult) -> Result<Self, FraudError> {
        let claim_amount = Decimal::from_f64(claim.claim_amount)
            .ok_or_else(|| FraudError::validation(format!("claim_amount {} is not representable", claim.claim_amount)))?
            .round_dp(2);
        Ok(Self {
            claim_amount,
            claim_type: claim.claim_type.clone(),
            customer_age: claim.customer_age,
            fraud_score: prediction.fraud_probability,
            risk_level: prediction.risk_level,
            recommendation: prediction.recommendation.clone(),
            scorer: prediction.scorer,
        })
    }
}

/// A stored scored claim
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredClaim {
    pub id: ClaimId,
    /// Sequential per store, starting at 1
    pub claim_number: u64,
    pub claim_amount: Decimal,
    pub claim_type: String,
    pub customer_age: i32,
    pub fraud_score: Probability,
    pub risk_level: RiskLevel,
    pub recommendation: String,
    pub scorer: ScorerKind,
    pub created_at: DateTime<Utc>,
}

impl ScoredClaim {
    pub fn from_new(claim: NewScoredClaim, claim_number: u64, created_at: DateTime<Utc>) -> Self {
        Self {
            id: ClaimId::new(),
            claim_number,
            claim_amount: claim.claim_amount,
            claim_type: claim.claim_type,
            customer_age: claim.customer_age,
            fraud_score: claim.fraud_score,
            risk_level: claim.risk_level,
            recommendation: claim.recommendation,
            scorer: claim.scorer,
            created_at,
        }
    }
}

/// Thresholds behind the fraud-detected count and savings estimate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsPolicy {
    /// Scores at or above this count as detected fraud
    pub fraud_threshold: f64,
    /// Loss assumed prevented per detected fraud
    pub prevented_loss_per_fraud: Decimal,
}

impl Default for AnalyticsPolicy {
    fn default() -> Self {
        Self {
            fraud_threshold: 0.5,
            prevented_loss_per_fraud: dec!(50000),
        }
    }
}

impl AnalyticsPolicy {
    pub fn is_detected(&self, claim: &ScoredClaim) -> bool {
        claim.fraud_score.value() >= self.fraud_threshold
    }

    fn detected(&self, records: &[ScoredClaim]) -> usize {
        records.iter().filter(|c| self.is_detected(c)).count()
    }

    /// Savings estimate for `detected` frauds
    pub fn prevented_loss(&self, detected: usize) -> Result<Decimal, FraudError> {
        self.prevented_loss_per_fraud
            .checked_mul(Decimal::from(detected))
            .ok_or_else(|| FraudError::Overflow(format!("savings estimate for {detected} frauds")))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FraudAnalytics {
    pub total_claims: usize,
    pub fraud_detected: usize,
    /// Mean fraud score, three decimal places
    pub avg_fraud_score: Decimal,
    pub high_risk_claims: usize,
    pub savings_estimate: Decimal,
}

impl FraudAnalytics {
    /// Summarizes records. An empty store gives all zeros.
    pub fn summarize(records: &[ScoredClaim], policy: &AnalyticsPolicy) -> Result<Self, FraudError> {
        if records.is_empty() {
            return Ok(Self {
                total_claims: 0,
                fraud_detected: 0,
                avg_fraud_score: Decimal::ZERO,
                high_risk_claims: 0,
                savings_estimate: Decimal::ZERO,
            });
        }

        let fraud_detected = policy.detected(records);
        let score_sum = checked_sum(
            "fraud score total",
            records
                .iter()
                .map(|c| Decimal::from_f64(c.fraud_score.value()).unwrap_or_default()),
        )?;

        Ok(Self {
            total_claims: records.len(),
            fraud_detected,
            avg_fraud_score: round_half_up(score_sum / Decimal::from(records.len()), 3),
            high_risk_claims: records.iter().filter(|c| c.risk_level.is_high_risk()).count(),
            savings_estimate: policy.prevented_loss(fraud_detected)?,
        })
    }
}

/// Dashboard statistics over stored claims
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FraudStatistics {
    pub total_claims: usize,
    /// Percentage of claims detected as fraud, one decimal place
    pub fraud_detection_rate: Decimal,
    pub risk_distribution: BTreeMap<RiskLevel, usize>,
    pub average_claim_amount: Decimal,
    pub total_claims_value: Decimal,
    pub estimated_fraud_prevented: Decimal,
}

impl FraudStatistics {
    /// `None` when no claims have been stored
    pub fn compute(records: &[ScoredClaim], policy: &AnalyticsPolicy) -> Result<Option<Self>, FraudError> {
        if records.is_empty() {
            return Ok(None);
        }

        let total = Decimal::from(records.len());
        let detected = policy.detected(records);
        let total_value = checked_sum("total claim value", records.iter().map(|c| c.claim_amount))?;

        let mut risk_distribution = BTreeMap::new();
        for claim in records {
            *risk_distribution.entry(claim.risk_level).or_insert(0) += 1;
        }

        Ok(Some(Self {
            total_claims: records.len(),
            fraud_detection_rate: round_half_up(Decimal::from(detected) * dec!(100) / total, 1),
            risk_distribution,
            average_claim_amount: round_half_up(total_value / total, 2),
            total_claims_value: total_value,
            estimated_fraud_prevented: policy.prevented_loss(detected)?,
        }))
    }
}

fn checked_sum(what: &str, mut values: impl Iterator<Item = Decimal>) -> Result<Decimal, FraudError> {
    values.try_fold(Decimal::ZERO, |acc, v| {
        acc.checked_add(v)
            .ok_or_else(|| FraudError::Overflow(format!("{what} exceeds {}", Decimal::MAX)))
    })
}

fn round_half_up(value: Decimal, dp: u32) -> Decimal {
    value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
}

/// Formats an amount as `$1,234.56`
pub fn format_currency(amount: Decimal) -> String {
    let rounded = round_half_up(amount, 2);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let text = format!("{:.2}", rounded.abs());
    let (whole, cents) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("{}${grouped}.{cents}", if negative { "-" } else { "" })
}

/// Formats a percentage as `12.5%`
pub fn format_percent(rate: Decimal) -> String {
    format!("{:.1}%", round_half_up(rate, 1))
}
