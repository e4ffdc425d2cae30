//! Rule-based heuristic scorer
//!
//! A stateless accumulator over raw claim fields. Rule weights are summed as
//! decimals so the base score is exact, then a small jitter from the injected
//! [`RandomSource`] is added and the result clamped to `[0, 1]`.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

use core_kernel::Probability;

use crate::claim::ClaimFeatures;
use crate::error::FraudError;
use crate::features::HeuristicFeatures;
use crate::prediction::{PredictionResult, ResultBuilder, ScorerKind};
use crate::random::{RandomSource, CONFIDENCE_RANGE, JITTER_BOUND};
use crate::risk::RiskPolicy;

/// Description keywords that add risk (substring match, case-insensitive)
pub const SUSPICIOUS_DESCRIPTION_TERMS: [&str; 4] = ["total loss", "stolen", "fire", "vandalism"];

/// Location keywords that add risk (substring match, case-insensitive)
pub const SUSPICIOUS_LOCATION_TERMS: [&str; 2] = ["remote", "parking lot"];

/// Individual heuristic rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeuristicRule {
    /// Amount in (50 000, 100 000]
    ElevatedAmount,
    /// Amount above 100 000
    HighAmount,
    /// Customer younger than 25 or older than 65
    AgeOutlier,
    /// Tenure under one year
    NewPolicy,
    /// Tenure of one or two years
    ShortTenure,
    NoWitnesses,
    SuspiciousDescription,
    SuspiciousLocation,
}

impl HeuristicRule {
    pub fn weight(&self) -> Decimal {
        match self {
            HeuristicRule::ElevatedAmount => dec!(0.3),
            HeuristicRule::HighAmount => dec!(0.5),
            HeuristicRule::AgeOutlier => dec!(0.2),
            HeuristicRule::NewPolicy => dec!(0.3),
            HeuristicRule::ShortTenure => dec!(0.1),
            HeuristicRule::NoWitnesses => dec!(0.2),
            HeuristicRule::SuspiciousDescription => dec!(0.1),
            HeuristicRule::SuspiciousLocation => dec!(0.1),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HeuristicRule::ElevatedAmount => "elevated_amount",
            HeuristicRule::HighAmount => "high_amount",
            HeuristicRule::AgeOutlier => "age_outlier",
            HeuristicRule::NewPolicy => "new_policy",
            HeuristicRule::ShortTenure => "short_tenure",
            HeuristicRule::NoWitnesses => "no_witnesses",
            HeuristicRule::SuspiciousDescription => "suspicious_description",
            HeuristicRule::SuspiciousLocation => "suspicious_location",
        }
    }
}

/// Rules that fired for one claim and their summed weight
#[derive(Debug, Clone, PartialEq)]
pub struct RuleEvaluation {
    pub fired: Vec<HeuristicRule>,
    /// Sum of fired weights, before jitter and clamping. Can exceed 1.
    pub base_score: Decimal,
}

/// Deterministic rule accumulator with injected jitter
#[derive(Debug, Clone)]
pub struct HeuristicScorer {
    policy: RiskPolicy,
}

impl Default for HeuristicScorer {
    fn default() -> Self {
        Self::new()
    }
}

impl HeuristicScorer {
    pub fn new() -> Self {
        Self {
            policy: RiskPolicy::HEURISTIC,
        }
    }

    pub fn policy(&self) -> &RiskPolicy {
        &self.policy
    }

    /// Evaluates every rule against the derived features
    pub fn evaluate(&self, features: &HeuristicFeatures) -> RuleEvaluation {
        let mut fired = Vec::new();

        // The two amount tiers are exclusive: above 100 000 only the high tier applies
        if features.amount > 100_000.0 {
            fired.push(HeuristicRule::HighAmount);
        } else if features.amount > 50_000.0 {
            fired.push(HeuristicRule::ElevatedAmount);
        }

        if features.age < 25 || features.age > 65 {
            fired.push(HeuristicRule::AgeOutlier);
        }

        if features.tenure < 1 {
            fired.push(HeuristicRule::NewPolicy);
        } else if features.tenure < 3 {
            fired.push(HeuristicRule::ShortTenure);
        }

        if features.witnesses == 0 {
            fired.push(HeuristicRule::NoWitnesses);
        }

        if contains_any(&features.description, &SUSPICIOUS_DESCRIPTION_TERMS) {
            fired.push(HeuristicRule::SuspiciousDescription);
        }

        if contains_any(&features.location, &SUSPICIOUS_LOCATION_TERMS) {
            fired.push(HeuristicRule::SuspiciousLocation);
        }

        let base_score = fired.iter().map(HeuristicRule::weight).sum();
        RuleEvaluation { fired, base_score }
    }

    /// Scores a claim.
    ///
    /// With a fixed random source the result is a pure function of the claim.
    /// The reported confidence is sampled, not derived from the score.
    pub fn score(
        &self,
        claim: &ClaimFeatures,
        rng: &mut dyn RandomSource,
    ) -> Result<PredictionResult, FraudError> {
        let started = Instant::now();
        let features = HeuristicFeatures::derive(claim)?;
        let evaluation = self.evaluate(&features);

        let jitter = rng.jitter().clamp(-JITTER_BOUND, JITTER_BOUND);
        let base = evaluation.base_score.to_f64().unwrap_or_default();
        let probability = Probability::clamped(base + jitter);

        let confidence = rng.confidence().clamp(CONFIDENCE_RANGE.0, CONFIDENCE_RANGE.1);
        // Rounded to two places; both range ends are already two-place values
        let confidence = Probability::clamped((confidence * 100.0).round() / 100.0);

        let risk_factors = evaluation
            .fired
            .iter()
            .map(|rule| rule.as_str().to_string())
            .collect();

        let result = ResultBuilder::new(ScorerKind::Heuristic, self.policy, probability)
            .confidence(confidence)
            .risk_factors(risk_factors)
            .finish(started.elapsed());

        debug!(
            base_score = %evaluation.base_score,
            jitter,
            probability = result.fraud_probability.value(),
            risk_level = %result.risk_level,
            "Heuristic score computed"
        );

        Ok(result)
    }
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| haystack.contains(needle))
}
