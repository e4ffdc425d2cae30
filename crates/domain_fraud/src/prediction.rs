//! Prediction result assembly

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

use core_kernel::Probability;

use crate::risk::{RiskLevel, RiskPolicy};

/// Model version reported by the heuristic scorer.
///
/// Heuristic results never carry the ensemble's version string, so callers
/// can tell which scorer produced a result from `model_version` alone.
pub const HEURISTIC_MODEL_VERSION: &str = "heuristic_v1.0";

/// Model version reported by the ensemble scorer
pub const ENSEMBLE_MODEL_VERSION: &str = "ensemble_v1.0";

/// Which scorer produced a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScorerKind {
    Heuristic,
    Ensemble,
}

/// Outcome of scoring one claim. Created per request and never persisted here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub fraud_probability: Probability,
    pub risk_level: RiskLevel,
    /// For the heuristic this is a sampled, decorative value, not a calibrated
    /// metric. For the ensemble it is the agreement between models.
    pub confidence: Probability,
    pub recommendation: String,
    pub model_version: String,
    pub processing_time: Duration,
    pub scorer: ScorerKind,
    /// Heuristic rules that fired, in evaluation order
    #[serde(default)]
    pub risk_factors: Vec<String>,
    /// Per-model probabilities (ensemble only)
    #[serde(default)]
    pub model_scores: BTreeMap<String, f64>,
}

/// Builds a [`PredictionResult`] from a final probability.
///
/// Classification happens on the unrounded probability; the reported value is
/// rounded afterwards.
#[derive(Debug)]
pub(crate) struct ResultBuilder {
    scorer: ScorerKind,
    policy: RiskPolicy,
    probability: Probability,
    confidence: Probability,
    round_dp: u32,
    risk_factors: Vec<String>,
    model_scores: BTreeMap<String, f64>,
}

impl ResultBuilder {
    pub(crate) fn new(scorer: ScorerKind, policy: RiskPolicy, probability: Probability) -> Self {
        let round_dp = match scorer {
            ScorerKind::Heuristic => 3,
            ScorerKind::Ensemble => 4,
        };
        Self {
            scorer,
            policy,
            probability,
            confidence: Probability::ZERO,
            round_dp,
            risk_factors: Vec::new(),
            model_scores: BTreeMap::new(),
        }
    }

    pub(crate) fn confidence(mut self, confidence: Probability) -> Self {
        self.confidence = confidence;
        self
    }

    pub(crate) fn risk_factors(mut self, factors: Vec<String>) -> Self {
        self.risk_factors = factors;
        self
    }

    pub(crate) fn model_scores(mut self, scores: BTreeMap<String, f64>) -> Self {
        self.model_scores = scores;
        self
    }

    pub(crate) fn finish(self, processing_time: Duration) -> PredictionResult {
        let risk_level = self.policy.classify(self.probability);
        let model_version = match self.scorer {
            ScorerKind::Heuristic => HEURISTIC_MODEL_VERSION,
            ScorerKind::Ensemble => ENSEMBLE_MODEL_VERSION,
        };

        PredictionResult {
            fraud_probability: self.probability.round_dp(self.round_dp),
            risk_level,
            confidence: self.confidence,
            recommendation: risk_level.recommendation().to_string(),
            model_version: model_version.to_string(),
            processing_time,
            scorer: self.scorer,
            risk_factors: self.risk_factors,
            model_scores: self.model_scores,
        }
    }
}

impl PredictionResult {
    /// Processing time formatted the way the HTTP surface reports it
    pub fn processing_time_display(&self) -> String {
        format!("{:.3} seconds", self.processing_time.as_secs_f64())
    }
}
