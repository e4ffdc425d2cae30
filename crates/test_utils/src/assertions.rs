//! Custom Test Assertions
//!
//! Assertion helpers for prediction results that give more meaningful
//! messages than bare `assert!`.

use domain_fraud::random::CONFIDENCE_RANGE;
use domain_fraud::{PredictionResult, RiskPolicy, ScorerKind};

/// Asserts the probability and confidence are both within `[0, 1]`
pub fn assert_probability_bounds(result: &PredictionResult) {
    let p = result.fraud_probability.value();
    assert!(
        (0.0..=1.0).contains(&p),
        "fraud_probability out of bounds: {p}"
    );
    let c = result.confidence.value();
    assert!((0.0..=1.0).contains(&c), "confidence out of bounds: {c}");
}

/// Asserts a heuristic result's confidence lies in the sampled range
pub fn assert_heuristic_confidence(result: &PredictionResult) {
    assert_eq!(result.scorer, ScorerKind::Heuristic);
    let c = result.confidence.value();
    assert!(
        (CONFIDENCE_RANGE.0..=CONFIDENCE_RANGE.1).contains(&c),
        "heuristic confidence {c} outside {CONFIDENCE_RANGE:?}"
    );
}

/// Asserts the reported level and recommendation agree with the policy.
///
/// Classification happens before rounding, so a rounded value sitting on a
/// boundary may legitimately belong to the bucket below; both are accepted.
pub fn assert_risk_consistent(result: &PredictionResult, policy: &RiskPolicy) {
    let p = result.fraud_probability;
    let reported = result.risk_level;
    let from_rounded = policy.classify(p);
    let from_below = policy.classify(core_kernel::Probability::clamped(p.value() - 1e-4));
    assert!(
        reported == from_rounded || reported == from_below,
        "risk level {reported} inconsistent with probability {p} under {} policy",
        policy.name()
    );
    assert_eq!(result.recommendation, reported.recommendation());
}

/// Asserts two results agree on everything except processing time
pub fn assert_same_prediction(a: &PredictionResult, b: &PredictionResult) {
    assert_eq!(
        a.fraud_probability.value().to_bits(),
        b.fraud_probability.value().to_bits(),
        "fraud_probability differs: {} vs {}",
        a.fraud_probability,
        b.fraud_probability
    );
    assert_eq!(a.risk_level, b.risk_level);
    assert_eq!(a.confidence, b.confidence);
    assert_eq!(a.recommendation, b.recommendation);
    assert_eq!(a.model_version, b.model_version);
    assert_eq!(a.risk_factors, b.risk_factors);
    assert_eq!(a.model_scores, b.model_scores);
}
