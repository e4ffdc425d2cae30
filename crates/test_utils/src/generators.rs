//! Property-Based Test Generators
//!
//! Provides proptest strategies for generating claims that satisfy the
//! input contracts of both scorers.

use domain_fraud::heuristic::{SUSPICIOUS_DESCRIPTION_TERMS, SUSPICIOUS_LOCATION_TERMS};
use domain_fraud::{ClaimFeatures, FixedRandom, ModelClaim};
use proptest::prelude::*;

/// Strategy for positive claim amounts, including the tier boundaries
pub fn claim_amount_strategy() -> impl Strategy<Value = f64> {
    prop_oneof![
        0.01f64..500_000.0,
        Just(50_000.0),
        Just(100_000.0),
        Just(100_000.01),
    ]
}

/// Strategy for free text that sometimes contains a suspicious term
pub fn description_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-zA-Z ]{0,40}",
        proptest::sample::select(SUSPICIOUS_DESCRIPTION_TERMS.to_vec())
            .prop_map(|term| format!("Reported {} overnight", term.to_uppercase())),
    ]
}

pub fn location_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-zA-Z ]{0,30}",
        proptest::sample::select(SUSPICIOUS_LOCATION_TERMS.to_vec()).prop_map(|term| format!("Near {term}")),
    ]
}

/// Strategy for valid heuristic-schema claims
pub fn claim_features_strategy() -> impl Strategy<Value = ClaimFeatures> {
    (
        claim_amount_strategy(),
        "[A-Z][a-z]{2,12}",
        0i32..100,
        0i32..40,
        0u32..6,
        description_strategy(),
        location_strategy(),
    )
        .prop_map(
            |(claim_amount, claim_type, customer_age, policy_tenure, witness_count, claim_description, location)| {
                ClaimFeatures {
                    claim_amount,
                    claim_type,
                    customer_age,
                    policy_tenure,
                    witness_count,
                    claim_description,
                    location,
                }
            },
        )
}

/// Strategy for valid ensemble-schema claims
pub fn model_claim_strategy() -> impl Strategy<Value = ModelClaim> {
    (
        1.0f64..200_000.0,
        0u8..5,
        0u32..12,
        0u8..24,
        0u8..3,
        1u32..240,
        any::<bool>(),
    )
        .prop_map(
            |(claim_amount, claim_type, customer_history, claim_hour, risk_region, policy_age_months, documentation_flag)| {
                ModelClaim {
                    claim_amount,
                    claim_type,
                    customer_history,
                    claim_hour,
                    risk_region,
                    policy_age_months,
                    documentation_flag,
                }
            },
        )
}

/// Strategy for in-range randomness draws
pub fn fixed_random_strategy() -> impl Strategy<Value = FixedRandom> {
    (-0.05f64..=0.05, 0.85f64..=0.98).prop_map(|(jitter, confidence)| FixedRandom::new(jitter, confidence))
}

/// Strategy for arbitrary, possibly out-of-range draws
pub fn wild_random_strategy() -> impl Strategy<Value = FixedRandom> {
    (-10.0f64..10.0, -10.0f64..10.0).prop_map(|(jitter, confidence)| FixedRandom::new(jitter, confidence))
}

/// Strategy for probabilities in `[0, 1]`
pub fn probability_strategy() -> impl Strategy<Value = f64> {
    prop_oneof![0.0f64..=1.0, Just(0.0), Just(1.0), Just(0.3), Just(0.4), Just(0.6), Just(0.8), Just(0.85)]
}
