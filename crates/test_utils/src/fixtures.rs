//! Pre-built Test Fixtures
//!
//! Provides ready-to-use claims, datasets and configurations for the fraud
//! scoring test suite. Values are fixed so that expected scores are known.

use domain_fraud::models::{BoostingParams, ForestParams, ModelParams, NeuralParams};
use domain_fraud::{ClaimFeatures, EnsembleConfig, FixedRandom, LabeledClaims, ModelClaim};

/// Fixture for heuristic-schema claims
pub struct ClaimFixtures;

impl ClaimFixtures {
    /// The documented reference claim: base score 0.8, Critical
    pub fn reference_claim() -> ClaimFeatures {
        ClaimFeatures {
            claim_amount: 75_000.0,
            claim_type: "Auto Accident".to_string(),
            customer_age: 25,
            policy_tenure: 2,
            witness_count: 0,
            claim_description: "Total loss in parking lot".to_string(),
            location: "Remote area".to_string(),
        }
    }

    /// A claim no heuristic rule fires on
    pub fn low_risk_claim() -> ClaimFeatures {
        ClaimFeatures {
            claim_amount: 1_200.0,
            claim_type: "Home Damage".to_string(),
            customer_age: 42,
            policy_tenure: 8,
            witness_count: 2,
            claim_description: "Burst pipe in kitchen".to_string(),
            location: "Downtown residence".to_string(),
        }
    }

    /// Only the high amount tier fires: base score 0.5
    pub fn high_value_claim() -> ClaimFeatures {
        ClaimFeatures {
            claim_amount: 150_000.0,
            ..Self::low_risk_claim()
        }
    }
}

/// Fixture for ensemble-schema claims
pub struct ModelClaimFixtures;

impl ModelClaimFixtures {
    pub fn daytime_claim() -> ModelClaim {
        ModelClaim {
            claim_amount: 4_200.0,
            claim_type: 1,
            customer_history: 2,
            claim_hour: 14,
            risk_region: 1,
            policy_age_months: 36,
            documentation_flag: true,
        }
    }

    /// Filed at 02:00 by a first-time claimant
    pub fn night_claim() -> ModelClaim {
        ModelClaim {
            claim_amount: 18_500.0,
            claim_type: 3,
            customer_history: 0,
            claim_hour: 2,
            risk_region: 2,
            policy_age_months: 3,
            documentation_flag: false,
        }
    }
}

/// Fixture for training data and configurations
pub struct TrainingFixtures;

impl TrainingFixtures {
    /// A small synthetic dataset with both classes present
    pub fn small_dataset() -> LabeledClaims {
        LabeledClaims::synthetic(400, 42).expect("synthetic dataset")
    }

    /// Ensemble configuration with tiny models, for fast tests
    pub fn fast_config() -> EnsembleConfig {
        EnsembleConfig {
            models: ModelParams {
                random_forest: ForestParams {
                    n_estimators: 8,
                    max_depth: Some(5),
                    ..ForestParams::default()
                },
                boosting: BoostingParams {
                    n_rounds: 8,
                    max_depth: 3,
                    ..BoostingParams::default()
                },
                neural_net: NeuralParams {
                    hidden_layers: vec![6],
                    max_epochs: 10,
                    ..NeuralParams::default()
                },
            },
            cv_folds: 3,
            ..EnsembleConfig::default()
        }
    }
}

/// Fixture for injected randomness
pub struct RandomFixtures;

impl RandomFixtures {
    pub fn zero_jitter() -> FixedRandom {
        FixedRandom::zero_jitter()
    }

    pub fn max_jitter() -> FixedRandom {
        FixedRandom::new(0.05, 0.98)
    }

    pub fn min_jitter() -> FixedRandom {
        FixedRandom::new(-0.05, 0.85)
    }
}
