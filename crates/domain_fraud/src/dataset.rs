//! Labeled training data and the synthetic claim generator

use rand::distributions::{Bernoulli, Distribution};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Exp, Poisson};
use serde::{Deserialize, Serialize};

use crate::claim::{ModelClaim, CLAIM_TYPE_CODES, RISK_REGIONS};
use crate::error::FraudError;
use crate::features::FeatureVector;

/// Mean of the exponential claim amount distribution
pub const SYNTHETIC_MEAN_AMOUNT: f64 = 5_000.0;

/// Mean prior-claim count of the synthetic population
pub const SYNTHETIC_MEAN_HISTORY: f64 = 2.0;

/// Share of synthetic claims labeled fraudulent
pub const SYNTHETIC_FRAUD_RATE: f64 = 0.1;

/// Claims paired with fraud labels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledClaims {
    claims: Vec<ModelClaim>,
    labels: Vec<bool>,
}

impl LabeledClaims {
    /// Pairs claims with labels. Every claim must validate.
    pub fn new(claims: Vec<ModelClaim>, labels: Vec<bool>) -> Result<Self, FraudError> {
        if claims.len() != labels.len() {
            return Err(FraudError::validation(format!(
                "{} claims but {} labels",
                claims.len(),
                labels.len()
            )));
        }
        if claims.is_empty() {
            return Err(FraudError::validation("labeled dataset is empty"));
        }
        for (i, claim) in claims.iter().enumerate() {
            claim
                .validate()
                .map_err(|e| FraudError::validation(format!("claim {i}: {e}")))?;
        }
        Ok(Self { claims, labels })
    }

    pub fn claims(&self) -> &[ModelClaim] {
        &self.claims
    }

    pub fn labels(&self) -> &[bool] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.claims.len()
    }

    pub fn is_empty(&self) -> bool {
        self.claims.is_empty()
    }

    pub fn positives(&self) -> usize {
        self.labels.iter().filter(|&&y| y).count()
    }

    pub fn fraud_rate(&self) -> f64 {
        self.positives() as f64 / self.len() as f64
    }

    /// Derived, unscaled feature matrix in `MODEL_FEATURE_NAMES` order
    pub fn feature_matrix(&self) -> Result<Vec<Vec<f64>>, FraudError> {
        FeatureVector::derive_batch(&self.claims)
    }

    /// Fails unless both classes are present
    pub fn ensure_trainable(&self) -> Result<(), FraudError> {
        let positives = self.positives();
        if positives == 0 || positives == self.len() {
            return Err(FraudError::training(format!(
                "dataset needs both classes, got {positives} fraudulent of {}",
                self.len()
            )));
        }
        Ok(())
    }

    /// Draws `n` claims from the synthetic claim population.
    ///
    /// Labels are independent of the features, so models trained on this
    /// data are expected to score near chance.
    pub fn synthetic(n: usize, seed: u64) -> Result<Self, FraudError> {
        let mut rng = StdRng::seed_from_u64(seed);
        let amount = Exp::new(1.0 / SYNTHETIC_MEAN_AMOUNT)
            .map_err(|e| FraudError::configuration(e.to_string()))?;
        let history = Poisson::new(SYNTHETIC_MEAN_HISTORY)
            .map_err(|e| FraudError::configuration(e.to_string()))?;
        let fraud = Bernoulli::new(SYNTHETIC_FRAUD_RATE)
            .map_err(|e| FraudError::configuration(e.to_string()))?;

        let mut claims = Vec::with_capacity(n);
        let mut labels = Vec::with_capacity(n);
        for _ in 0..n {
            let prior_claims: f64 = history.sample(&mut rng);
            claims.push(ModelClaim {
                claim_amount: amount.sample(&mut rng).max(0.01),
                claim_type: rng.gen_range(0..CLAIM_TYPE_CODES),
                customer_history: prior_claims as u32,
                claim_hour: rng.gen_range(0..24),
                risk_region: rng.gen_range(0..RISK_REGIONS),
                policy_age_months: rng.gen_range(1..240),
                documentation_flag: rng.gen_bool(0.5),
            });
            labels.push(fraud.sample(&mut rng));
        }
        Self::new(claims, labels)
    }
}

/// Free-function form of [`LabeledClaims::synthetic`]
pub fn generate_synthetic_claims(n: usize, seed: u64) -> Result<LabeledClaims, FraudError> {
    LabeledClaims::synthetic(n, seed)
}
