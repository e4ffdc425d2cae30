//! Ensemble scorer and model lifecycle
//!
//! The fitted model set (scaler plus one classifier per [`ModelVariant`]) is
//! loaded lazily on the first scoring call and then shared read-only. The
//! lifecycle is an explicit state machine behind a mutex and condition
//! variable:
//!
//! ```text
//! Unfitted ──first score──► Fitting ──load ok──► Fitted
//!     ▲                        │                   ▲
//!     └────── load failed ─────┘                   │
//!                                  install (training swap)
//! ```
//!
//! Concurrent first callers wait on the condition variable while one of them
//! loads, so the repository is read at most once per successful load.
//! Training hands a new set to [`EnsembleScorer::install`], which swaps it in
//! atomically; requests already scoring keep the set they started with.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::time::Instant;
use tracing::{debug, info, warn};

use core_kernel::{ModelRunId, Probability};

use crate::claim::ModelClaim;
use crate::dataset::LabeledClaims;
use crate::error::FraudError;
use crate::evaluation::ClassificationReport;
use crate::features::{FeatureVector, MODEL_FEATURE_COUNT};
use crate::models::{FraudClassifier, ModelParams, ModelVariant};
use crate::ports::ModelRepository;
use crate::prediction::{PredictionResult, ResultBuilder, ScorerKind};
use crate::risk::RiskPolicy;
use crate::scaler::StandardScaler;

/// Allowed deviation of the weight sum from 1.0
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Convex combination weights, one per model family
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnsembleWeights {
    pub random_forest: f64,
    pub xgboost: f64,
    pub neural_net: f64,
}

impl Default for EnsembleWeights {
    fn default() -> Self {
        Self {
            random_forest: 0.4,
            xgboost: 0.4,
            neural_net: 0.2,
        }
    }
}

impl EnsembleWeights {
    pub fn new(random_forest: f64, xgboost: f64, neural_net: f64) -> Result<Self, FraudError> {
        let weights = Self {
            random_forest,
            xgboost,
            neural_net,
        };
        weights.validate()?;
        Ok(weights)
    }

    /// Each weight finite and non-negative, sum within tolerance of 1.0
    pub fn validate(&self) -> Result<(), FraudError> {
        let all = [self.random_forest, self.xgboost, self.neural_net];
        if all.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(FraudError::configuration(format!(
                "ensemble weights must be finite and non-negative, got {all:?}"
            )));
        }
        let sum = self.sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(FraudError::configuration(format!(
                "ensemble weights must sum to 1.0, got {sum}"
            )));
        }
        Ok(())
    }

    pub fn sum(&self) -> f64 {
        self.random_forest + self.xgboost + self.neural_net
    }

    pub fn weight(&self, variant: ModelVariant) -> f64 {
        match variant {
            ModelVariant::RandomForest => self.random_forest,
            ModelVariant::GradientBoosting => self.xgboost,
            ModelVariant::NeuralNet => self.neural_net,
        }
    }
}

/// Everything the ensemble needs to be built and trained
#[derive(Debug, Clone, PartialEq)]
pub struct EnsembleConfig {
    pub weights: EnsembleWeights,
    pub models: ModelParams,
    pub cv_folds: usize,
    /// Seed for fold assignment
    pub cv_seed: u64,
    pub policy: RiskPolicy,
}

impl Default for EnsembleConfig {
    fn default() -> Self {
        Self {
            weights: EnsembleWeights::default(),
            models: ModelParams::default(),
            cv_folds: 5,
            cv_seed: 42,
            policy: RiskPolicy::ENSEMBLE,
        }
    }
}

impl EnsembleConfig {
    pub fn validate(&self) -> Result<(), FraudError> {
        self.weights.validate()?;
        self.models.validate()?;
        if self.cv_folds < 2 {
            return Err(FraudError::configuration(format!(
                "cv_folds must be at least 2, got {}",
                self.cv_folds
            )));
        }
        Ok(())
    }
}

/// A fitted scaler and one fitted classifier per variant
#[derive(Debug)]
pub struct TrainedEnsemble {
    scaler: StandardScaler,
    models: Vec<Box<dyn FraudClassifier>>,
    run_id: ModelRunId,
    trained_at: DateTime<Utc>,
}

impl TrainedEnsemble {
    /// Assembles a model set, checking it is complete and consistent.
    ///
    /// Models are reordered to [`ModelVariant::ALL`] order.
    pub fn new(
        scaler: StandardScaler,
        models: Vec<Box<dyn FraudClassifier>>,
        run_id: ModelRunId,
        trained_at: DateTime<Utc>,
    ) -> Result<Self, FraudError> {
        scaler.verify()?;
        if scaler.n_features() != MODEL_FEATURE_COUNT {
            return Err(FraudError::model_load(format!(
                "scaler fitted on {} features, expected {MODEL_FEATURE_COUNT}",
                scaler.n_features()
            )));
        }

        let mut by_variant: BTreeMap<ModelVariant, Box<dyn FraudClassifier>> = BTreeMap::new();
        for model in models {
            let variant = model.variant();
            if by_variant.insert(variant, model).is_some() {
                return Err(FraudError::model_load(format!("duplicate {variant} model")));
            }
        }

        let zeros = vec![0.0; MODEL_FEATURE_COUNT];
        let mut ordered = Vec::with_capacity(ModelVariant::ALL.len());
        for variant in ModelVariant::ALL {
            let model = by_variant
                .remove(&variant)
                .ok_or_else(|| FraudError::model_load(format!("missing {variant} model")))?;
            if !model.is_fitted() {
                return Err(FraudError::model_load(format!("{variant} model is not fitted")));
            }
            model.verify()?;
            model
                .predict_proba(&zeros)
                .map_err(|e| FraudError::model_load(format!("{variant} model is incompatible: {e}")))?;
            ordered.push(model);
        }

        Ok(Self {
            scaler,
            models: ordered,
            run_id,
            trained_at,
        })
    }

    pub fn scaler(&self) -> &StandardScaler {
        &self.scaler
    }

    pub fn models(&self) -> impl Iterator<Item = &dyn FraudClassifier> {
        self.models.iter().map(|m| m.as_ref())
    }

    pub fn model(&self, variant: ModelVariant) -> Option<&dyn FraudClassifier> {
        self.models().find(|m| m.variant() == variant)
    }

    pub fn run_id(&self) -> ModelRunId {
        self.run_id
    }

    pub fn trained_at(&self) -> DateTime<Utc> {
        self.trained_at
    }

    /// Per-model probabilities for one derived feature vector
    pub fn model_probabilities(&self, features: &FeatureVector) -> Result<Vec<(ModelVariant, f64)>, FraudError> {
        let scaled = self.scaler.transform_row(features.as_slice())?;
        self.models
            .iter()
            .map(|m| Ok((m.variant(), m.predict_proba(&scaled)?)))
            .collect()
    }

    /// Classification report per model on a labeled set
    pub fn evaluate(&self, data: &LabeledClaims) -> Result<Vec<ClassificationReport>, FraudError> {
        let rows = self.scaler.transform(&data.feature_matrix()?)?;
        self.models
            .iter()
            .map(|m| {
                let scores = m.predict_proba_batch(&rows)?;
                ClassificationReport::from_scores(m.variant(), &scores, data.labels())
            })
            .collect()
    }
}

/// Where the shared model set currently stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    Unfitted,
    /// A load is in progress; other callers wait for it
    Fitting,
    Fitted,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LifecycleState::Unfitted => "unfitted",
            LifecycleState::Fitting => "fitting",
            LifecycleState::Fitted => "fitted",
        };
        f.write_str(s)
    }
}

#[derive(Debug)]
struct Slot {
    state: LifecycleState,
    ensemble: Option<Arc<TrainedEnsemble>>,
}

/// Weighted ensemble over lazily loaded models
pub struct EnsembleScorer {
    config: EnsembleConfig,
    repository: Arc<dyn ModelRepository>,
    slot: Mutex<Slot>,
    loaded: Condvar,
}

impl fmt::Debug for EnsembleScorer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnsembleScorer")
            .field("config", &self.config)
            .field("state", &self.state().ok())
            .finish()
    }
}

/// Resets an abandoned `Fitting` state and wakes waiters
struct FittingGuard<'a> {
    scorer: &'a EnsembleScorer,
}

impl Drop for FittingGuard<'_> {
    fn drop(&mut self) {
        let mut slot = match self.scorer.slot.lock() {
            Ok(slot) => slot,
            Err(poisoned) => poisoned.into_inner(),
        };
        if slot.state == LifecycleState::Fitting {
            slot.state = LifecycleState::Unfitted;
        }
        drop(slot);
        self.scorer.loaded.notify_all();
    }
}

impl EnsembleScorer {
    /// Creates an unfitted scorer. Invalid weights or hyperparameters fail here.
    pub fn new(config: EnsembleConfig, repository: Arc<dyn ModelRepository>) -> Result<Self, FraudError> {
        config.validate()?;
        Ok(Self {
            config,
            repository,
            slot: Mutex::new(Slot {
                state: LifecycleState::Unfitted,
                ensemble: None,
            }),
            loaded: Condvar::new(),
        })
    }

    pub fn config(&self) -> &EnsembleConfig {
        &self.config
    }

    pub fn state(&self) -> Result<LifecycleState, FraudError> {
        Ok(self.lock()?.state)
    }

    /// The current model set, if one is loaded
    pub fn current(&self) -> Result<Option<Arc<TrainedEnsemble>>, FraudError> {
        Ok(self.lock()?.ensemble.clone())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Slot>, FraudError> {
        self.slot
            .lock()
            .map_err(|_| FraudError::LockPoisoned("ensemble state".to_string()))
    }

    /// Returns the loaded model set, loading it from the repository on
    /// first use. A failed load leaves the scorer `Unfitted`.
    pub fn ensure_loaded(&self) -> Result<Arc<TrainedEnsemble>, FraudError> {
        let mut slot = self.lock()?;
        loop {
            match slot.state {
                LifecycleState::Fitted => match &slot.ensemble {
                    Some(ensemble) => return Ok(Arc::clone(ensemble)),
                    None => break,
                },
                LifecycleState::Fitting => {
                    slot = self
                        .loaded
                        .wait(slot)
                        .map_err(|_| FraudError::LockPoisoned("ensemble state".to_string()))?;
                }
                LifecycleState::Unfitted => break,
            }
        }
        slot.state = LifecycleState::Fitting;
        drop(slot);

        let _guard = FittingGuard { scorer: self };
        let started = Instant::now();
        let loaded = self.repository.load();

        let mut slot = self.lock()?;
        if let (LifecycleState::Fitted, Some(installed)) = (slot.state, &slot.ensemble) {
            // a training run installed a newer set while we were loading
            return Ok(Arc::clone(installed));
        }
        match loaded {
            Ok(ensemble) => {
                let ensemble = Arc::new(ensemble);
                slot.ensemble = Some(Arc::clone(&ensemble));
                slot.state = LifecycleState::Fitted;
                info!(
                    run_id = %ensemble.run_id(),
                    duration_ms = started.elapsed().as_millis() as u64,
                    "Ensemble models loaded"
                );
                Ok(ensemble)
            }
            Err(e) => {
                slot.state = LifecycleState::Unfitted;
                warn!(error = %e, "Ensemble model load failed");
                Err(e)
            }
        }
    }

    /// Atomically replaces the model set
    pub fn install(&self, ensemble: TrainedEnsemble) -> Arc<TrainedEnsemble> {
        let ensemble = Arc::new(ensemble);
        let mut slot = match self.slot.lock() {
            Ok(slot) => slot,
            Err(poisoned) => poisoned.into_inner(),
        };
        slot.ensemble = Some(Arc::clone(&ensemble));
        slot.state = LifecycleState::Fitted;
        drop(slot);
        self.loaded.notify_all();

        info!(run_id = %ensemble.run_id(), "Ensemble model set installed");
        ensemble
    }

    /// Scores a claim with the weighted ensemble.
    ///
    /// Fails with [`FraudError::ModelLoad`] when no model set can be loaded.
    /// There is no fallback to the heuristic scorer.
    pub fn score(&self, claim: &ModelClaim) -> Result<PredictionResult, FraudError> {
        let started = Instant::now();
        let features = FeatureVector::derive(claim)?;
        let ensemble = self.ensure_loaded()?;
        let probabilities = ensemble.model_probabilities(&features)?;

        let weighted: f64 = probabilities
            .iter()
            .map(|(variant, p)| p * self.config.weights.weight(*variant))
            .sum();
        let (min, max) = probabilities
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), (_, p)| (lo.min(*p), hi.max(*p)));
        let agreement = Probability::clamped(1.0 - (max - min));

        let model_scores = probabilities
            .iter()
            .map(|(variant, p)| (variant.artifact_name().to_string(), *p))
            .collect();

        let result = ResultBuilder::new(ScorerKind::Ensemble, self.config.policy, Probability::clamped(weighted))
            .confidence(agreement.round_dp(4))
            .model_scores(model_scores)
            .finish(started.elapsed());

        debug!(
            run_id = %ensemble.run_id(),
            probability = result.fraud_probability.value(),
            risk_level = %result.risk_level,
            "Ensemble score computed"
        );
        Ok(result)
    }
}
