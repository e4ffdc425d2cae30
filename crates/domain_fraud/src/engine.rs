//! Scoring engine facade
//!
//! The single entry point used by the HTTP layer and the training binary.

use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use crate::artifacts::ArtifactStore;
use crate::claim::{ClaimFeatures, ModelClaim};
use crate::dataset::LabeledClaims;
use crate::ensemble::{EnsembleConfig, EnsembleScorer, LifecycleState};
use crate::error::FraudError;
use crate::heuristic::HeuristicScorer;
use crate::ports::ModelRepository;
use crate::prediction::PredictionResult;
use crate::random::RandomSource;
use crate::training::{EnsembleTrainer, TrainingReport};

#[derive(Debug)]
pub struct FraudEngine {
    heuristic: HeuristicScorer,
    ensemble: EnsembleScorer,
    trainer: EnsembleTrainer,
}

impl FraudEngine {
    /// Builds the engine. Invalid weights, boundaries or hyperparameters
    /// make construction fail; no model is loaded yet.
    pub fn new(config: EnsembleConfig, repository: Arc<dyn ModelRepository>) -> Result<Self, FraudError> {
        let trainer = EnsembleTrainer::new(config.clone(), Arc::clone(&repository))?;
        let ensemble = EnsembleScorer::new(config, repository)?;
        Ok(Self {
            heuristic: HeuristicScorer::new(),
            ensemble,
            trainer,
        })
    }

    /// Engine backed by artifact files under `dir`
    pub fn with_artifact_dir(config: EnsembleConfig, dir: impl Into<PathBuf>) -> Result<Self, FraudError> {
        Self::new(config, Arc::new(ArtifactStore::new(dir)))
    }

    pub fn heuristic(&self) -> &HeuristicScorer {
        &self.heuristic
    }

    pub fn ensemble(&self) -> &EnsembleScorer {
        &self.ensemble
    }

    pub fn score_heuristic(
        &self,
        claim: &ClaimFeatures,
        rng: &mut dyn RandomSource,
    ) -> Result<PredictionResult, FraudError> {
        self.heuristic.score(claim, rng)
    }

    /// Never falls back to the heuristic; a missing model set is an error
    pub fn score_ensemble(&self, claim: &ModelClaim) -> Result<PredictionResult, FraudError> {
        self.ensemble.score(claim)
    }

    pub fn ensemble_state(&self) -> Result<LifecycleState, FraudError> {
        self.ensemble.state()
    }

    /// Loads the model set now instead of on the first ensemble request
    pub fn preload(&self) -> Result<(), FraudError> {
        self.ensemble.ensure_loaded().map(|_| ())
    }

    /// Trains, persists, and then swaps the new model set in
    pub fn train_ensemble(&self, data: &LabeledClaims) -> Result<TrainingReport, FraudError> {
        let (trained, report) = self.trainer.train_and_persist(data)?;
        self.ensemble.install(trained);
        info!(run_id = %report.run_id, "Live ensemble replaced");
        Ok(report)
    }
}
