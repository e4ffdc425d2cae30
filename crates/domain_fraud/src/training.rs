//! Offline ensemble training
//!
//! Training derives features, fits the shared scaler once, then for each
//! model family runs stratified k-fold cross-validation before fitting on the
//! full scaled matrix. It never touches a live scorer; the caller decides
//! whether to install the result.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, instrument};

use core_kernel::ModelRunId;

use crate::dataset::LabeledClaims;
use crate::ensemble::{EnsembleConfig, EnsembleWeights, TrainedEnsemble};
use crate::error::FraudError;
use crate::evaluation::cross_validate;
use crate::features::MODEL_FEATURE_NAMES;
use crate::models::ModelVariant;
use crate::ports::ModelRepository;
use crate::scaler::StandardScaler;

/// Cross-validated discrimination of one model family
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelReport {
    pub variant: ModelVariant,
    pub cv_auc_mean: f64,
    pub cv_auc_std: f64,
    pub cv_auc_folds: Vec<f64>,
    pub fit_duration_ms: u64,
}

/// Summary of one training run, persisted next to the artifacts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingReport {
    pub run_id: ModelRunId,
    pub trained_at: DateTime<Utc>,
    pub samples: usize,
    pub positives: usize,
    pub fraud_rate: f64,
    pub folds: usize,
    pub feature_names: Vec<String>,
    pub weights: EnsembleWeights,
    pub models: Vec<ModelReport>,
}

impl TrainingReport {
    pub fn model(&self, variant: ModelVariant) -> Option<&ModelReport> {
        self.models.iter().find(|m| m.variant == variant)
    }
}

/// Fits the scaler and all three models on a labeled dataset
pub fn train_ensemble(
    data: &LabeledClaims,
    config: &EnsembleConfig,
) -> Result<(TrainedEnsemble, TrainingReport), FraudError> {
    config.validate()?;
    data.ensure_trainable()?;

    let run_id = ModelRunId::new();
    let mut scaler = StandardScaler::new();
    let rows = scaler.fit_transform(&data.feature_matrix()?)?;
    let labels = data.labels();

    let mut models = Vec::with_capacity(ModelVariant::ALL.len());
    let mut reports = Vec::with_capacity(ModelVariant::ALL.len());
    for variant in ModelVariant::ALL {
        let started = Instant::now();
        let folds = cross_validate(&config.models, variant, &rows, labels, config.cv_folds, config.cv_seed)?;
        let mean = folds.iter().sum::<f64>() / folds.len() as f64;
        let std = (folds.iter().map(|a| (a - mean).powi(2)).sum::<f64>() / folds.len() as f64).sqrt();

        let mut model = config.models.build(variant);
        model.fit(&rows, labels)?;
        let fit_duration_ms = started.elapsed().as_millis() as u64;

        info!(
            %run_id,
            model = %variant,
            cv_auc = %format!("{mean:.4}"),
            cv_auc_std = %format!("{std:.4}"),
            duration_ms = fit_duration_ms,
            "Model trained"
        );

        models.push(model);
        reports.push(ModelReport {
            variant,
            cv_auc_mean: mean,
            cv_auc_std: std,
            cv_auc_folds: folds,
            fit_duration_ms,
        });
    }

    let trained_at = Utc::now();
    let ensemble = TrainedEnsemble::new(scaler, models, run_id, trained_at)?;
    let report = TrainingReport {
        run_id,
        trained_at,
        samples: data.len(),
        positives: data.positives(),
        fraud_rate: data.fraud_rate(),
        folds: config.cv_folds,
        feature_names: MODEL_FEATURE_NAMES.iter().map(|n| n.to_string()).collect(),
        weights: config.weights,
        models: reports,
    };
    Ok((ensemble, report))
}

/// Trains and persists through a [`ModelRepository`]
pub struct EnsembleTrainer {
    config: EnsembleConfig,
    repository: Arc<dyn ModelRepository>,
}

impl fmt::Debug for EnsembleTrainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnsembleTrainer").field("config", &self.config).finish()
    }
}

impl EnsembleTrainer {
    pub fn new(config: EnsembleConfig, repository: Arc<dyn ModelRepository>) -> Result<Self, FraudError> {
        config.validate()?;
        Ok(Self { config, repository })
    }

    pub fn config(&self) -> &EnsembleConfig {
        &self.config
    }

    /// Trains, then writes every artifact and the report.
    ///
    /// Nothing is written if training fails.
    #[instrument(skip_all, fields(samples = data.len()))]
    pub fn train_and_persist(&self, data: &LabeledClaims) -> Result<(TrainedEnsemble, TrainingReport), FraudError> {
        let started = Instant::now();
        info!(fraud_rate = %format!("{:.2}%", data.fraud_rate() * 100.0), "Training ensemble");

        let (ensemble, report) = train_ensemble(data, &self.config)?;
        self.repository.save(&ensemble, &report)?;

        info!(
            run_id = %report.run_id,
            duration_ms = started.elapsed().as_millis() as u64,
            "Ensemble trained and persisted"
        );
        Ok((ensemble, report))
    }
}
