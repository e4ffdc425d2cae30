//! Fraud classifiers
//!
//! Three model families sit behind the [`FraudClassifier`] capability. Each
//! is fitted independently on scaled feature rows and reports the
//! probability of the positive (fraud) class.

pub mod tree;
pub mod forest;
pub mod boosting;
pub mod neural;

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::FraudError;

pub use boosting::{BoostingParams, GradientBoostedTrees};
pub use forest::{ForestParams, RandomForest};
pub use neural::{NeuralNet, NeuralParams};
pub use tree::{DecisionTree, TreeDefect};

/// A trainable binary classifier
pub trait FraudClassifier: fmt::Debug + Send + Sync {
    /// Which model family this is
    fn variant(&self) -> ModelVariant;

    /// Fits on scaled rows. `labels[i]` is true for fraudulent rows.
    fn fit(&mut self, rows: &[Vec<f64>], labels: &[bool]) -> Result<(), FraudError>;

    /// Probability that one scaled row is fraudulent
    fn predict_proba(&self, row: &[f64]) -> Result<f64, FraudError>;

    fn is_fitted(&self) -> bool;

    /// Checks fitted parameters are structurally sound, failing with
    /// `ModelLoad` when a persisted payload could not be evaluated safely
    fn verify(&self) -> Result<(), FraudError>;

    /// Serializes fitted parameters for persistence
    fn to_payload(&self) -> Result<serde_json::Value, FraudError>;

    fn predict_proba_batch(&self, rows: &[Vec<f64>]) -> Result<Vec<f64>, FraudError> {
        rows.iter().map(|row| self.predict_proba(row)).collect()
    }
}

/// The three model families of the ensemble
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelVariant {
    RandomForest,
    /// Gradient-boosted trees, persisted under the `xgboost` name
    #[serde(rename = "xgboost")]
    GradientBoosting,
    NeuralNet,
}

impl ModelVariant {
    pub const ALL: [ModelVariant; 3] = [
        ModelVariant::RandomForest,
        ModelVariant::GradientBoosting,
        ModelVariant::NeuralNet,
    ];

    /// Fixed logical name, also the artifact file stem
    pub fn artifact_name(&self) -> &'static str {
        match self {
            ModelVariant::RandomForest => "random_forest",
            ModelVariant::GradientBoosting => "xgboost",
            ModelVariant::NeuralNet => "neural_net",
        }
    }

    pub fn from_artifact_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|v| v.artifact_name() == name)
    }

    /// Restores a fitted classifier from its persisted payload
    pub fn load_payload(&self, payload: serde_json::Value) -> Result<Box<dyn FraudClassifier>, FraudError> {
        let model: Box<dyn FraudClassifier> = match self {
            ModelVariant::RandomForest => Box::new(serde_json::from_value::<RandomForest>(payload)?),
            ModelVariant::GradientBoosting => {
                Box::new(serde_json::from_value::<GradientBoostedTrees>(payload)?)
            }
            ModelVariant::NeuralNet => Box::new(serde_json::from_value::<NeuralNet>(payload)?),
        };
        if !model.is_fitted() {
            return Err(FraudError::model_load(format!(
                "{} payload holds an unfitted model",
                self.artifact_name()
            )));
        }
        model.verify()?;
        Ok(model)
    }
}

impl fmt::Display for ModelVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.artifact_name())
    }
}

/// Hyperparameters of all three families
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ModelParams {
    pub random_forest: ForestParams,
    pub boosting: BoostingParams,
    pub neural_net: NeuralParams,
}

impl ModelParams {
    pub fn validate(&self) -> Result<(), FraudError> {
        self.random_forest.validate()?;
        self.boosting.validate()?;
        self.neural_net.validate()
    }

    /// Creates an unfitted classifier of the given family
    pub fn build(&self, variant: ModelVariant) -> Box<dyn FraudClassifier> {
        match variant {
            ModelVariant::RandomForest => Box::new(RandomForest::new(self.random_forest.clone())),
            ModelVariant::GradientBoosting => {
                Box::new(GradientBoostedTrees::new(self.boosting.clone()))
            }
            ModelVariant::NeuralNet => Box::new(NeuralNet::new(self.neural_net.clone())),
        }
    }
}

/// Shared input checks for `fit`
pub(crate) fn check_training_set(rows: &[Vec<f64>], labels: &[bool]) -> Result<usize, FraudError> {
    let width = crate::scaler::check_matrix(rows)?;
    if rows.len() != labels.len() {
        return Err(FraudError::training(format!(
            "{} rows but {} labels",
            rows.len(),
            labels.len()
        )));
    }
    Ok(width)
}

/// Shared input checks for `predict_proba`
pub(crate) fn check_row(model: &str, expected: usize, row: &[f64]) -> Result<(), FraudError> {
    if expected == 0 {
        return Err(FraudError::NotFitted(model.to_string()));
    }
    if row.len() != expected {
        return Err(FraudError::validation(format!(
            "{model} expects {expected} features, got {}",
            row.len()
        )));
    }
    Ok(())
}

/// Verifies every tree of a tree-based model
pub(crate) fn verify_trees(model: &str, trees: &[DecisionTree], n_features: usize) -> Result<(), FraudError> {
    for (i, tree) in trees.iter().enumerate() {
        tree.verify(n_features)
            .map_err(|defect| FraudError::model_load(format!("{model} tree {i} {defect}")))?;
    }
    Ok(())
}

pub(crate) fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}
