//! Gradient-boosted trees with logistic loss
//!
//! Each round fits one regression tree to the first and second order
//! gradients of the log loss at the current margins. Leaf weights are Newton
//! steps `-G / (H + lambda)` shrunk by the learning rate. The probability is
//! the sigmoid of the summed margin.

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::tree::{Criterion, DecisionTree, GrowthLimits, TreeGrower};
use super::{check_row, check_training_set, verify_trees, sigmoid, FraudClassifier, ModelVariant};
use crate::error::FraudError;

/// Hessians below this are lifted to keep leaf weights finite
const MIN_HESSIAN: f64 = 1e-16;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoostingParams {
    pub n_rounds: usize,
    pub learning_rate: f64,
    pub max_depth: usize,
    /// L2 regularization on leaf weights
    pub lambda: f64,
    /// Minimum hessian sum per child
    pub min_child_weight: f64,
    /// Initial margin shared by all rows (0.0 is probability 0.5)
    pub base_margin: f64,
    pub seed: u64,
}

impl Default for BoostingParams {
    fn default() -> Self {
        Self {
            n_rounds: 100,
            learning_rate: 0.3,
            max_depth: 6,
            lambda: 1.0,
            min_child_weight: 1.0,
            base_margin: 0.0,
            seed: 42,
        }
    }
}

impl BoostingParams {
    pub fn validate(&self) -> Result<(), FraudError> {
        if self.n_rounds == 0 || self.max_depth == 0 {
            return Err(FraudError::configuration(
                "boosting needs at least one round and a positive max_depth",
            ));
        }
        if !(self.learning_rate > 0.0 && self.learning_rate <= 1.0) {
            return Err(FraudError::configuration(format!(
                "learning_rate must be within (0, 1], got {}",
                self.learning_rate
            )));
        }
        if !(self.lambda >= 0.0) || !(self.min_child_weight >= 0.0) || !self.base_margin.is_finite() {
            return Err(FraudError::configuration(
                "lambda and min_child_weight must be non-negative, base_margin finite",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientBoostedTrees {
    params: BoostingParams,
    n_features: usize,
    trees: Vec<DecisionTree>,
}

impl GradientBoostedTrees {
    pub fn new(params: BoostingParams) -> Self {
        Self {
            params,
            n_features: 0,
            trees: Vec::new(),
        }
    }

    pub fn rounds(&self) -> usize {
        self.trees.len()
    }

    fn margin(&self, row: &[f64]) -> f64 {
        self.params.base_margin + self.trees.iter().map(|t| t.predict(row)).sum::<f64>()
    }
}

impl FraudClassifier for GradientBoostedTrees {
    fn variant(&self) -> ModelVariant {
        ModelVariant::GradientBoosting
    }

    fn fit(&mut self, rows: &[Vec<f64>], labels: &[bool]) -> Result<(), FraudError> {
        self.params.validate()?;
        let width = check_training_set(rows, labels)?;
        let params = &self.params;

        let criterion = Criterion::Newton {
            lambda: params.lambda,
            min_child_weight: params.min_child_weight,
        };
        let limits = GrowthLimits {
            max_depth: Some(params.max_depth),
            min_samples_split: 2,
            max_features: width,
        };
        let targets_y: Vec<f64> = labels.iter().map(|&y| if y { 1.0 } else { 0.0 }).collect();
        let mut margins = vec![params.base_margin; rows.len()];
        let mut trees = Vec::with_capacity(params.n_rounds);
        let mut rng = StdRng::seed_from_u64(params.seed);

        for _ in 0..params.n_rounds {
            let targets: Vec<(f64, f64)> = margins
                .iter()
                .zip(&targets_y)
                .map(|(&m, &y)| {
                    let p = sigmoid(m);
                    ((p * (1.0 - p)).max(MIN_HESSIAN), p - y)
                })
                .collect();

            let mut tree = TreeGrower::new(rows, &targets, criterion, limits, &mut rng)
                .grow((0..rows.len()).collect());
            tree.scale_leaves(params.learning_rate);

            for (m, row) in margins.iter_mut().zip(rows) {
                *m += tree.predict(row);
            }
            trees.push(tree);
        }

        let log_loss = margins
            .iter()
            .zip(&targets_y)
            .map(|(&m, &y)| {
                let p = sigmoid(m).clamp(1e-15, 1.0 - 1e-15);
                -(y * p.ln() + (1.0 - y) * (1.0 - p).ln())
            })
            .sum::<f64>()
            / rows.len() as f64;
        debug!(rounds = trees.len(), train_log_loss = log_loss, "Gradient boosting fitted");

        self.trees = trees;
        self.n_features = width;
        Ok(())
    }

    fn predict_proba(&self, row: &[f64]) -> Result<f64, FraudError> {
        check_row("xgboost", self.n_features, row)?;
        Ok(sigmoid(self.margin(row)).clamp(0.0, 1.0))
    }

    fn is_fitted(&self) -> bool {
        self.n_features > 0 && !self.trees.is_empty()
    }

    fn verify(&self) -> Result<(), FraudError> {
        verify_trees("xgboost", &self.trees, self.n_features)
    }

    fn to_payload(&self) -> Result<serde_json::Value, FraudError> {
        Ok(serde_json::to_value(self)?)
    }
}
