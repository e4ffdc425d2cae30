//! Random forest classifier

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::tree::{Criterion, DecisionTree, GrowthLimits, TreeGrower};
use super::{check_row, check_training_set, verify_trees, FraudClassifier, ModelVariant};
use crate::error::FraudError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestParams {
    pub n_estimators: usize,
    /// `None` grows until leaves are pure
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    /// Candidate features per split; `None` uses `sqrt(n_features)`
    pub max_features: Option<usize>,
    pub bootstrap: bool,
    pub seed: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_depth: None,
            min_samples_split: 2,
            max_features: None,
            bootstrap: true,
            seed: 42,
        }
    }
}

impl ForestParams {
    pub fn validate(&self) -> Result<(), FraudError> {
        if self.n_estimators == 0 {
            return Err(FraudError::configuration("random forest needs at least one tree"));
        }
        if self.min_samples_split < 2 {
            return Err(FraudError::configuration("min_samples_split must be at least 2"));
        }
        if self.max_features == Some(0) || self.max_depth == Some(0) {
            return Err(FraudError::configuration("max_features and max_depth must be positive"));
        }
        Ok(())
    }
}

/// Bagged Gini trees; the probability is the mean leaf fraud rate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    params: ForestParams,
    n_features: usize,
    trees: Vec<DecisionTree>,
}

impl RandomForest {
    pub fn new(params: ForestParams) -> Self {
        Self {
            params,
            n_features: 0,
            trees: Vec::new(),
        }
    }

    pub fn trees(&self) -> &[DecisionTree] {
        &self.trees
    }
}

impl FraudClassifier for RandomForest {
    fn variant(&self) -> ModelVariant {
        ModelVariant::RandomForest
    }

    fn fit(&mut self, rows: &[Vec<f64>], labels: &[bool]) -> Result<(), FraudError> {
        self.params.validate()?;
        let width = check_training_set(rows, labels)?;
        let n = rows.len();

        let targets: Vec<(f64, f64)> = labels
            .iter()
            .map(|&y| (1.0, if y { 1.0 } else { 0.0 }))
            .collect();
        let limits = GrowthLimits {
            max_depth: self.params.max_depth,
            min_samples_split: self.params.min_samples_split,
            max_features: self
                .params
                .max_features
                .unwrap_or_else(|| ((width as f64).sqrt() as usize).max(1)),
        };

        let mut seeder = StdRng::seed_from_u64(self.params.seed);
        let seeds: Vec<u64> = (0..self.params.n_estimators).map(|_| seeder.gen()).collect();
        let bootstrap = self.params.bootstrap;

        self.trees = seeds
            .into_par_iter()
            .map(|seed| {
                let mut rng = StdRng::seed_from_u64(seed);
                let indices: Vec<usize> = if bootstrap {
                    (0..n).map(|_| rng.gen_range(0..n)).collect()
                } else {
                    (0..n).collect()
                };
                TreeGrower::new(rows, &targets, Criterion::Gini, limits, rng).grow(indices)
            })
            .collect();
        self.n_features = width;

        debug!(
            trees = self.trees.len(),
            mean_depth = self.trees.iter().map(DecisionTree::depth).sum::<usize>() as f64
                / self.trees.len() as f64,
            "Random forest fitted"
        );
        Ok(())
    }

    fn predict_proba(&self, row: &[f64]) -> Result<f64, FraudError> {
        check_row("random_forest", self.n_features, row)?;
        let total: f64 = self.trees.iter().map(|t| t.predict(row)).sum();
        Ok((total / self.trees.len() as f64).clamp(0.0, 1.0))
    }

    fn is_fitted(&self) -> bool {
        self.n_features > 0 && !self.trees.is_empty()
    }

    fn verify(&self) -> Result<(), FraudError> {
        verify_trees("random_forest", &self.trees, self.n_features)
    }

    fn to_payload(&self) -> Result<serde_json::Value, FraudError> {
        Ok(serde_json::to_value(self)?)
    }
}
