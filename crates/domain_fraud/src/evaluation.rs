//! Discrimination metrics and cross-validation

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::FraudError;
use crate::models::{ModelParams, ModelVariant};

/// Probability at or above which a claim is predicted fraudulent
pub const DECISION_THRESHOLD: f64 = 0.5;

/// Area under the ROC curve via the rank-sum statistic.
///
/// Tied scores receive their average rank.
pub fn roc_auc(scores: &[f64], labels: &[bool]) -> Result<f64, FraudError> {
    if scores.len() != labels.len() {
        return Err(FraudError::training(format!(
            "{} scores but {} labels",
            scores.len(),
            labels.len()
        )));
    }
    let positives = labels.iter().filter(|&&y| y).count();
    let negatives = labels.len() - positives;
    if positives == 0 || negatives == 0 {
        return Err(FraudError::training("ROC AUC needs both classes"));
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[a].total_cmp(&scores[b]));

    let mut positive_rank_sum = 0.0;
    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && scores[order[end]] == scores[order[start]] {
            end += 1;
        }
        // ranks are 1-based; the tie group shares the mean of start+1..=end
        let rank = (start + 1 + end) as f64 / 2.0;
        let tied_positives = order[start..end].iter().filter(|&&i| labels[i]).count();
        positive_rank_sum += rank * tied_positives as f64;
        start = end;
    }

    let p = positives as f64;
    let n = negatives as f64;
    Ok((positive_rank_sum - p * (p + 1.0) / 2.0) / (p * n))
}

/// Splits row indices into `k` test folds with the class ratio preserved
pub fn stratified_folds(labels: &[bool], k: usize, seed: u64) -> Result<Vec<Vec<usize>>, FraudError> {
    if k < 2 {
        return Err(FraudError::configuration(format!("cross-validation needs at least 2 folds, got {k}")));
    }
    let mut positives: Vec<usize> = (0..labels.len()).filter(|&i| labels[i]).collect();
    let mut negatives: Vec<usize> = (0..labels.len()).filter(|&i| !labels[i]).collect();
    if positives.len() < k || negatives.len() < k {
        return Err(FraudError::training(format!(
            "{k} folds need at least {k} rows of each class, got {} fraudulent and {} legitimate",
            positives.len(),
            negatives.len()
        )));
    }

    let mut rng = StdRng::seed_from_u64(seed);
    positives.shuffle(&mut rng);
    negatives.shuffle(&mut rng);

    let mut folds = vec![Vec::new(); k];
    for (i, idx) in positives.into_iter().chain(negatives).enumerate() {
        folds[i % k].push(idx);
    }
    for fold in &mut folds {
        fold.sort_unstable();
    }
    Ok(folds)
}

/// ROC AUC per fold for one model family
pub fn cross_validate(
    params: &ModelParams,
    variant: ModelVariant,
    rows: &[Vec<f64>],
    labels: &[bool],
    k: usize,
    seed: u64,
) -> Result<Vec<f64>, FraudError> {
    let folds = stratified_folds(labels, k, seed)?;
    let mut in_test = vec![false; rows.len()];

    folds
        .iter()
        .map(|test| {
            in_test.iter_mut().for_each(|t| *t = false);
            test.iter().for_each(|&i| in_test[i] = true);

            let (train_rows, train_labels): (Vec<Vec<f64>>, Vec<bool>) = (0..rows.len())
                .filter(|&i| !in_test[i])
                .map(|i| (rows[i].clone(), labels[i]))
                .unzip();

            let mut model = params.build(variant);
            model.fit(&train_rows, &train_labels)?;

            let test_rows: Vec<Vec<f64>> = test.iter().map(|&i| rows[i].clone()).collect();
            let test_labels: Vec<bool> = test.iter().map(|&i| labels[i]).collect();
            let scores = model.predict_proba_batch(&test_rows)?;
            roc_auc(&scores, &test_labels)
        })
        .collect()
}

/// Precision, recall and F1 for one class
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

impl ClassMetrics {
    fn from_counts(true_pos: usize, false_pos: usize, false_neg: usize) -> Self {
        let ratio = |num: usize, den: usize| if den == 0 { 0.0 } else { num as f64 / den as f64 };
        let precision = ratio(true_pos, true_pos + false_pos);
        let recall = ratio(true_pos, true_pos + false_neg);
        let f1 = if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };
        Self {
            precision,
            recall,
            f1,
            support: true_pos + false_neg,
        }
    }
}

/// Classification quality of one model on a labeled set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReport {
    pub variant: ModelVariant,
    pub threshold: f64,
    pub legitimate: ClassMetrics,
    pub fraud: ClassMetrics,
    pub accuracy: f64,
    pub roc_auc: f64,
}

impl ClassificationReport {
    pub fn from_scores(variant: ModelVariant, scores: &[f64], labels: &[bool]) -> Result<Self, FraudError> {
        let roc_auc = roc_auc(scores, labels)?;

        let (mut tp, mut fp, mut tn, mut fn_) = (0, 0, 0, 0);
        for (&score, &label) in scores.iter().zip(labels) {
            match (score >= DECISION_THRESHOLD, label) {
                (true, true) => tp += 1,
                (true, false) => fp += 1,
                (false, false) => tn += 1,
                (false, true) => fn_ += 1,
            }
        }

        Ok(Self {
            variant,
            threshold: DECISION_THRESHOLD,
            legitimate: ClassMetrics::from_counts(tn, fn_, fp),
            fraud: ClassMetrics::from_counts(tp, fp, fn_),
            accuracy: (tp + tn) as f64 / labels.len() as f64,
            roc_auc,
        })
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== {} ===", self.variant.artifact_name().to_uppercase())?;
        writeln!(f, "{:>12} {:>10} {:>10} {:>10} {:>10}", "", "precision", "recall", "f1-score", "support")?;
        for (name, m) in [("legitimate", &self.legitimate), ("fraud", &self.fraud)] {
            writeln!(
                f,
                "{:>12} {:>10.2} {:>10.2} {:>10.2} {:>10}",
                name, m.precision, m.recall, m.f1, m.support
            )?;
        }
        writeln!(f, "{:>12} {:>10.2}", "accuracy", self.accuracy)?;
        write!(f, "AUC: {:.4}", self.roc_auc)
    }
}
