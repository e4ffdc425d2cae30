//! Standard feature scaling
//!
//! Fitted once on the training matrix and shared by every model. Features
//! with zero variance keep a unit scale so they pass through centred.

use serde::{Deserialize, Serialize};

use crate::error::FraudError;

/// Per-feature mean/standard-deviation transform
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    means: Vec<f64>,
    scales: Vec<f64>,
}

impl StandardScaler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_fitted(&self) -> bool {
        !self.means.is_empty()
    }

    pub fn n_features(&self) -> usize {
        self.means.len()
    }

    pub fn means(&self) -> &[f64] {
        &self.means
    }

    pub fn scales(&self) -> &[f64] {
        &self.scales
    }

    /// Computes population mean and standard deviation per column
    pub fn fit(&mut self, rows: &[Vec<f64>]) -> Result<(), FraudError> {
        let width = check_matrix(rows)?;
        let n = rows.len() as f64;

        let mut means = vec![0.0; width];
        for row in rows {
            for (m, x) in means.iter_mut().zip(row) {
                *m += x;
            }
        }
        means.iter_mut().for_each(|m| *m /= n);

        let mut variances = vec![0.0; width];
        for row in rows {
            for ((v, x), m) in variances.iter_mut().zip(row).zip(&means) {
                *v += (x - m).powi(2);
            }
        }

        self.scales = variances
            .into_iter()
            .map(|v| {
                let std = (v / n).sqrt();
                if std > f64::EPSILON { std } else { 1.0 }
            })
            .collect();
        self.means = means;
        Ok(())
    }

    /// Checks persisted statistics: one finite mean and one finite,
    /// positive scale per feature
    pub fn verify(&self) -> Result<(), FraudError> {
        if self.means.len() != self.scales.len() {
            return Err(FraudError::model_load(format!(
                "scaler has {} means but {} scales",
                self.means.len(),
                self.scales.len()
            )));
        }
        if self.means.iter().any(|m| !m.is_finite()) || self.scales.iter().any(|s| !(s.is_finite() && *s > 0.0)) {
            return Err(FraudError::model_load("scaler holds a non-finite mean or non-positive scale"));
        }
        Ok(())
    }

    pub fn transform_row(&self, row: &[f64]) -> Result<Vec<f64>, FraudError> {
        if !self.is_fitted() {
            return Err(FraudError::NotFitted("scaler".to_string()));
        }
        if row.len() != self.means.len() {
            return Err(FraudError::validation(format!(
                "scaler expects {} features, got {}",
                self.means.len(),
                row.len()
            )));
        }
        Ok(row
            .iter()
            .zip(self.means.iter().zip(&self.scales))
            .map(|(x, (m, s))| (x - m) / s)
            .collect())
    }

    pub fn transform(&self, rows: &[Vec<f64>]) -> Result<Vec<Vec<f64>>, FraudError> {
        rows.iter().map(|row| self.transform_row(row)).collect()
    }

    pub fn fit_transform(&mut self, rows: &[Vec<f64>]) -> Result<Vec<Vec<f64>>, FraudError> {
        self.fit(rows)?;
        self.transform(rows)
    }
}

/// Checks a matrix is non-empty and rectangular, returning its width
pub(crate) fn check_matrix(rows: &[Vec<f64>]) -> Result<usize, FraudError> {
    let width = rows
        .first()
        .map(Vec::len)
        .ok_or_else(|| FraudError::training("feature matrix is empty"))?;
    if width == 0 {
        return Err(FraudError::training("feature matrix has no columns"));
    }
    if let Some(i) = rows.iter().position(|r| r.len() != width) {
        return Err(FraudError::training(format!(
            "row {i} has {} features, expected {width}",
            rows[i].len()
        )));
    }
    if rows.iter().flatten().any(|x| !x.is_finite()) {
        return Err(FraudError::training("feature matrix contains non-finite values"));
    }
    Ok(width)
}
