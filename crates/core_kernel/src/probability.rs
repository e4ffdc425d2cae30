//! Probability value object
//!
//! Scores produced by the engine pass through intermediate arithmetic that
//! can leave the unit interval (rule accumulation, jitter, weighted sums).
//! `Probability` is the type that crosses crate boundaries, and it can only
//! hold a finite value in `[0, 1]`.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::CoreError;

/// A probability in the closed interval `[0, 1]`
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Probability(f64);

impl Probability {
    pub const ZERO: Probability = Probability(0.0);
    pub const ONE: Probability = Probability(1.0);

    /// Creates a probability, rejecting values outside `[0, 1]` or NaN
    pub fn new(value: f64) -> Result<Self, CoreError> {
        if value.is_finite() && (0.0..=1.0).contains(&value) {
            Ok(Self(value))
        } else {
            Err(CoreError::validation(format!(
                "probability must be within [0, 1], got {value}"
            )))
        }
    }

    /// Clamps any value into `[0, 1]`. NaN maps to zero.
    pub fn clamped(value: f64) -> Self {
        if value.is_nan() {
            Self::ZERO
        } else {
            Self(value.clamp(0.0, 1.0))
        }
    }

    /// Returns the raw value
    pub fn value(&self) -> f64 {
        self.0
    }

    /// Rounds to the given number of decimal places
    pub fn round_dp(&self, places: u32) -> Self {
        let factor = 10f64.powi(places as i32);
        Self::clamped((self.0 * factor).round() / factor)
    }
}

impl Default for Probability {
    fn default() -> Self {
        Self::ZERO
    }
}

impl fmt::Display for Probability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}", self.0)
    }
}

impl TryFrom<f64> for Probability {
    type Error = CoreError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Probability> for f64 {
    fn from(p: Probability) -> f64 {
        p.0
    }
}
