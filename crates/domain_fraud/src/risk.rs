//! Risk bucketing
//!
//! Maps a fraud probability onto four levels. Two boundary sets exist and
//! are kept apart on purpose: each is tuned for the score distribution of
//! its own scorer.
//!
//! | Policy       | Low    | Medium      | High         | Critical |
//! |--------------|--------|-------------|--------------|----------|
//! | `HEURISTIC`  | < 0.4  | [0.4, 0.6)  | [0.6, 0.8)   | >= 0.8   |
//! | `ENSEMBLE`   | < 0.3  | [0.3, 0.6)  | [0.6, 0.85)  | >= 0.85  |

use serde::{Deserialize, Serialize};
use std::fmt;

use core_kernel::Probability;

use crate::error::FraudError;

/// Discretized fraud risk
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    pub const ALL: [RiskLevel; 4] = [
        RiskLevel::Low,
        RiskLevel::Medium,
        RiskLevel::High,
        RiskLevel::Critical,
    ];

    /// Investigation recommendation for this level
    pub fn recommendation(&self) -> &'static str {
        match self {
            RiskLevel::Low => "Standard processing",
            RiskLevel::Medium => "Monitor closely",
            RiskLevel::High => "Requires investigation",
            RiskLevel::Critical => "Immediate investigation required",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
            RiskLevel::Critical => "Critical",
        }
    }

    /// High and Critical claims count as high risk in analytics
    pub fn is_high_risk(&self) -> bool {
        matches!(self, RiskLevel::High | RiskLevel::Critical)
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RiskLevel {
    type Err = FraudError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RiskLevel::ALL
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| FraudError::validation(format!("unknown risk level: {s}")))
    }
}

/// Lower bounds of the Medium, High and Critical buckets.
///
/// Each bound is inclusive: a probability equal to `medium` is Medium.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RiskPolicy {
    name: &'static str,
    medium: f64,
    high: f64,
    critical: f64,
}

impl RiskPolicy {
    /// Boundaries used by the heuristic scorer
    pub const HEURISTIC: RiskPolicy = RiskPolicy {
        name: "heuristic",
        medium: 0.4,
        high: 0.6,
        critical: 0.8,
    };

    /// Boundaries used by the ensemble scorer
    pub const ENSEMBLE: RiskPolicy = RiskPolicy {
        name: "ensemble",
        medium: 0.3,
        high: 0.6,
        critical: 0.85,
    };

    /// Builds a custom policy.
    ///
    /// Boundaries must be finite and satisfy `0 < medium < high < critical <= 1`.
    pub fn new(name: &'static str, medium: f64, high: f64, critical: f64) -> Result<Self, FraudError> {
        let ordered = 0.0 < medium && medium < high && high < critical && critical <= 1.0;
        if !ordered || ![medium, high, critical].iter().all(|b| b.is_finite()) {
            return Err(FraudError::configuration(format!(
                "risk boundaries must satisfy 0 < medium < high < critical <= 1, \
                 got medium={medium}, high={high}, critical={critical}"
            )));
        }
        Ok(Self { name, medium, high, critical })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Lower bounds as `(medium, high, critical)`
    pub fn boundaries(&self) -> (f64, f64, f64) {
        (self.medium, self.high, self.critical)
    }

    pub fn classify(&self, probability: Probability) -> RiskLevel {
        let p = probability.value();
        if p < self.medium {
            RiskLevel::Low
        } else if p < self.high {
            RiskLevel::Medium
        } else if p < self.critical {
            RiskLevel::High
        } else {
            RiskLevel::Critical
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(value: f64) -> Probability {
        Probability::clamped(value)
    }

    #[test]
    fn test_heuristic_boundaries_are_inclusive_lower_bounds() {
        let policy = RiskPolicy::HEURISTIC;
        assert_eq!(policy.classify(p(0.3999)), RiskLevel::Low);
        assert_eq!(policy.classify(p(0.4)), RiskLevel::Medium);
        assert_eq!(policy.classify(p(0.6)), RiskLevel::High);
        assert_eq!(policy.classify(p(0.8)), RiskLevel::Critical);
        assert_eq!(policy.classify(p(1.0)), RiskLevel::Critical);
    }

    #[test]
    fn test_ensemble_boundaries() {
        let policy = RiskPolicy::ENSEMBLE;
        assert_eq!(policy.classify(p(0.2999)), RiskLevel::Low);
        assert_eq!(policy.classify(p(0.3999)), RiskLevel::Medium);
        assert_eq!(policy.classify(p(0.6)), RiskLevel::High);
        assert_eq!(policy.classify(p(0.8499)), RiskLevel::High);
        assert_eq!(policy.classify(p(0.85)), RiskLevel::Critical);
    }

    #[test]
    fn test_policies_diverge_between_0_3_and_0_4() {
        assert_eq!(RiskPolicy::ENSEMBLE.classify(p(0.35)), RiskLevel::Medium);
        assert_eq!(RiskPolicy::HEURISTIC.classify(p(0.35)), RiskLevel::Low);
    }

    #[test]
    fn test_recommendations() {
        assert_eq!(RiskLevel::Low.recommendation(), "Standard processing");
        assert_eq!(RiskLevel::Medium.recommendation(), "Monitor closely");
        assert_eq!(RiskLevel::High.recommendation(), "Requires investigation");
        assert_eq!(RiskLevel::Critical.recommendation(), "Immediate investigation required");
    }

    #[test]
    fn test_invalid_boundaries_rejected() {
        assert!(RiskPolicy::new("bad", 0.5, 0.4, 0.9).is_err());
        assert!(RiskPolicy::new("bad", 0.0, 0.4, 0.9).is_err());
        assert!(RiskPolicy::new("bad", 0.2, 0.4, 1.2).is_err());
        assert!(RiskPolicy::new("bad", 0.2, f64::NAN, 0.9).is_err());
        assert!(RiskPolicy::new("custom", 0.2, 0.5, 0.9).is_ok());
    }

    #[test]
    fn test_risk_level_parse() {
        assert_eq!("critical".parse::<RiskLevel>().unwrap(), RiskLevel::Critical);
        assert!("severe".parse::<RiskLevel>().is_err());
    }
}
