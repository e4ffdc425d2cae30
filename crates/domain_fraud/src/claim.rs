//! Claim input schemas
//!
//! The two scorers consume different schemas. [`ClaimFeatures`] is what a
//! claims adjuster submits and what the heuristic scorer reads. [`ModelClaim`]
//! is the schema the ensemble models were trained on; it carries the claim
//! hour and prior-claim count the heuristic never sees.

use serde::{Deserialize, Serialize};

use crate::error::FraudError;

/// Number of claim type codes known to the trained models
pub const CLAIM_TYPE_CODES: u8 = 5;

/// Number of risk regions known to the trained models
pub const RISK_REGIONS: u8 = 3;

/// Largest claim amount accepted, in dollars
pub const MAX_CLAIM_AMOUNT: f64 = 1_000_000_000_000.0;

/// Raw claim attributes submitted for heuristic scoring
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimFeatures {
    /// Claimed amount in dollars, in `(0, MAX_CLAIM_AMOUNT]`
    pub claim_amount: f64,
    /// Free-form claim category, e.g. "Auto Accident"
    pub claim_type: String,
    /// Customer age in years
    pub customer_age: i32,
    /// Years with the insurer
    pub policy_tenure: i32,
    /// Number of witnesses to the loss
    pub witness_count: u32,
    /// Adjuster's description of the loss
    pub claim_description: String,
    /// Where the loss happened
    pub location: String,
}

impl ClaimFeatures {
    /// Checks every field the heuristic relies on
    pub fn validate(&self) -> Result<(), FraudError> {
        validate_amount(self.claim_amount)?;
        if self.claim_type.trim().is_empty() {
            return Err(FraudError::validation("claim_type must not be empty"));
        }
        if self.customer_age < 0 {
            return Err(FraudError::validation(format!(
                "customer_age must be non-negative, got {}",
                self.customer_age
            )));
        }
        if self.policy_tenure < 0 {
            return Err(FraudError::validation(format!(
                "policy_tenure must be non-negative, got {}",
                self.policy_tenure
            )));
        }
        Ok(())
    }
}

/// Claim attributes in the schema the ensemble models were trained on
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelClaim {
    /// Claimed amount in dollars, strictly positive
    pub claim_amount: f64,
    /// Categorical claim type code in `0..5`
    pub claim_type: u8,
    /// Number of prior claims by the same customer
    pub customer_history: u32,
    /// Hour of day the claim was filed, `0..24`
    pub claim_hour: u8,
    /// Categorical risk region code in `0..3`
    pub risk_region: u8,
    /// Policy age in months
    pub policy_age_months: u32,
    /// Whether supporting documentation was supplied
    pub documentation_flag: bool,
}

impl ModelClaim {
    pub fn validate(&self) -> Result<(), FraudError> {
        validate_amount(self.claim_amount)?;
        if self.claim_type >= CLAIM_TYPE_CODES {
            return Err(FraudError::validation(format!(
                "claim_type code must be below {CLAIM_TYPE_CODES}, got {}",
                self.claim_type
            )));
        }
        if self.claim_hour >= 24 {
            return Err(FraudError::validation(format!(
                "claim_hour must be within 0..24, got {}",
                self.claim_hour
            )));
        }
        if self.risk_region >= RISK_REGIONS {
            return Err(FraudError::validation(format!(
                "risk_region code must be below {RISK_REGIONS}, got {}",
                self.risk_region
            )));
        }
        Ok(())
    }
}

fn validate_amount(amount: f64) -> Result<(), FraudError> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(FraudError::validation(format!(
            "claim_amount must be a positive number, got {amount}"
        )));
    }
    if amount > MAX_CLAIM_AMOUNT {
        return Err(FraudError::validation(format!(
            "claim_amount must not exceed {MAX_CLAIM_AMOUNT}, got {amount}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claim() -> ClaimFeatures {
        ClaimFeatures {
            claim_amount: 75_000.0,
            claim_type: "Auto Accident".to_string(),
            customer_age: 25,
            policy_tenure: 2,
            witness_count: 0,
            claim_description: "Total loss in parking lot".to_string(),
            location: "Remote area".to_string(),
        }
    }

    #[test]
    fn test_valid_claim_passes() {
        assert!(claim().validate().is_ok());
    }

    #[test]
    fn test_negative_amount_rejected() {
        let mut c = claim();
        c.claim_amount = -10.0;
        assert!(matches!(c.validate(), Err(FraudError::Validation(_))));
        c.claim_amount = f64::NAN;
        assert!(matches!(c.validate(), Err(FraudError::Validation(_))));
    }

    #[test]
    fn test_amount_above_ceiling_rejected() {
        let mut c = claim();
        c.claim_amount = MAX_CLAIM_AMOUNT;
        assert!(c.validate().is_ok());
        c.claim_amount = 5e28;
        assert!(matches!(c.validate(), Err(FraudError::Validation(_))));
    }

    #[test]
    fn test_negative_age_rejected() {
        let mut c = claim();
        c.customer_age = -1;
        assert!(c.validate().is_err());
    }

    #[test]
    fn test_model_claim_hour_range() {
        let mut c = ModelClaim {
            claim_amount: 1200.0,
            claim_type: 2,
            customer_history: 1,
            claim_hour: 23,
            risk_region: 1,
            policy_age_months: 36,
            documentation_flag: true,
        };
        assert!(c.validate().is_ok());
        c.claim_hour = 24;
        assert!(c.validate().is_err());
    }
}
