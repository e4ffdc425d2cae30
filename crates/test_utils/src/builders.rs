//! Test Data Builders
//!
//! Builder patterns for claims. Tests set only the fields they care about and
//! take fixture defaults for everything else.

use domain_fraud::{ClaimFeatures, ModelClaim};

use crate::fixtures::{ClaimFixtures, ModelClaimFixtures};

/// Builder for heuristic-schema claims, starting from the low-risk fixture
pub struct ClaimFeaturesBuilder {
    claim: ClaimFeatures,
}

impl Default for ClaimFeaturesBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ClaimFeaturesBuilder {
    pub fn new() -> Self {
        Self {
            claim: ClaimFixtures::low_risk_claim(),
        }
    }

    pub fn with_amount(mut self, amount: f64) -> Self {
        self.claim.claim_amount = amount;
        self
    }

    pub fn with_claim_type(mut self, claim_type: impl Into<String>) -> Self {
        self.claim.claim_type = claim_type.into();
        self
    }

    pub fn with_age(mut self, age: i32) -> Self {
        self.claim.customer_age = age;
        self
    }

    pub fn with_tenure(mut self, years: i32) -> Self {
        self.claim.policy_tenure = years;
        self
    }

    pub fn with_witnesses(mut self, count: u32) -> Self {
        self.claim.witness_count = count;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.claim.claim_description = description.into();
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.claim.location = location.into();
        self
    }

    pub fn build(self) -> ClaimFeatures {
        self.claim
    }
}

/// Builder for ensemble-schema claims, starting from the daytime fixture
pub struct ModelClaimBuilder {
    claim: ModelClaim,
}

impl Default for ModelClaimBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelClaimBuilder {
    pub fn new() -> Self {
        Self {
            claim: ModelClaimFixtures::daytime_claim(),
        }
    }

    pub fn with_amount(mut self, amount: f64) -> Self {
        self.claim.claim_amount = amount;
        self
    }

    pub fn with_claim_type(mut self, code: u8) -> Self {
        self.claim.claim_type = code;
        self
    }

    pub fn with_history(mut self, prior_claims: u32) -> Self {
        self.claim.customer_history = prior_claims;
        self
    }

    pub fn with_hour(mut self, hour: u8) -> Self {
        self.claim.claim_hour = hour;
        self
    }

    pub fn with_region(mut self, region: u8) -> Self {
        self.claim.risk_region = region;
        self
    }

    pub fn with_policy_age(mut self, months: u32) -> Self {
        self.claim.policy_age_months = months;
        self
    }

    pub fn with_documentation(mut self, supplied: bool) -> Self {
        self.claim.documentation_flag = supplied;
        self
    }

    pub fn build(self) -> ModelClaim {
        self.claim
    }
}
