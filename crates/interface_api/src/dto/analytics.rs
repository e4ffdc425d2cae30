//! Analytics DTOs

use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use domain_fraud::analytics::{format_currency, format_percent};
use domain_fraud::{FraudAnalytics, FraudStatistics};

#[derive(Debug, Serialize, Deserialize)]
pub struct AnalyticsResponse {
    pub total_claims: usize,
    pub fraud_detected: usize,
    pub avg_fraud_score: f64,
    pub high_risk_claims: usize,
    pub savings_estimate: f64,
}

impl From<FraudAnalytics> for AnalyticsResponse {
    fn from(analytics: FraudAnalytics) -> Self {
        Self {
            total_claims: analytics.total_claims,
            fraud_detected: analytics.fraud_detected,
            avg_fraud_score: analytics.avg_fraud_score.to_f64().unwrap_or_default(),
            high_risk_claims: analytics.high_risk_claims,
            savings_estimate: analytics.savings_estimate.to_f64().unwrap_or_default(),
        }
    }
}

/// Dashboard statistics, formatted for display
#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FraudStatsResponse {
    Stats {
        total_claims: usize,
        /// e.g. `"25.0%"`
        fraud_detection_rate: String,
        risk_distribution: BTreeMap<String, usize>,
        /// e.g. `"$27,800.13"`
        average_claim_amount: String,
        total_claims_value: String,
        estimated_fraud_prevented: String,
    },
    Empty {
        message: String,
    },
}

impl From<Option<FraudStatistics>> for FraudStatsResponse {
    fn from(stats: Option<FraudStatistics>) -> Self {
        match stats {
            None => FraudStatsResponse::Empty {
                message: "No claims processed yet".to_string(),
            },
            Some(stats) => FraudStatsResponse::Stats {
                total_claims: stats.total_claims,
                fraud_detection_rate: format_percent(stats.fraud_detection_rate),
                risk_distribution: stats
                    .risk_distribution
                    .iter()
                    .map(|(level, count)| (level.as_str().to_string(), *count))
                    .collect(),
                average_claim_amount: format_currency(stats.average_claim_amount),
                total_claims_value: format_currency(stats.total_claims_value),
                estimated_fraud_prevented: format_currency(stats.estimated_fraud_prevented),
            },
        }
    }
}
