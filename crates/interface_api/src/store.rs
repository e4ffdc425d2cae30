//! In-memory scored-claim store
//!
//! Records live for the lifetime of the process. Claim numbers are assigned
//! sequentially from 1 in insertion order.

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::debug;

use domain_fraud::{ClaimRecordPort, FraudError, NewScoredClaim, ScoredClaim};

#[derive(Debug, Default)]
pub struct InMemoryClaimStore {
    records: RwLock<Vec<ScoredClaim>>,
}

impl InMemoryClaimStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ClaimRecordPort for InMemoryClaimStore {
    async fn insert(&self, claim: NewScoredClaim) -> Result<ScoredClaim, FraudError> {
        let mut records = self.records.write().await;
        let number = records.len() as u64 + 1;
        let record = ScoredClaim::from_new(claim, number, Utc::now());
        records.push(record.clone());
        debug!(claim_id = %record.id, claim_number = number, "Scored claim stored");
        Ok(record)
    }

    async fn list(&self) -> Result<Vec<ScoredClaim>, FraudError> {
        Ok(self.records.read().await.clone())
    }

    async fn count(&self) -> Result<usize, FraudError> {
        Ok(self.records.read().await.len())
    }
}
