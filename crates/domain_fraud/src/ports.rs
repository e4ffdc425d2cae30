//! Ports to storage collaborators
//!
//! The engine never touches the filesystem or a database directly. Model
//! artifacts go through [`ModelRepository`]; scored claim records kept by the
//! HTTP surface go through [`ClaimRecordPort`].

use async_trait::async_trait;

use crate::analytics::{NewScoredClaim, ScoredClaim};
use crate::ensemble::TrainedEnsemble;
use crate::error::FraudError;
use crate::training::TrainingReport;

/// Durable store for the fitted model set.
///
/// Loading is synchronous: it runs at most once per process lifetime, behind
/// the ensemble's load guard.
pub trait ModelRepository: Send + Sync {
    /// Loads the scaler and every model. Absent or corrupt artifacts yield
    /// [`FraudError::ModelLoad`].
    fn load(&self) -> Result<TrainedEnsemble, FraudError>;

    /// Persists the scaler, every model and the training report
    fn save(&self, ensemble: &TrainedEnsemble, report: &TrainingReport) -> Result<(), FraudError>;
}

/// Storage for claims that have been scored
#[async_trait]
pub trait ClaimRecordPort: Send + Sync {
    /// Stores a record, assigning its id and sequential claim number
    async fn insert(&self, claim: NewScoredClaim) -> Result<ScoredClaim, FraudError>;

    /// All records in insertion order
    async fn list(&self) -> Result<Vec<ScoredClaim>, FraudError>;

    async fn count(&self) -> Result<usize, FraudError>;
}
