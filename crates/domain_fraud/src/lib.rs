//! Fraud Scoring Domain
//!
//! This crate assigns a fraud-risk score to an insurance claim. Two scorers
//! live side by side and both produce a [`PredictionResult`]:
//!
//! - **Heuristic scorer**: a stateless rule accumulator over raw claim
//!   fields. Needs no trained state and is always available.
//! - **Ensemble scorer**: three independently trained classifiers (random
//!   forest, gradient-boosted trees, neural network) combined by fixed
//!   weights after feature derivation and standard scaling.
//!
//! # Scoring flow
//!
//! ```text
//! ClaimFeatures ──────────────────────────────► HeuristicScorer ──┐
//!                                                                  ├─► RiskPolicy ─► PredictionResult
//! ModelClaim ─► FeatureDeriver ─► Scaler ─► Classifiers ─► Ensemble ┘
//! ```
//!
//! # Ensemble lifecycle
//!
//! ```text
//! Unfitted -> Fitting -> Fitted
//!     ^          |
//!     +-- load --+ (failure)
//! ```

pub mod error;
pub mod claim;
pub mod features;
pub mod random;
pub mod risk;
pub mod prediction;
pub mod heuristic;
pub mod scaler;
pub mod models;
pub mod dataset;
pub mod evaluation;
pub mod ensemble;
pub mod training;
pub mod artifacts;
pub mod ports;
pub mod analytics;
pub mod engine;

pub use error::FraudError;
pub use claim::{ClaimFeatures, ModelClaim};
pub use features::{FeatureVector, HeuristicFeatures, MODEL_FEATURE_NAMES};
pub use random::{FixedRandom, RandomSource, RngSource};
pub use risk::{RiskLevel, RiskPolicy};
pub use prediction::{PredictionResult, ScorerKind};
pub use heuristic::HeuristicScorer;
pub use scaler::StandardScaler;
pub use evaluation::{roc_auc, ClassificationReport};
pub use models::{FraudClassifier, ModelParams, ModelVariant};
pub use dataset::{generate_synthetic_claims, LabeledClaims};
pub use ensemble::{EnsembleConfig, EnsembleScorer, EnsembleWeights, LifecycleState, TrainedEnsemble};
pub use training::{train_ensemble, EnsembleTrainer, ModelReport, TrainingReport};
pub use artifacts::ArtifactStore;
pub use ports::{ClaimRecordPort, ModelRepository};
pub use analytics::{AnalyticsPolicy, FraudAnalytics, FraudStatistics, NewScoredClaim, ScoredClaim};
pub use engine::FraudEngine;
