//! Test Utilities Crate
//!
//! Provides shared test infrastructure, fixtures, and helpers for the
//! fraud scoring test suite.
//!
//! # Modules
//!
//! - `fixtures`: Pre-built claims, datasets and configurations
//! - `builders`: Builder patterns for claim construction
//! - `repositories`: Counting model repositories and trained artifact sets
//! - `assertions`: Custom assertion helpers for prediction results
//! - `generators`: Property-based test data generators

pub mod fixtures;
pub mod builders;
pub mod repositories;
pub mod assertions;
pub mod generators;

pub use fixtures::*;
pub use builders::*;
pub use repositories::*;
pub use assertions::*;
pub use generators::*;
