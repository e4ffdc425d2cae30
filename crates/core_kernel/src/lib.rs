//! Core Kernel - Foundational types shared by the fraud scoring crates
//!
//! This crate provides the building blocks used across the workspace:
//! - Strongly typed identifiers for claims and training runs
//! - The `Probability` value object, always within `[0, 1]`
//! - The kernel error type

pub mod identifiers;
pub mod probability;
pub mod error;

pub use identifiers::{ClaimId, ModelRunId, RequestId};
pub use probability::Probability;
pub use error::CoreError;
