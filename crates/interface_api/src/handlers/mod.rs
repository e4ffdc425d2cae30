//! Request handlers

pub mod analytics;
pub mod claims;
pub mod health;
pub mod predict;
