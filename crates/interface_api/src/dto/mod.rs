//! Request and response bodies

pub mod analytics;
pub mod claims;
pub mod prediction;
pub mod status;
