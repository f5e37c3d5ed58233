//! Rental listing marketplace. Renters and landlords pay a role-based
//! subscription before they can list homes or apply for them.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
