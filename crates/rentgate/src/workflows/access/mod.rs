//! Access gate: bearer authentication, then subscription freshness, then role
//! membership. Each step short-circuits on failure.

pub mod gate;
pub mod guards;

pub use gate::{bearer_token, AccessGate};
pub use guards::{require_active_subscription, require_role, AccessError, AccessPolicy};
