use thiserror::Error;

use crate::domain::types::SystemId;

/// Errors surfaced by the planner core. Construction failures are fatal;
/// `NoRouteFound` is swallowed by the engines, which skip the offending
/// subset and keep enumerating.
#[derive(Debug, Error)]
pub enum SweepError {
    #[error("invalid graph: {reason}")]
    InvalidGraph { reason: String },

    #[error("invalid inventory: {reason}")]
    InvalidInventory { reason: String },

    #[error("no round trip within the segment radius for systems {required:?}")]
    NoRouteFound { required: Vec<SystemId> },
}
