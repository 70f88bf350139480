//! Common error types shared across crates

use thiserror::Error;

/// Errors surfaced by node-side collaborators (liquidity, pair catalog)
#[derive(Debug, Error)]
pub enum CollaboratorError {
    /// The backing service could not be reached
    #[error("Collaborator unavailable: {0}")]
    Unavailable(String),

    /// The backing service answered with something unusable
    #[error("Invalid collaborator response: {0}")]
    InvalidResponse(String),
}
