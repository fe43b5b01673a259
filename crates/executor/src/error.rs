//! Executor error types.

use inventory::InventoryError;
use thiserror::Error;

/// Errors that can occur while talking to collaborators of the executor.
#[derive(Debug, Error)]
pub enum ExecutorError {
    /// A peer or collaborator could not be reached.
    #[error("{peer} unreachable: {reason}")]
    Unreachable { peer: String, reason: String },

    /// A peer answered with something other than the expected response.
    #[error("{peer} returned an unexpected response: {reason}")]
    UnexpectedResponse { peer: String, reason: String },

    /// The book requested by an order line is not in the inventory.
    #[error("Book not found: {0}")]
    BookNotFound(String),

    /// Error raised by an in-process inventory replica.
    #[error("Inventory error: {0}")]
    Inventory(#[from] InventoryError),
}

impl ExecutorError {
    /// Builds an [`ExecutorError::Unreachable`].
    pub fn unreachable(peer: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        ExecutorError::Unreachable {
            peer: peer.into(),
            reason: reason.to_string(),
        }
    }

    /// Returns true for connectivity failures.
    pub fn is_connectivity(&self) -> bool {
        matches!(
            self,
            ExecutorError::Unreachable { .. }
                | ExecutorError::Inventory(InventoryError::PeerUnreachable { .. })
        )
    }
}

/// Convenience type alias for executor results.
pub type Result<T> = std::result::Result<T, ExecutorError>;
