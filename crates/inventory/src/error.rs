//! Inventory error types.

use common::ReplicaId;
use thiserror::Error;

/// Errors that can occur in the replicated inventory.
#[derive(Debug, Error)]
pub enum InventoryError {
    /// The requested book does not exist at the serving replica.
    #[error("Book not found: {0}")]
    BookNotFound(String),

    /// A chain neighbour could not be reached; the write stalls at this link.
    #[error("Replica {replica} unreachable: {reason}")]
    PeerUnreachable { replica: ReplicaId, reason: String },

    /// A peer answered but the answer could not be used.
    #[error("Replica {replica} returned an invalid response: {reason}")]
    InvalidResponse { replica: ReplicaId, reason: String },

    /// The initial catalog could not be read.
    #[error("Catalog error: {0}")]
    Catalog(#[from] std::io::Error),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for inventory operations.
pub type Result<T> = std::result::Result<T, InventoryError>;
