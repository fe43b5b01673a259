//! Chain-replicated book inventory.
//!
//! Replicas `1..=N` form a static chain. Writes enter at the head and are
//! forwarded replica by replica to the tail (`Head2Tail`); the tail applies
//! the write and an acknowledgment walks back to the head (`Tail2Head`),
//! applying the same value at every replica on the way. Reads are served by
//! the tail so they never observe a write that has not reached it.

pub mod chain;
pub mod error;
pub mod store;
pub mod transport;

pub use chain::{ChainPosition, ChainReplica};
pub use error::{InventoryError, Result};
pub use store::BookStore;
pub use transport::{ChainTransport, LocalChainNetwork};
