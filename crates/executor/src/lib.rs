//! Order executor replica.
//!
//! Each executor replica runs two cooperating pieces:
//! 1. A [`TokenRing`] member that owns the right to dequeue. Only the token
//!    holder may take an order from the queue, and it forwards the token as
//!    soon as it has one, skipping peers that fail a health check.
//! 2. A [`TransactionCoordinator`] that runs two-phase commit for each
//!    dequeued order across the payment participant and the inventory chain.

pub mod coordinator;
pub mod error;
pub mod fault;
pub mod services;
pub mod state;
pub mod token_ring;
pub mod transaction;

pub use coordinator::{OrderProcessor, TransactionCoordinator};
pub use error::{ExecutorError, Result};
pub use fault::FaultInjection;
pub use services::{
    InMemoryOrderQueue, InMemoryPaymentGateway, InventoryGateway, LocalInventoryGateway,
    LocalRing, OrderQueue, PaymentGateway, RingTransport,
};
pub use state::ReplicaState;
pub use token_ring::{RingConfig, TickOutcome, TokenRing};
pub use transaction::{
    GlobalDecision, ItemOutcome, ItemStatus, OrderOutcome, TransactionContext, Vote,
};
