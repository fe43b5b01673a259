//! Collaborator traits and in-process implementations.
//!
//! The coordinator and token ring only see these traits. The `node` crate
//! implements them over HTTP; the implementations here run everything in
//! one process for tests.

pub mod inventory;
pub mod payment;
pub mod queue;
pub mod ring;

pub use inventory::{InventoryGateway, LocalInventoryGateway};
pub use payment::{InMemoryPaymentGateway, PaymentGateway};
pub use queue::{InMemoryOrderQueue, OrderQueue};
pub use ring::{LocalRing, RingTransport};
