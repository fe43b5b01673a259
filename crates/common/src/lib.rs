//! Shared types for the order-processing services.
//!
//! Everything that crosses a service boundary lives here: replica identity,
//! the book and order model, and one request/response struct per call.

pub mod book;
pub mod messages;
pub mod order;
pub mod types;

pub use book::Book;
pub use messages::{
    AckResponse, DequeueRequest, DequeueResponse, ExecutePaymentRequest, GetBookRequest,
    HealthCheckResponse, PassTokenRequest, RingStatusResponse, UpdateBookRequest,
    VoteRequest, VoteResponse,
};
pub use order::{Order, OrderItem, User};
pub use types::{ReplicaId, TransactionId};
