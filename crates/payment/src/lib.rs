//! Simulated payment participant.
//!
//! No money moves. The participant votes with a configurable commit bias to
//! stand in for an unpredictable payment gateway, and reports execution
//! success only when the coordinator's global decision was commit.

pub mod error;
pub mod participant;

pub use error::PaymentError;
pub use participant::{DEFAULT_COMMIT_PROBABILITY, PaymentParticipant};
