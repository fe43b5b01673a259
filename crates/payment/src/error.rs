use thiserror::Error;

/// Errors raised while configuring the payment participant.
#[derive(Debug, Error, PartialEq)]
pub enum PaymentError {
    /// Vote bias outside `[0, 1]`.
    #[error("Commit probability must be within [0, 1], got {0}")]
    InvalidProbability(f64),
}
