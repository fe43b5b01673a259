use common::{AckResponse, VoteResponse};
use rand::Rng;

use crate::error::PaymentError;

/// Probability of a commit vote when none is configured.
pub const DEFAULT_COMMIT_PROBABILITY: f64 = 0.95;

/// Stateless two-phase commit participant for the payment leg.
#[derive(Debug, Clone, Copy)]
pub struct PaymentParticipant {
    commit_probability: f64,
}

impl PaymentParticipant {
    /// Creates a participant that votes commit with `commit_probability`.
    pub fn new(commit_probability: f64) -> Result<Self, PaymentError> {
        if !(0.0..=1.0).contains(&commit_probability) {
            return Err(PaymentError::InvalidProbability(commit_probability));
        }
        Ok(Self { commit_probability })
    }

    /// A participant that never aborts.
    pub fn always_commit() -> Self {
        Self {
            commit_probability: 1.0,
        }
    }

    /// A participant that always votes abort.
    pub fn always_abort() -> Self {
        Self {
            commit_probability: 0.0,
        }
    }

    pub fn commit_probability(&self) -> f64 {
        self.commit_probability
    }

    /// `SendVoteToCoordinator`: draws a commit/abort vote.
    pub fn vote(&self) -> VoteResponse {
        let commit = rand::rng().random_bool(self.commit_probability);
        let label = if commit { "commit" } else { "abort" };
        metrics::counter!("payment_votes_total", "vote" => label).increment(1);
        tracing::info!(vote = label, "vote request received");
        VoteResponse { success: commit }
    }

    /// `ExecutePayment`: succeeds iff the global decision was commit.
    pub fn execute(&self, commit_status: bool) -> AckResponse {
        if commit_status {
            tracing::info!("global commit received, payment executed");
            AckResponse::ok()
        } else {
            tracing::info!("global abort received, payment aborted");
            AckResponse::failed()
        }
    }
}

impl Default for PaymentParticipant {
    fn default() -> Self {
        Self {
            commit_probability: DEFAULT_COMMIT_PROBABILITY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_out_of_range_probability() {
        assert_eq!(
            PaymentParticipant::new(1.5).unwrap_err(),
            PaymentError::InvalidProbability(1.5)
        );
        assert!(PaymentParticipant::new(-0.1).is_err());
        assert!(PaymentParticipant::new(f64::NAN).is_err());
    }

    #[test]
    fn test_default_bias() {
        assert_eq!(
            PaymentParticipant::default().commit_probability(),
            DEFAULT_COMMIT_PROBABILITY
        );
    }

    #[test]
    fn test_extreme_biases_are_deterministic() {
        let commit = PaymentParticipant::always_commit();
        let abort = PaymentParticipant::always_abort();
        for _ in 0..100 {
            assert!(commit.vote().success);
            assert!(!abort.vote().success);
        }
    }

    #[test]
    fn test_biased_votes_mostly_commit() {
        let participant = PaymentParticipant::new(0.95).unwrap();
        let commits = (0..2000).filter(|_| participant.vote().success).count();
        // Expected 1900; far outside any plausible sampling noise below 1700.
        assert!(commits > 1700, "only {commits} commits out of 2000");
    }

    #[test]
    fn test_execute_follows_decision() {
        let participant = PaymentParticipant::default();
        assert!(participant.execute(true).success);
        assert!(!participant.execute(false).success);
    }
}
