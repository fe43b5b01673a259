//! Payment participant gateway.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use payment::PaymentParticipant;
use tokio::sync::Mutex;

use crate::error::{ExecutorError, Result};

/// The coordinator's view of the payment participant.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// `SendVoteToCoordinator`: true is a commit vote.
    async fn request_vote(&self) -> Result<bool>;

    /// `ExecutePayment(commitStatus)`: true if the payment was executed.
    async fn execute_payment(&self, commit_status: bool) -> Result<bool>;
}

#[derive(Debug, Default)]
struct InMemoryPaymentState {
    executions: Vec<bool>,
    votes_requested: usize,
}

/// In-process payment gateway around a [`PaymentParticipant`].
///
/// Records every execution request and can simulate a crashed participant.
#[derive(Debug, Clone)]
pub struct InMemoryPaymentGateway {
    participant: PaymentParticipant,
    state: Arc<Mutex<InMemoryPaymentState>>,
    unreachable: Arc<AtomicBool>,
}

impl InMemoryPaymentGateway {
    pub fn new(participant: PaymentParticipant) -> Self {
        Self {
            participant,
            state: Arc::default(),
            unreachable: Arc::default(),
        }
    }

    /// Makes every subsequent call fail as unreachable.
    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::SeqCst);
    }

    /// The `commitStatus` of every `ExecutePayment` received, in order.
    pub async fn executions(&self) -> Vec<bool> {
        self.state.lock().await.executions.clone()
    }

    pub async fn votes_requested(&self) -> usize {
        self.state.lock().await.votes_requested
    }

    fn check_reachable(&self) -> Result<()> {
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(ExecutorError::unreachable("payment", "connection refused"));
        }
        Ok(())
    }
}

#[async_trait]
impl PaymentGateway for InMemoryPaymentGateway {
    async fn request_vote(&self) -> Result<bool> {
        self.check_reachable()?;
        self.state.lock().await.votes_requested += 1;
        Ok(self.participant.vote().success)
    }

    async fn execute_payment(&self, commit_status: bool) -> Result<bool> {
        self.check_reachable()?;
        self.state.lock().await.executions.push(commit_status);
        Ok(self.participant.execute(commit_status).success)
    }
}
