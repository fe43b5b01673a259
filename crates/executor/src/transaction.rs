//! Per-order two-phase commit state.
//!
//! Every dequeued order gets its own [`TransactionContext`]; nothing about a
//! vote or decision outlives the transaction that produced it.

use chrono::{DateTime, Utc};
use common::{Order, ReplicaId, TransactionId};

/// A participant's phase-1 answer as seen by the coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vote {
    Commit,
    Abort,
    /// The participant could not be reached. Counts as an abort.
    Unreachable,
}

impl Vote {
    pub fn from_response(commit: bool) -> Self {
        if commit { Vote::Commit } else { Vote::Abort }
    }

    pub fn is_commit(&self) -> bool {
        matches!(self, Vote::Commit)
    }
}

/// The coordinator's phase-2 decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlobalDecision {
    Commit,
    Abort,
}

impl GlobalDecision {
    /// Commit iff every vote is commit.
    pub fn from_votes(votes: &[Vote]) -> Self {
        if votes.iter().all(Vote::is_commit) {
            GlobalDecision::Commit
        } else {
            GlobalDecision::Abort
        }
    }

    /// The `commitStatus` flag carried by phase-2 calls.
    pub fn is_commit(&self) -> bool {
        matches!(self, GlobalDecision::Commit)
    }
}

impl std::fmt::Display for GlobalDecision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GlobalDecision::Commit => f.write_str("GLOBAL COMMIT"),
            GlobalDecision::Abort => f.write_str("GLOBAL ABORT"),
        }
    }
}

/// What happened to one order line during phase 2.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemStatus {
    /// Stock was deducted and the update replicated down the chain.
    Applied { remaining: u32 },
    /// Fewer copies were available than requested; no update was sent.
    InsufficientStock { available: u32, requested: u32 },
    /// The inventory refused the update (abort decision).
    Rejected,
    /// The inventory could not be reached or the book is unknown.
    Failed(String),
}

/// Phase-2 result for one order line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemOutcome {
    pub book_id: String,
    pub quantity: u32,
    pub status: ItemStatus,
}

impl ItemOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self.status, ItemStatus::Applied { .. })
    }
}

/// Scratch state of one two-phase commit run.
#[derive(Debug)]
pub struct TransactionContext {
    pub id: TransactionId,
    pub replica: ReplicaId,
    pub order: Order,
    pub payment_vote: Option<Vote>,
    pub inventory_vote: Option<Vote>,
    pub decision: Option<GlobalDecision>,
    /// Set when the commit decision has been announced to the customer.
    /// Phase 2 may still fail afterwards.
    pub confirmed: bool,
    pub started_at: DateTime<Utc>,
}

impl TransactionContext {
    pub fn new(replica: ReplicaId, order: Order) -> Self {
        Self {
            id: TransactionId::new(),
            replica,
            order,
            payment_vote: None,
            inventory_vote: None,
            decision: None,
            confirmed: false,
            started_at: Utc::now(),
        }
    }

    /// Records both votes and computes the decision once.
    pub fn decide(&mut self, payment: Vote, inventory: Vote) -> GlobalDecision {
        self.payment_vote = Some(payment);
        self.inventory_vote = Some(inventory);
        let decision = GlobalDecision::from_votes(&[payment, inventory]);
        self.decision = Some(decision);
        decision
    }

    /// Closes the transaction with its phase-2 results.
    pub fn finish(self, payment_executed: bool, items: Vec<ItemOutcome>) -> OrderOutcome {
        let decision = self.decision.unwrap_or(GlobalDecision::Abort);
        let success = payment_executed && items.iter().all(ItemOutcome::is_success);
        OrderOutcome {
            transaction_id: self.id,
            order_id: self.order.order_id,
            replica: self.replica,
            payment_vote: self.payment_vote.unwrap_or(Vote::Unreachable),
            inventory_vote: self.inventory_vote.unwrap_or(Vote::Unreachable),
            decision,
            confirmed: self.confirmed,
            payment_executed,
            items,
            success,
            started_at: self.started_at,
            finished_at: Utc::now(),
        }
    }
}

/// Final, aggregated result of executing one order.
#[derive(Debug, Clone)]
pub struct OrderOutcome {
    pub transaction_id: TransactionId,
    pub order_id: String,
    pub replica: ReplicaId,
    pub payment_vote: Vote,
    pub inventory_vote: Vote,
    pub decision: GlobalDecision,
    pub confirmed: bool,
    pub payment_executed: bool,
    pub items: Vec<ItemOutcome>,
    /// True only if payment and every item succeeded.
    pub success: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl OrderOutcome {
    /// Confirmed to the customer but failed during phase 2.
    pub fn failed_after_confirmation(&self) -> bool {
        self.confirmed && !self.success
    }

    pub fn failed_items(&self) -> impl Iterator<Item = &ItemOutcome> {
        self.items.iter().filter(|item| !item.is_success())
    }

    pub fn duration(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}
