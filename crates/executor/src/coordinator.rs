//! Two-phase commit coordinator for dequeued orders.

use std::time::Instant;

use async_trait::async_trait;
use common::{Order, OrderItem, ReplicaId};
use futures_util::future::join_all;

use crate::error::{ExecutorError, Result};
use crate::fault::FaultInjection;
use crate::services::inventory::InventoryGateway;
use crate::services::payment::PaymentGateway;
use crate::transaction::{
    GlobalDecision, ItemOutcome, ItemStatus, OrderOutcome, TransactionContext, Vote,
};

/// Something that can run a dequeued order to completion.
///
/// The token ring hands orders to this trait so it does not depend on the
/// concrete gateways the coordinator is built with.
#[async_trait]
pub trait OrderProcessor: Send + Sync {
    async fn process(&self, order: Order) -> OrderOutcome;
}

/// Runs two-phase commit for one order at a time across the payment
/// participant and the inventory chain.
///
/// Phase 1 asks both participants for a vote concurrently and waits for
/// both. The global decision is commit iff both voted commit. Phase 2 sends
/// the decision to the payment participant and, concurrently, executes every
/// order line against the inventory; the order succeeds only if all of
/// those succeed.
pub struct TransactionCoordinator<P, I>
where
    P: PaymentGateway,
    I: InventoryGateway,
{
    replica: ReplicaId,
    payment: P,
    inventory: I,
    faults: FaultInjection,
}

impl<P, I> TransactionCoordinator<P, I>
where
    P: PaymentGateway,
    I: InventoryGateway,
{
    /// Creates a coordinator for the executor replica `replica`.
    pub fn new(replica: ReplicaId, payment: P, inventory: I) -> Self {
        Self {
            replica,
            payment,
            inventory,
            faults: FaultInjection::none(),
        }
    }

    /// Adds artificial execution delays.
    pub fn with_faults(mut self, faults: FaultInjection) -> Self {
        self.faults = faults;
        self
    }

    pub fn payment(&self) -> &P {
        &self.payment
    }

    pub fn inventory(&self) -> &I {
        &self.inventory
    }

    /// Executes one order through both phases and returns the aggregated
    /// outcome. Never retries; a failed order is reported, not requeued.
    #[tracing::instrument(skip(self, order), fields(replica = %self.replica, order_id = %order.order_id))]
    pub async fn execute_order(&self, order: Order) -> OrderOutcome {
        metrics::counter!("orders_processed_total").increment(1);
        metrics::gauge!("active_orders").increment(1.0);
        let started = Instant::now();

        let mut ctx = TransactionContext::new(self.replica, order);
        tracing::info!(
            transaction_id = %ctx.id,
            priority = ctx.order.priority,
            items = ctx.order.items.len(),
            copies = ctx.order.total_quantity(),
            "order execution started"
        );

        let decision = self.collect_votes(&mut ctx).await;

        // The customer is told the order is confirmed as soon as the
        // decision is commit, before phase 2 has produced a result.
        if decision.is_commit() {
            ctx.confirmed = true;
            tracing::info!(transaction_id = %ctx.id, "order confirmed");
        }

        let commit_status = decision.is_commit();
        let (payment_executed, items) = tokio::join!(
            self.execute_payment(commit_status),
            join_all(
                ctx.order
                    .items
                    .iter()
                    .map(|item| self.execute_item(item, commit_status))
            ),
        );

        if !self.faults.execution_delay.is_zero() {
            tracing::debug!(delay = ?self.faults.execution_delay, "simulating processing time");
            tokio::time::sleep(self.faults.execution_delay).await;
        }

        let outcome = ctx.finish(payment_executed, items);
        self.report(&outcome, started);
        outcome
    }

    async fn collect_votes(&self, ctx: &mut TransactionContext) -> GlobalDecision {
        tracing::info!(transaction_id = %ctx.id, "phase 1: requesting votes");
        let (payment, inventory) =
            tokio::join!(self.payment.request_vote(), self.inventory.request_vote());

        let payment = vote_from(payment, "payment");
        let inventory = vote_from(inventory, "inventory");
        let decision = ctx.decide(payment, inventory);

        if !payment.is_commit() {
            tracing::info!(vote = ?payment, "payment participant did not vote commit");
        }
        if !inventory.is_commit() {
            tracing::info!(vote = ?inventory, "inventory participant did not vote commit");
        }
        tracing::info!(transaction_id = %ctx.id, %decision, "phase 2: decision reached");
        decision
    }

    async fn execute_payment(&self, commit_status: bool) -> bool {
        match self.payment.execute_payment(commit_status).await {
            Ok(executed) => {
                if executed {
                    tracing::info!("payment execution succeeded");
                }
                executed
            }
            Err(e) => {
                tracing::warn!(error = %e, "payment execution failed");
                false
            }
        }
    }

    /// Deducts one order line from the inventory: read the committed value
    /// at the tail, check stock, then write the decremented record.
    async fn execute_item(&self, item: &OrderItem, commit_status: bool) -> ItemOutcome {
        let book_id = item.book.id.clone();
        let delay = self.faults.item_delay(&book_id);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let status = match self.deduct(item, commit_status).await {
            Ok(status) => status,
            Err(e) => {
                tracing::warn!(%book_id, error = %e, "inventory execution failed");
                ItemStatus::Failed(e.to_string())
            }
        };

        ItemOutcome {
            book_id,
            quantity: item.quantity,
            status,
        }
    }

    async fn deduct(&self, item: &OrderItem, commit_status: bool) -> Result<ItemStatus> {
        let current = self
            .inventory
            .get_book(&item.book.id, commit_status)
            .await?;

        let Some(updated) = current.deduct(item.quantity) else {
            tracing::warn!(
                book_id = %current.id,
                available = current.copies_available,
                requested = item.quantity,
                "insufficient stock"
            );
            return Ok(ItemStatus::InsufficientStock {
                available: current.copies_available,
                requested: item.quantity,
            });
        };

        let remaining = updated.copies_available;
        if self.inventory.update_book(updated, commit_status).await? {
            Ok(ItemStatus::Applied { remaining })
        } else {
            Ok(ItemStatus::Rejected)
        }
    }

    fn report(&self, outcome: &OrderOutcome, started: Instant) {
        metrics::histogram!("order_duration_seconds").record(started.elapsed().as_secs_f64());
        metrics::gauge!("active_orders").decrement(1.0);

        if outcome.success {
            tracing::info!(
                transaction_id = %outcome.transaction_id,
                order_id = %outcome.order_id,
                duration_ms = outcome.duration().num_milliseconds(),
                "order executed successfully"
            );
            return;
        }

        metrics::counter!("orders_failed_total").increment(1);
        let failed: Vec<&str> = outcome
            .failed_items()
            .map(|item| item.book_id.as_str())
            .collect();
        if outcome.failed_after_confirmation() {
            tracing::warn!(
                transaction_id = %outcome.transaction_id,
                order_id = %outcome.order_id,
                payment_executed = outcome.payment_executed,
                ?failed,
                "order failed after it was confirmed"
            );
        } else {
            tracing::warn!(
                transaction_id = %outcome.transaction_id,
                order_id = %outcome.order_id,
                decision = %outcome.decision,
                "order aborted"
            );
        }
    }
}

#[async_trait]
impl<P, I> OrderProcessor for TransactionCoordinator<P, I>
where
    P: PaymentGateway,
    I: InventoryGateway,
{
    async fn process(&self, order: Order) -> OrderOutcome {
        self.execute_order(order).await
    }
}

fn vote_from(result: std::result::Result<bool, ExecutorError>, participant: &str) -> Vote {
    match result {
        Ok(commit) => Vote::from_response(commit),
        Err(e) => {
            tracing::warn!(participant, error = %e, "no vote received, counting as abort");
            Vote::Unreachable
        }
    }
}
