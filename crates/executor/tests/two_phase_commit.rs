//! Integration tests for order execution: two-phase commit against the
//! replicated inventory, driven through the token ring.

use std::sync::Arc;

use common::{Book, Order, OrderItem, ReplicaId};
use executor::{
    GlobalDecision, InMemoryOrderQueue, InMemoryPaymentGateway, ItemStatus, LocalInventoryGateway,
    LocalRing, RingConfig, TickOutcome, TokenRing, TransactionCoordinator, Vote,
};
use inventory::{BookStore, ChainReplica, LocalChainNetwork};
use payment::PaymentParticipant;

type TestCoordinator = TransactionCoordinator<InMemoryPaymentGateway, LocalInventoryGateway>;

struct TestHarness {
    coordinator: TestCoordinator,
    payment: InMemoryPaymentGateway,
    inventory: LocalInventoryGateway,
    chain: Vec<Arc<ChainReplica>>,
    network: Arc<LocalChainNetwork>,
}

impl TestHarness {
    async fn new(participant: PaymentParticipant) -> Self {
        let network = LocalChainNetwork::new();
        let chain = network.spawn_chain(3, catalog).await;

        let payment = InMemoryPaymentGateway::new(participant);
        let inventory = LocalInventoryGateway::new(chain[0].clone());
        let coordinator =
            TransactionCoordinator::new(ReplicaId::FIRST, payment.clone(), inventory.clone());

        Self {
            coordinator,
            payment,
            inventory,
            chain,
            network,
        }
    }

    /// Copies available at every replica, head first.
    async fn stock(&self, book_id: &str) -> Vec<u32> {
        let mut stock = Vec::new();
        for replica in &self.chain {
            let book = replica.store().get(book_id).await.unwrap();
            stock.push(book.copies_available);
        }
        stock
    }
}

fn catalog() -> BookStore {
    BookStore::with_books(vec![
        Book::new("B1", "Dune", 5),
        Book::new("B2", "Emma", 3),
        Book::new("B3", "Ulysses", 8),
    ])
}

fn order(order_id: &str, items: &[(&str, u32)]) -> Order {
    Order::new(
        order_id,
        items
            .iter()
            .map(|(id, quantity)| OrderItem::new(Book::new(*id, "", 0), *quantity))
            .collect(),
    )
}

#[tokio::test]
async fn test_committed_order_replicates_to_every_replica() {
    let h = TestHarness::new(PaymentParticipant::always_commit()).await;

    let outcome = h
        .coordinator
        .execute_order(order("ORD-1", &[("B1", 2), ("B2", 3)]))
        .await;

    assert!(outcome.success);
    assert_eq!(outcome.payment_vote, Vote::Commit);
    assert_eq!(outcome.inventory_vote, Vote::Commit);
    assert_eq!(outcome.decision, GlobalDecision::Commit);
    assert_eq!(h.stock("B1").await, vec![3, 3, 3]);
    assert_eq!(h.stock("B2").await, vec![0, 0, 0]);
    assert_eq!(h.payment.executions().await, vec![true]);
}

#[tokio::test]
async fn test_insufficient_stock_fails_order_but_payment_still_runs() {
    let h = TestHarness::new(PaymentParticipant::always_commit()).await;

    let outcome = h.coordinator.execute_order(order("ORD-1", &[("B1", 10)])).await;

    assert!(!outcome.success);
    assert_eq!(outcome.decision, GlobalDecision::Commit);
    assert!(outcome.payment_executed);
    assert!(outcome.failed_after_confirmation());
    assert_eq!(
        outcome.items[0].status,
        ItemStatus::InsufficientStock {
            available: 5,
            requested: 10
        }
    );
    assert_eq!(h.payment.executions().await, vec![true]);
    assert_eq!(h.stock("B1").await, vec![5, 5, 5]);
}

#[tokio::test]
async fn test_one_short_item_fails_order_while_others_apply() {
    let h = TestHarness::new(PaymentParticipant::always_commit()).await;

    let outcome = h
        .coordinator
        .execute_order(order("ORD-1", &[("B1", 1), ("B2", 4)]))
        .await;

    assert!(!outcome.success);
    let failed: Vec<&str> = outcome.failed_items().map(|i| i.book_id.as_str()).collect();
    assert_eq!(failed, vec!["B2"]);
    // Phase 2 has no rollback: the line that fit was applied.
    assert_eq!(h.stock("B1").await, vec![4, 4, 4]);
    assert_eq!(h.stock("B2").await, vec![3, 3, 3]);
}

#[tokio::test]
async fn test_payment_abort_vote_aborts_globally() {
    let h = TestHarness::new(PaymentParticipant::always_abort()).await;

    let outcome = h.coordinator.execute_order(order("ORD-1", &[("B1", 2)])).await;

    assert!(!outcome.success);
    assert!(!outcome.confirmed);
    assert_eq!(outcome.payment_vote, Vote::Abort);
    assert_eq!(outcome.inventory_vote, Vote::Commit);
    assert_eq!(outcome.decision, GlobalDecision::Abort);
    assert!(!outcome.payment_executed);
    assert_eq!(outcome.items[0].status, ItemStatus::Rejected);
    assert_eq!(h.payment.executions().await, vec![false]);
    assert_eq!(h.stock("B1").await, vec![5, 5, 5]);
}

#[tokio::test]
async fn test_unreachable_payment_counts_as_abort() {
    let h = TestHarness::new(PaymentParticipant::always_commit()).await;
    h.payment.set_unreachable(true);

    let outcome = h.coordinator.execute_order(order("ORD-1", &[("B1", 1)])).await;

    assert!(!outcome.success);
    assert_eq!(outcome.payment_vote, Vote::Unreachable);
    assert_eq!(outcome.decision, GlobalDecision::Abort);
    assert!(!outcome.payment_executed);
    assert_eq!(h.stock("B1").await, vec![5, 5, 5]);
}

#[tokio::test]
async fn test_unreachable_inventory_counts_as_abort() {
    let h = TestHarness::new(PaymentParticipant::always_commit()).await;
    h.inventory.set_unreachable(true);

    let outcome = h.coordinator.execute_order(order("ORD-1", &[("B1", 1)])).await;

    assert!(!outcome.success);
    assert_eq!(outcome.inventory_vote, Vote::Unreachable);
    assert_eq!(outcome.decision, GlobalDecision::Abort);
    assert!(matches!(outcome.items[0].status, ItemStatus::Failed(_)));
    assert_eq!(h.payment.executions().await, vec![false]);
}

#[tokio::test]
async fn test_unknown_book_fails_item() {
    let h = TestHarness::new(PaymentParticipant::always_commit()).await;

    let outcome = h
        .coordinator
        .execute_order(order("ORD-1", &[("MISSING", 1)]))
        .await;

    assert!(!outcome.success);
    assert!(outcome.payment_executed);
    let ItemStatus::Failed(reason) = &outcome.items[0].status else {
        panic!("expected a failed item, got {:?}", outcome.items[0].status);
    };
    assert!(reason.contains("MISSING"));
}

#[tokio::test]
async fn test_dead_chain_tail_fails_every_item() {
    let h = TestHarness::new(PaymentParticipant::always_commit()).await;
    h.network.set_down(ReplicaId::new(3).unwrap(), true).await;

    let outcome = h.coordinator.execute_order(order("ORD-1", &[("B1", 1)])).await;

    assert!(!outcome.success);
    assert!(matches!(outcome.items[0].status, ItemStatus::Failed(_)));
    assert_eq!(h.chain[0].store().get("B1").await.unwrap().copies_available, 5);
}

#[tokio::test]
async fn test_huge_line_quantities_fail_cleanly_with_logging_enabled() {
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_test_writer()
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);
    let h = TestHarness::new(PaymentParticipant::always_commit()).await;

    let outcome = h
        .coordinator
        .execute_order(order("ORD-1", &[("B1", u32::MAX), ("B2", 1)]))
        .await;

    assert!(!outcome.success);
    assert_eq!(
        outcome.items[0].status,
        ItemStatus::InsufficientStock {
            available: 5,
            requested: u32::MAX
        }
    );
    assert_eq!(h.stock("B1").await, vec![5, 5, 5]);
    assert_eq!(h.stock("B2").await, vec![2, 2, 2]);
}

#[tokio::test]
async fn test_each_order_gets_its_own_transaction() {
    let h = TestHarness::new(PaymentParticipant::always_commit()).await;

    let first = h.coordinator.execute_order(order("ORD-1", &[("B1", 1)])).await;
    let second = h.coordinator.execute_order(order("ORD-2", &[("B1", 1)])).await;

    assert_ne!(first.transaction_id, second.transaction_id);
    assert!(first.success && second.success);
    assert_eq!(h.stock("B1").await, vec![3, 3, 3]);
    assert_eq!(h.payment.votes_requested().await, 2);
}

#[tokio::test]
async fn test_ring_of_executors_drains_queue_against_chain() {
    let h = TestHarness::new(PaymentParticipant::always_commit()).await;
    let queue = InMemoryOrderQueue::new();
    for (n, book_id) in ["B1", "B2", "B3"].into_iter().enumerate() {
        queue.enqueue(order(&format!("ORD-{n}"), &[(book_id, 1)])).await;
    }

    let ring = LocalRing::new();
    let coordinator = Arc::new(TransactionCoordinator::new(
        ReplicaId::FIRST,
        h.payment.clone(),
        h.inventory.clone(),
    ));
    let mut members = Vec::new();
    for raw in 1..=3 {
        let member = Arc::new(TokenRing::new(
            ReplicaId::new(raw).unwrap(),
            3,
            RingConfig::default(),
            Arc::new(queue.clone()),
            ring.clone(),
            coordinator.clone(),
        ));
        ring.register(&member).await;
        members.push(member);
    }

    let mut outcomes = Vec::new();
    for member in members.iter().cycle().take(9) {
        if let TickOutcome::Dispatched(handle) = member.tick().await {
            outcomes.push(handle.await.unwrap());
        }
    }

    assert_eq!(outcomes.len(), 3);
    assert!(outcomes.iter().all(|o| o.success));
    assert!(queue.is_empty().await);
    assert_eq!(h.stock("B1").await, vec![4, 4, 4]);
    assert_eq!(h.stock("B2").await, vec![2, 2, 2]);
    assert_eq!(h.stock("B3").await, vec![7, 7, 7]);
    assert_eq!(members.iter().filter(|m| m.has_token()).count(), 1);
}
