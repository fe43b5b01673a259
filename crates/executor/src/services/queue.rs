//! Order queue collaborator.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use common::Order;
use tokio::sync::Mutex;

use crate::error::Result;

/// The external order queue. Each successful dequeue hands out an order at
/// most once.
#[async_trait]
pub trait OrderQueue: Send + Sync {
    /// `Dequeue()`: `None` when no work is available.
    async fn dequeue(&self) -> Result<Option<Order>>;
}

/// In-memory priority queue for tests.
///
/// Higher `priority` first; equal priorities in arrival order.
#[derive(Debug, Clone, Default)]
pub struct InMemoryOrderQueue {
    orders: Arc<Mutex<VecDeque<Order>>>,
}

impl InMemoryOrderQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn enqueue(&self, order: Order) {
        self.orders.lock().await.push_back(order);
    }

    pub async fn len(&self) -> usize {
        self.orders.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.orders.lock().await.is_empty()
    }
}

#[async_trait]
impl OrderQueue for InMemoryOrderQueue {
    async fn dequeue(&self) -> Result<Option<Order>> {
        let mut orders = self.orders.lock().await;
        let next = orders
            .iter()
            .enumerate()
            .max_by(|(ia, a), (ib, b)| a.priority.cmp(&b.priority).then(ib.cmp(ia)))
            .map(|(index, _)| index);
        Ok(next.and_then(|index| orders.remove(index)))
    }
}
