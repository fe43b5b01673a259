//! Orders as delivered by the external order queue.

use serde::{Deserialize, Serialize};

use crate::book::Book;

/// The customer who placed an order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct User {
    pub name: String,
    #[serde(default)]
    pub contact: String,
}

/// One line of an order: a book and how many copies of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub book: Book,
    pub quantity: u32,
}

impl OrderItem {
    pub fn new(book: Book, quantity: u32) -> Self {
        Self { book, quantity }
    }
}

/// An order dequeued for execution. Immutable once dequeued.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub order_id: String,
    #[serde(default)]
    pub priority: i32,
    #[serde(default)]
    pub user: User,
    pub items: Vec<OrderItem>,
}

impl Order {
    /// Creates an order with default priority and an anonymous user.
    pub fn new(order_id: impl Into<String>, items: Vec<OrderItem>) -> Self {
        Self {
            order_id: order_id.into(),
            priority: 0,
            user: User::default(),
            items,
        }
    }

    /// Total number of copies across all items. Widened so that no
    /// combination of line quantities can overflow.
    pub fn total_quantity(&self) -> u64 {
        self.items
            .iter()
            .fold(0u64, |acc, item| acc + u64::from(item.quantity))
    }
}
