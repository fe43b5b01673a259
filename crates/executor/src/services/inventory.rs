//! Inventory chain gateway.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use common::{Book, GetBookRequest};
use inventory::{ChainReplica, InventoryError};

use crate::error::{ExecutorError, Result};

/// The coordinator's view of the inventory chain's entry replica.
#[async_trait]
pub trait InventoryGateway: Send + Sync {
    /// `SendVoteToCoordinator`: true is a commit vote.
    async fn request_vote(&self) -> Result<bool>;

    /// `GetBook(requestId, commitStatus)`, served by the tail.
    async fn get_book(&self, book_id: &str, commit_status: bool) -> Result<Book>;

    /// `UpdateBook(book, commitStatus)`: true once the write has walked the
    /// whole chain and back.
    async fn update_book(&self, book: Book, commit_status: bool) -> Result<bool>;
}

/// In-process gateway that calls a [`ChainReplica`] directly.
#[derive(Clone)]
pub struct LocalInventoryGateway {
    entry: Arc<ChainReplica>,
    unreachable: Arc<AtomicBool>,
}

impl LocalInventoryGateway {
    pub fn new(entry: Arc<ChainReplica>) -> Self {
        Self {
            entry,
            unreachable: Arc::default(),
        }
    }

    /// Makes every subsequent call fail as unreachable.
    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::SeqCst);
    }

    fn check_reachable(&self) -> Result<()> {
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(ExecutorError::unreachable(
                format!("inventory replica {}", self.entry.id()),
                "connection refused",
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl InventoryGateway for LocalInventoryGateway {
    async fn request_vote(&self) -> Result<bool> {
        self.check_reachable()?;
        Ok(self.entry.vote().success)
    }

    async fn get_book(&self, book_id: &str, commit_status: bool) -> Result<Book> {
        self.check_reachable()?;
        let request = GetBookRequest {
            request_id: book_id.to_string(),
            commit_status,
        };
        self.entry.get_book(request).await.map_err(|e| match e {
            InventoryError::BookNotFound(id) => ExecutorError::BookNotFound(id),
            other => other.into(),
        })
    }

    async fn update_book(&self, book: Book, commit_status: bool) -> Result<bool> {
        self.check_reachable()?;
        Ok(self.entry.update_book(book, commit_status).await?.success)
    }
}
