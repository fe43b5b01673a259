//! Chain replication over a static, 1-indexed replica chain.

use std::sync::Arc;

use common::{AckResponse, Book, GetBookRequest, ReplicaId, VoteResponse};

use crate::error::{InventoryError, Result};
use crate::store::BookStore;
use crate::transport::ChainTransport;

/// Where a replica sits in the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainPosition {
    /// Only replica: head and tail at once.
    Single,
    /// First replica; entry point for every write.
    Head,
    /// Neither first nor last.
    Middle,
    /// Last replica; applies writes first and serves all reads.
    Tail,
}

impl ChainPosition {
    /// Derives the position of `id` in a chain of `total` replicas.
    pub fn of(id: ReplicaId, total: u32) -> Self {
        let is_first = id == ReplicaId::FIRST;
        let is_last = id.is_last(total);
        match (is_first, is_last) {
            (true, true) => ChainPosition::Single,
            (true, false) => ChainPosition::Head,
            (false, true) => ChainPosition::Tail,
            (false, false) => ChainPosition::Middle,
        }
    }

    /// Returns true if reads are served locally at this position.
    pub fn is_tail(&self) -> bool {
        matches!(self, ChainPosition::Tail | ChainPosition::Single)
    }

    /// Returns true if writes enter the chain at this position.
    pub fn is_head(&self) -> bool {
        matches!(self, ChainPosition::Head | ChainPosition::Single)
    }
}

impl std::fmt::Display for ChainPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ChainPosition::Single => "single",
            ChainPosition::Head => "head",
            ChainPosition::Middle => "middle",
            ChainPosition::Tail => "tail",
        };
        f.write_str(name)
    }
}

/// One inventory replica.
///
/// Holds its own [`BookStore`] and reaches its chain neighbours through a
/// [`ChainTransport`]. All public operations may be invoked on any replica;
/// writes are forwarded to the head and reads to the tail.
pub struct ChainReplica {
    id: ReplicaId,
    total: u32,
    store: BookStore,
    transport: Arc<dyn ChainTransport>,
}

impl ChainReplica {
    /// Creates a replica with an empty store.
    pub fn new(id: ReplicaId, total: u32, transport: Arc<dyn ChainTransport>) -> Self {
        Self::with_store(id, total, BookStore::new(), transport)
    }

    /// Creates a replica over an existing (for example catalog-seeded) store.
    pub fn with_store(
        id: ReplicaId,
        total: u32,
        store: BookStore,
        transport: Arc<dyn ChainTransport>,
    ) -> Self {
        Self {
            id,
            total,
            store,
            transport,
        }
    }

    pub fn id(&self) -> ReplicaId {
        self.id
    }

    pub fn total(&self) -> u32 {
        self.total
    }

    pub fn position(&self) -> ChainPosition {
        ChainPosition::of(self.id, self.total)
    }

    /// The replica's local store. Reads through it bypass tail pinning.
    pub fn store(&self) -> &BookStore {
        &self.store
    }

    fn tail_id(&self) -> ReplicaId {
        ReplicaId::new(self.total).unwrap_or(self.id)
    }

    /// `AddBook`: enters the chain at the head.
    #[tracing::instrument(skip(self, book), fields(replica = %self.id, book_id = %book.id))]
    pub async fn add_book(&self, book: Book) -> Result<AckResponse> {
        self.write_via_head(book).await
    }

    /// `UpdateBook`: enters the chain at the head, unless the coordinator's
    /// decision was abort, in which case the update is discarded.
    #[tracing::instrument(skip(self, book), fields(replica = %self.id, book_id = %book.id))]
    pub async fn update_book(&self, book: Book, commit_status: bool) -> Result<AckResponse> {
        if !commit_status {
            tracing::info!("global abort received, update discarded");
            return Ok(AckResponse::failed());
        }
        self.write_via_head(book).await
    }

    async fn write_via_head(&self, book: Book) -> Result<AckResponse> {
        if self.position().is_head() {
            self.head2tail(book).await
        } else {
            self.transport.head2tail(ReplicaId::FIRST, book).await
        }
    }

    /// `GetBook`: served by the tail; other replicas relay the call.
    #[tracing::instrument(skip(self, request), fields(replica = %self.id, book_id = %request.request_id))]
    pub async fn get_book(&self, request: GetBookRequest) -> Result<Book> {
        if self.position().is_tail() {
            tracing::debug!(commit_status = request.commit_status, "serving read at tail");
            return self
                .store
                .get(&request.request_id)
                .await
                .ok_or(InventoryError::BookNotFound(request.request_id));
        }

        let tail = self.tail_id();
        tracing::debug!(%tail, "redirecting read to tail");
        self.transport.get_book(tail, request).await
    }

    /// `ListBooks`: the tail's full catalog.
    pub async fn list_books(&self) -> Result<Vec<Book>> {
        if self.position().is_tail() {
            return Ok(self.store.list().await);
        }
        self.transport.list_books(self.tail_id()).await
    }

    /// `Head2Tail`: forwards a write toward the tail without applying it.
    /// At the tail the write is applied and the acknowledgment walk begins.
    #[tracing::instrument(skip(self, book), fields(replica = %self.id, book_id = %book.id))]
    pub async fn head2tail(&self, book: Book) -> Result<AckResponse> {
        match self.id.next_in_chain(self.total) {
            Some(next) => {
                tracing::debug!(%next, "head to tail");
                self.transport
                    .head2tail(next, book)
                    .await
                    .inspect_err(|e| link_failure(self.id, next, e))
            }
            None => self.tail2head(book).await,
        }
    }

    /// `Tail2Head`: applies the write locally and passes the acknowledgment
    /// toward the head. The head ends the walk.
    #[tracing::instrument(skip(self, book), fields(replica = %self.id, book_id = %book.id))]
    pub async fn tail2head(&self, book: Book) -> Result<AckResponse> {
        if self.position().is_tail() {
            metrics::counter!("chain_writes_total").increment(1);
        }
        self.store.put(book.clone()).await;
        tracing::debug!("book info updated");

        match self.id.prev_in_chain() {
            Some(prev) => {
                tracing::debug!(%prev, "tail to head");
                self.transport
                    .tail2head(prev, book)
                    .await
                    .inspect_err(|e| link_failure(self.id, prev, e))
            }
            None => Ok(AckResponse::ok()),
        }
    }

    /// `SendVoteToCoordinator`: the inventory always votes commit.
    pub fn vote(&self) -> VoteResponse {
        tracing::info!(replica = %self.id, "vote request received, voting commit");
        VoteResponse { success: true }
    }
}

fn link_failure(from: ReplicaId, to: ReplicaId, err: &InventoryError) {
    metrics::counter!("chain_link_failures_total").increment(1);
    tracing::warn!(%from, %to, error = %err, "chain link failed, write stalled");
}
