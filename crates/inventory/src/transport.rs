//! How a replica reaches its chain neighbours.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Weak};

use async_trait::async_trait;
use common::{AckResponse, Book, GetBookRequest, ReplicaId};
use tokio::sync::RwLock;

use crate::chain::ChainReplica;
use crate::error::{InventoryError, Result};
use crate::store::BookStore;

/// Point-to-point calls between inventory replicas.
///
/// An unreachable peer surfaces as [`InventoryError::PeerUnreachable`].
#[async_trait]
pub trait ChainTransport: Send + Sync {
    /// Delivers `Head2Tail(book)` to `target`.
    async fn head2tail(&self, target: ReplicaId, book: Book) -> Result<AckResponse>;

    /// Delivers `Tail2Head(book)` to `target`.
    async fn tail2head(&self, target: ReplicaId, book: Book) -> Result<AckResponse>;

    /// Delivers `GetBook` to `target`.
    async fn get_book(&self, target: ReplicaId, request: GetBookRequest) -> Result<Book>;

    /// Delivers `ListBooks` to `target`.
    async fn list_books(&self, target: ReplicaId) -> Result<Vec<Book>>;
}

/// In-process chain network for tests and benchmarks.
///
/// Replicas are registered by id; any replica can be marked down, after
/// which calls addressed to it fail as if the process had crashed.
#[derive(Default)]
pub struct LocalChainNetwork {
    replicas: RwLock<HashMap<ReplicaId, Weak<ChainReplica>>>,
    down: RwLock<HashSet<ReplicaId>>,
}

impl LocalChainNetwork {
    /// Creates an empty network.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Builds and registers a chain of `total` replicas, each with its own
    /// store produced by `make_store`. Returned in chain order.
    pub async fn spawn_chain<F>(
        self: &Arc<Self>,
        total: u32,
        make_store: F,
    ) -> Vec<Arc<ChainReplica>>
    where
        F: Fn() -> BookStore,
    {
        let mut replicas = Vec::with_capacity(total as usize);
        for raw in 1..=total {
            let Some(id) = ReplicaId::new(raw) else {
                continue;
            };
            let transport: Arc<dyn ChainTransport> = self.clone();
            let replica = Arc::new(ChainReplica::with_store(id, total, make_store(), transport));
            self.register(&replica).await;
            replicas.push(replica);
        }
        replicas
    }

    /// Makes `replica` reachable under its own id.
    pub async fn register(&self, replica: &Arc<ChainReplica>) {
        self.replicas
            .write()
            .await
            .insert(replica.id(), Arc::downgrade(replica));
    }

    /// Marks a replica as crashed (`down == true`) or recovered.
    pub async fn set_down(&self, id: ReplicaId, down: bool) {
        let mut set = self.down.write().await;
        if down {
            set.insert(id);
        } else {
            set.remove(&id);
        }
    }

    async fn resolve(&self, target: ReplicaId) -> Result<Arc<ChainReplica>> {
        if self.down.read().await.contains(&target) {
            return Err(InventoryError::PeerUnreachable {
                replica: target,
                reason: "connection refused".to_string(),
            });
        }
        self.replicas
            .read()
            .await
            .get(&target)
            .and_then(Weak::upgrade)
            .ok_or_else(|| InventoryError::PeerUnreachable {
                replica: target,
                reason: "no such replica".to_string(),
            })
    }
}

#[async_trait]
impl ChainTransport for LocalChainNetwork {
    async fn head2tail(&self, target: ReplicaId, book: Book) -> Result<AckResponse> {
        self.resolve(target).await?.head2tail(book).await
    }

    async fn tail2head(&self, target: ReplicaId, book: Book) -> Result<AckResponse> {
        self.resolve(target).await?.tail2head(book).await
    }

    async fn get_book(&self, target: ReplicaId, request: GetBookRequest) -> Result<Book> {
        self.resolve(target).await?.get_book(request).await
    }

    async fn list_books(&self, target: ReplicaId) -> Result<Vec<Book>> {
        self.resolve(target).await?.list_books().await
    }
}
