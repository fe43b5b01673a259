//! Token-ring peer transport.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Weak};

use async_trait::async_trait;
use common::{PassTokenRequest, ReplicaId};
use tokio::sync::RwLock;

use crate::error::{ExecutorError, Result};
use crate::token_ring::TokenRing;

/// Calls between executor replicas.
#[async_trait]
pub trait RingTransport: Send + Sync {
    /// `CheckHealth()`. The caller bounds this call with a timeout.
    async fn check_health(&self, peer: ReplicaId) -> Result<bool>;

    /// `PassToken(tokenId)`: true once `peer` holds the token.
    async fn pass_token(&self, peer: ReplicaId, request: PassTokenRequest) -> Result<bool>;
}

/// In-process ring of [`TokenRing`] members for tests.
///
/// Members can be marked down (calls fail immediately) or stalled (health
/// checks never answer, so only the caller's timeout ends them).
#[derive(Default)]
pub struct LocalRing {
    members: RwLock<HashMap<ReplicaId, Weak<TokenRing>>>,
    down: RwLock<HashSet<ReplicaId>>,
    stalled: RwLock<HashSet<ReplicaId>>,
}

impl LocalRing {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub async fn register(&self, member: &Arc<TokenRing>) {
        self.members
            .write()
            .await
            .insert(member.id(), Arc::downgrade(member));
    }

    pub async fn set_down(&self, id: ReplicaId, down: bool) {
        let mut set = self.down.write().await;
        if down {
            set.insert(id);
        } else {
            set.remove(&id);
        }
    }

    pub async fn set_stalled(&self, id: ReplicaId, stalled: bool) {
        let mut set = self.stalled.write().await;
        if stalled {
            set.insert(id);
        } else {
            set.remove(&id);
        }
    }

    async fn resolve(&self, peer: ReplicaId) -> Result<Arc<TokenRing>> {
        if self.down.read().await.contains(&peer) {
            return Err(ExecutorError::unreachable(
                format!("executor replica {peer}"),
                "connection refused",
            ));
        }
        self.members
            .read()
            .await
            .get(&peer)
            .and_then(Weak::upgrade)
            .ok_or_else(|| {
                ExecutorError::unreachable(format!("executor replica {peer}"), "no such replica")
            })
    }
}

#[async_trait]
impl RingTransport for LocalRing {
    async fn check_health(&self, peer: ReplicaId) -> Result<bool> {
        let member = self.resolve(peer).await?;
        if self.stalled.read().await.contains(&peer) {
            std::future::pending::<()>().await;
        }
        Ok(member.check_health().alive)
    }

    async fn pass_token(&self, peer: ReplicaId, request: PassTokenRequest) -> Result<bool> {
        let member = self.resolve(peer).await?;
        Ok(member.receive_token(request).success)
    }
}
