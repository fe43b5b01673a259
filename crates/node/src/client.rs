//! HTTP clients for every inter-service call.
//!
//! Each struct here implements one of the transport traits from the
//! `inventory` and `executor` crates by sending JSON over HTTP.

use std::time::Duration;

use async_trait::async_trait;
use common::{
    AckResponse, Book, DequeueRequest, DequeueResponse, ExecutePaymentRequest, GetBookRequest,
    HealthCheckResponse, Order, PassTokenRequest, ReplicaId, UpdateBookRequest, VoteRequest,
    VoteResponse,
};
use executor::{ExecutorError, InventoryGateway, OrderQueue, PaymentGateway, RingTransport};
use inventory::{ChainTransport, InventoryError};
use reqwest::StatusCode;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::config::expand;

/// Failure of a single HTTP call.
#[derive(Debug, Error)]
pub enum CallError {
    /// No usable response: connection refused, timeout, broken body.
    #[error(transparent)]
    Transport(#[from] reqwest::Error),

    /// The peer answered with a non-success status.
    #[error("HTTP {status}: {body}")]
    Status { status: StatusCode, body: String },
}

impl CallError {
    fn is_not_found(&self) -> bool {
        matches!(self, CallError::Status { status, .. } if *status == StatusCode::NOT_FOUND)
    }
}

/// Shared JSON-over-HTTP client.
///
/// Cheap to clone; all clones share one connection pool.
#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: reqwest::Client,
}

impl HttpClient {
    /// Builds a client. `timeout`, when set, bounds every request.
    pub fn new(timeout: Option<Duration>) -> reqwest::Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            inner: builder.build()?,
        })
    }

    pub async fn post<Req, Resp>(&self, url: &str, body: &Req) -> Result<Resp, CallError>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        tracing::trace!(%url, "POST");
        let response = self.inner.post(url).json(body).send().await?;
        decode(response).await
    }

    pub async fn get<Resp>(&self, url: &str) -> Result<Resp, CallError>
    where
        Resp: DeserializeOwned,
    {
        tracing::trace!(%url, "GET");
        let response = self.inner.get(url).send().await?;
        decode(response).await
    }
}

async fn decode<Resp: DeserializeOwned>(response: reqwest::Response) -> Result<Resp, CallError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(CallError::Status { status, body });
    }
    Ok(response.json().await?)
}

/// Chain links between inventory replicas.
#[derive(Debug, Clone)]
pub struct HttpChainTransport {
    client: HttpClient,
    addr_template: String,
}

impl HttpChainTransport {
    pub fn new(client: HttpClient, addr_template: impl Into<String>) -> Self {
        Self {
            client,
            addr_template: addr_template.into(),
        }
    }

    fn url(&self, target: ReplicaId, path: &str) -> String {
        format!("{}{path}", expand(&self.addr_template, target))
    }
}

fn chain_error(target: ReplicaId, err: CallError) -> InventoryError {
    match err {
        CallError::Transport(e) if e.is_decode() => InventoryError::InvalidResponse {
            replica: target,
            reason: e.to_string(),
        },
        CallError::Transport(e) => InventoryError::PeerUnreachable {
            replica: target,
            reason: e.to_string(),
        },
        CallError::Status { status, body } if status.is_server_error() => {
            InventoryError::PeerUnreachable {
                replica: target,
                reason: format!("HTTP {status}: {body}"),
            }
        }
        other => InventoryError::InvalidResponse {
            replica: target,
            reason: other.to_string(),
        },
    }
}

#[async_trait]
impl ChainTransport for HttpChainTransport {
    async fn head2tail(&self, target: ReplicaId, book: Book) -> inventory::Result<AckResponse> {
        self.client
            .post(&self.url(target, "/chain/head2tail"), &book)
            .await
            .map_err(|e| chain_error(target, e))
    }

    async fn tail2head(&self, target: ReplicaId, book: Book) -> inventory::Result<AckResponse> {
        self.client
            .post(&self.url(target, "/chain/tail2head"), &book)
            .await
            .map_err(|e| chain_error(target, e))
    }

    async fn get_book(
        &self,
        target: ReplicaId,
        request: GetBookRequest,
    ) -> inventory::Result<Book> {
        let book_id = request.request_id.clone();
        self.client
            .post(&self.url(target, "/books/get"), &request)
            .await
            .map_err(|e| {
                if e.is_not_found() {
                    InventoryError::BookNotFound(book_id)
                } else {
                    chain_error(target, e)
                }
            })
    }

    async fn list_books(&self, target: ReplicaId) -> inventory::Result<Vec<Book>> {
        self.client
            .get(&self.url(target, "/books"))
            .await
            .map_err(|e| chain_error(target, e))
    }
}

fn executor_error(peer: &str, err: CallError) -> ExecutorError {
    match err {
        CallError::Transport(e) if !e.is_decode() => ExecutorError::unreachable(peer, e),
        CallError::Status { status, body } if status.is_server_error() => {
            ExecutorError::unreachable(peer, format!("HTTP {status}: {body}"))
        }
        other => ExecutorError::UnexpectedResponse {
            peer: peer.to_string(),
            reason: other.to_string(),
        },
    }
}

/// Coordinator-side client of the payment participant.
#[derive(Debug, Clone)]
pub struct HttpPaymentGateway {
    client: HttpClient,
    base: String,
}

impl HttpPaymentGateway {
    pub fn new(client: HttpClient, base: impl Into<String>) -> Self {
        Self {
            client,
            base: base.into(),
        }
    }
}

#[async_trait]
impl PaymentGateway for HttpPaymentGateway {
    async fn request_vote(&self) -> executor::Result<bool> {
        let vote: VoteResponse = self
            .client
            .post(&format!("{}/vote", self.base), &VoteRequest {})
            .await
            .map_err(|e| executor_error("payment", e))?;
        Ok(vote.success)
    }

    async fn execute_payment(&self, commit_status: bool) -> executor::Result<bool> {
        let ack: AckResponse = self
            .client
            .post(
                &format!("{}/execute", self.base),
                &ExecutePaymentRequest { commit_status },
            )
            .await
            .map_err(|e| executor_error("payment", e))?;
        Ok(ack.success)
    }
}

/// Coordinator-side client of the inventory chain's entry replica.
#[derive(Debug, Clone)]
pub struct HttpInventoryGateway {
    client: HttpClient,
    base: String,
}

impl HttpInventoryGateway {
    pub fn new(client: HttpClient, base: impl Into<String>) -> Self {
        Self {
            client,
            base: base.into(),
        }
    }
}

#[async_trait]
impl InventoryGateway for HttpInventoryGateway {
    async fn request_vote(&self) -> executor::Result<bool> {
        let vote: VoteResponse = self
            .client
            .post(&format!("{}/vote", self.base), &VoteRequest {})
            .await
            .map_err(|e| executor_error("inventory", e))?;
        Ok(vote.success)
    }

    async fn get_book(&self, book_id: &str, commit_status: bool) -> executor::Result<Book> {
        let request = GetBookRequest {
            request_id: book_id.to_string(),
            commit_status,
        };
        self.client
            .post(&format!("{}/books/get", self.base), &request)
            .await
            .map_err(|e| {
                if e.is_not_found() {
                    ExecutorError::BookNotFound(book_id.to_string())
                } else {
                    executor_error("inventory", e)
                }
            })
    }

    async fn update_book(&self, book: Book, commit_status: bool) -> executor::Result<bool> {
        let ack: AckResponse = self
            .client
            .post(
                &format!("{}/books/update", self.base),
                &UpdateBookRequest {
                    book,
                    commit_status,
                },
            )
            .await
            .map_err(|e| executor_error("inventory", e))?;
        Ok(ack.success)
    }
}

/// Client of the external order queue.
#[derive(Debug, Clone)]
pub struct HttpOrderQueue {
    client: HttpClient,
    base: String,
}

impl HttpOrderQueue {
    pub fn new(client: HttpClient, base: impl Into<String>) -> Self {
        Self {
            client,
            base: base.into(),
        }
    }
}

#[async_trait]
impl OrderQueue for HttpOrderQueue {
    async fn dequeue(&self) -> executor::Result<Option<Order>> {
        let response: DequeueResponse = self
            .client
            .post(&format!("{}/dequeue", self.base), &DequeueRequest {})
            .await
            .map_err(|e| executor_error("order queue", e))?;

        match (response.success, response.order) {
            (true, Some(order)) => Ok(Some(order)),
            (true, None) => Err(ExecutorError::UnexpectedResponse {
                peer: "order queue".to_string(),
                reason: "success without an order".to_string(),
            }),
            (false, _) => Ok(None),
        }
    }
}

/// Calls between executor replicas of the token ring.
#[derive(Debug, Clone)]
pub struct HttpRingTransport {
    client: HttpClient,
    addr_template: String,
}

impl HttpRingTransport {
    pub fn new(client: HttpClient, addr_template: impl Into<String>) -> Self {
        Self {
            client,
            addr_template: addr_template.into(),
        }
    }

    fn url(&self, peer: ReplicaId, path: &str) -> String {
        format!("{}{path}", expand(&self.addr_template, peer))
    }
}

#[async_trait]
impl RingTransport for HttpRingTransport {
    async fn check_health(&self, peer: ReplicaId) -> executor::Result<bool> {
        let health: HealthCheckResponse = self
            .client
            .get(&self.url(peer, "/health"))
            .await
            .map_err(|e| executor_error(&format!("executor replica {peer}"), e))?;
        Ok(health.alive)
    }

    async fn pass_token(
        &self,
        peer: ReplicaId,
        request: PassTokenRequest,
    ) -> executor::Result<bool> {
        let ack: AckResponse = self
            .client
            .post(&self.url(peer, "/token"), &request)
            .await
            .map_err(|e| executor_error(&format!("executor replica {peer}"), e))?;
        Ok(ack.success)
    }
}
