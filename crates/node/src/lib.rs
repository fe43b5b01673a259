//! HTTP service process for the distributed order-processing system.
//!
//! One binary runs any of the three roles: an inventory chain replica, the
//! payment participant, or an order executor replica. Every role serves
//! JSON over HTTP with structured logging (tracing) and Prometheus metrics.

pub mod client;
pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use executor::{TokenRing, TransactionCoordinator};
use inventory::{BookStore, ChainReplica, ChainTransport};
use metrics_exporter_prometheus::PrometheusHandle;
use payment::{PaymentError, PaymentParticipant};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use client::{
    HttpChainTransport, HttpClient, HttpInventoryGateway, HttpOrderQueue, HttpPaymentGateway,
    HttpRingTransport,
};
use config::Config;

/// Creates the router of an inventory chain replica.
pub fn create_inventory_app(
    replica: Arc<ChainReplica>,
    metrics_handle: PrometheusHandle,
) -> Router {
    Router::new()
        .route("/health", get(routes::health::check))
        .route("/vote", post(routes::inventory::vote))
        .route("/books", post(routes::inventory::add).get(routes::inventory::list))
        .route("/books/get", post(routes::inventory::get))
        .route("/books/update", post(routes::inventory::update))
        .route("/chain/head2tail", post(routes::inventory::head2tail))
        .route("/chain/tail2head", post(routes::inventory::tail2head))
        .with_state(replica)
        .merge(metrics_router(metrics_handle))
        .layer(cors())
        .layer(TraceLayer::new_for_http())
}

/// Creates the router of the payment participant.
pub fn create_payment_app(
    participant: PaymentParticipant,
    metrics_handle: PrometheusHandle,
) -> Router {
    Router::new()
        .route("/health", get(routes::health::check))
        .route("/vote", post(routes::payment::vote))
        .route("/execute", post(routes::payment::execute))
        .with_state(participant)
        .merge(metrics_router(metrics_handle))
        .layer(cors())
        .layer(TraceLayer::new_for_http())
}

/// Creates the router of an executor replica.
pub fn create_executor_app(ring: Arc<TokenRing>, metrics_handle: PrometheusHandle) -> Router {
    Router::new()
        .route("/health", get(routes::health::check))
        .route("/token", post(routes::executor::receive_token))
        .route("/ring", get(routes::executor::status))
        .with_state(ring)
        .merge(metrics_router(metrics_handle))
        .layer(cors())
        .layer(TraceLayer::new_for_http())
}

fn metrics_router(metrics_handle: PrometheusHandle) -> Router {
    Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle)
}

fn cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Builds this process's inventory replica, seeded from `CATALOG_PATH`
/// when one is configured.
pub fn build_inventory_replica(
    config: &Config,
    client: HttpClient,
) -> inventory::Result<Arc<ChainReplica>> {
    let store = match &config.catalog_path {
        Some(path) => {
            let store = BookStore::from_catalog_file(path)?;
            tracing::info!(path = %path.display(), "catalog loaded");
            store
        }
        None => BookStore::new(),
    };
    let transport: Arc<dyn ChainTransport> = Arc::new(HttpChainTransport::new(
        client,
        config.inventory_addr_template.clone(),
    ));
    Ok(Arc::new(ChainReplica::with_store(
        config.replica_id,
        config.total_replicas,
        store,
        transport,
    )))
}

/// Builds the payment participant with the configured vote bias.
pub fn build_payment_participant(config: &Config) -> Result<PaymentParticipant, PaymentError> {
    PaymentParticipant::new(config.vote_commit_probability)
}

/// Builds this process's token-ring member and its 2PC coordinator.
///
/// The caller spawns [`TokenRing::run`] on the returned handle.
pub fn build_executor(config: &Config, client: HttpClient) -> Arc<TokenRing> {
    let coordinator = TransactionCoordinator::new(
        config.replica_id,
        HttpPaymentGateway::new(client.clone(), config.payment_addr.clone()),
        HttpInventoryGateway::new(client.clone(), config.inventory_addr(config.inventory_entry_id)),
    )
    .with_faults(config.faults());

    Arc::new(TokenRing::new(
        config.replica_id,
        config.total_replicas,
        config.ring_config(),
        Arc::new(HttpOrderQueue::new(client.clone(), config.queue_addr.clone())),
        Arc::new(HttpRingTransport::new(client, config.executor_addr_template.clone())),
        Arc::new(coordinator),
    ))
}
