//! Service entry point.

use node::client::HttpClient;
use node::config::{Config, ServiceRole};
use tokio::signal;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}

#[tokio::main]
async fn main() {
    // 1. Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 2. Load configuration
    let config = Config::from_env().expect("invalid configuration");

    // 3. Install Prometheus metrics recorder
    let metrics_handle = metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    let client = HttpClient::new(config.request_timeout).expect("failed to build HTTP client");

    // 4. Assemble the role
    let app = match config.role {
        ServiceRole::Inventory => {
            let replica = node::build_inventory_replica(&config, client)
                .expect("failed to load inventory catalog");
            let books = replica.store().len().await;
            tracing::info!(
                replica = %replica.id(),
                total = replica.total(),
                position = %replica.position(),
                books,
                "inventory replica ready"
            );
            node::create_inventory_app(replica, metrics_handle)
        }
        ServiceRole::Payment => {
            let participant = node::build_payment_participant(&config)
                .expect("invalid VOTE_COMMIT_PROBABILITY");
            tracing::info!(
                commit_probability = participant.commit_probability(),
                "payment participant ready"
            );
            node::create_payment_app(participant, metrics_handle)
        }
        ServiceRole::Executor => {
            let ring = node::build_executor(&config, client);
            tokio::spawn(ring.clone().run());
            node::create_executor_app(ring, metrics_handle)
        }
    };

    // 5. Start server
    let addr = config.addr();
    tracing::info!(
        %addr,
        role = %config.role,
        replica = %config.replica_id,
        total = config.total_replicas,
        "starting service"
    );

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind address");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    tracing::info!("server shut down gracefully");
}
