//! Token-ring mutual exclusion over the order queue.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use common::{
    AckResponse, HealthCheckResponse, Order, PassTokenRequest, ReplicaId, RingStatusResponse,
};
use tokio::sync::Notify;
use tokio::task::JoinHandle;

use crate::coordinator::OrderProcessor;
use crate::services::queue::OrderQueue;
use crate::services::ring::RingTransport;
use crate::state::ReplicaState;
use crate::transaction::OrderOutcome;

/// Scheduling knobs for a ring member.
///
/// A `PassToken` call that fails after the peer already took the token
/// (for example when a client-wide request timeout fires while the reply
/// is in flight) is indistinguishable from a refused hand-off. The holder
/// then moves on to the next peer and the ring can briefly carry two
/// tokens. Keep any request timeout well above the peers' response time.
#[derive(Debug, Clone)]
pub struct RingConfig {
    /// Pause between iterations of the main loop.
    pub poll_interval: Duration,
    /// Wake the main loop as soon as the token arrives instead of waiting
    /// out the poll interval. After a tick that found the queue empty the
    /// full poll interval still applies, so an idle ring circulates the
    /// token at the polling rate.
    pub event_driven: bool,
    /// Upper bound on each `CheckHealth` probe during hand-off.
    pub health_timeout: Duration,
    /// Keep the token when no other replica answers, instead of dropping it.
    pub retain_when_isolated: bool,
}

impl Default for RingConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(20),
            event_driven: false,
            health_timeout: Duration::from_secs(5),
            retain_when_isolated: false,
        }
    }
}

/// What one iteration of the main loop did.
#[derive(Debug)]
pub enum TickOutcome {
    /// Not holding the token; nothing to do.
    NoToken,
    /// Held the token but the queue was empty or unavailable; token passed.
    QueueEmpty,
    /// Held the token while still executing an order; token passed.
    Busy,
    /// Dequeued an order, passed the token and started executing.
    Dispatched(JoinHandle<OrderOutcome>),
}

/// One executor replica's membership in the token ring.
///
/// Holds the token flag and the busy flag. The token is the right to
/// dequeue; the busy flag keeps a replica to one executing order.
pub struct TokenRing {
    id: ReplicaId,
    total: u32,
    config: RingConfig,
    has_token: AtomicBool,
    busy: Arc<AtomicBool>,
    token_arrived: Notify,
    queue: Arc<dyn OrderQueue>,
    transport: Arc<dyn RingTransport>,
    processor: Arc<dyn OrderProcessor>,
}

impl TokenRing {
    /// Creates a ring member. Replica 1 starts as the token holder.
    pub fn new(
        id: ReplicaId,
        total: u32,
        config: RingConfig,
        queue: Arc<dyn OrderQueue>,
        transport: Arc<dyn RingTransport>,
        processor: Arc<dyn OrderProcessor>,
    ) -> Self {
        let initial = ReplicaState::initial(id == ReplicaId::FIRST);
        if initial.holds_token() {
            tracing::info!(replica = %id, "starting as initial token holder");
        }
        Self {
            id,
            total,
            config,
            has_token: AtomicBool::new(initial.holds_token()),
            busy: Arc::new(AtomicBool::new(false)),
            token_arrived: Notify::new(),
            queue,
            transport,
            processor,
        }
    }

    pub fn id(&self) -> ReplicaId {
        self.id
    }

    pub fn has_token(&self) -> bool {
        self.has_token.load(Ordering::SeqCst)
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    pub fn state(&self) -> ReplicaState {
        ReplicaState::from_flags(self.has_token(), self.is_busy())
    }

    pub fn status(&self) -> RingStatusResponse {
        let state = self.state();
        RingStatusResponse {
            replica_id: self.id,
            state: state.to_string(),
            has_token: state.holds_token(),
            busy: state.is_busy(),
        }
    }

    /// `CheckHealth`: answering at all is the proof of liveness.
    pub fn check_health(&self) -> HealthCheckResponse {
        HealthCheckResponse::alive()
    }

    /// `PassToken`: become the holder. The payload is not verified.
    pub fn receive_token(&self, request: PassTokenRequest) -> AckResponse {
        tracing::debug!(replica = %self.id, token = %request.token, "token received");
        self.has_token.store(true, Ordering::SeqCst);
        self.token_arrived.notify_one();
        AckResponse::ok()
    }

    /// Runs the main loop forever.
    pub async fn run(self: Arc<Self>) {
        tracing::info!(
            replica = %self.id,
            total = self.total,
            state = %self.state(),
            poll_interval = ?self.config.poll_interval,
            "token ring loop started"
        );
        loop {
            let outcome = self.tick().await;
            self.wait_for_next_tick(&outcome).await;
        }
    }

    async fn wait_for_next_tick(&self, last: &TickOutcome) {
        let sleep = tokio::time::sleep(self.config.poll_interval);
        if self.config.event_driven && !matches!(last, TickOutcome::QueueEmpty) {
            tokio::select! {
                () = sleep => {}
                () = self.token_arrived.notified() => {}
            }
        } else {
            sleep.await;
        }
    }

    /// One iteration of the main loop.
    pub async fn tick(&self) -> TickOutcome {
        let state = self.state();
        if !state.holds_token() {
            return TickOutcome::NoToken;
        }

        if !state.can_dequeue() {
            tracing::info!(replica = %self.id, "busy, forwarding token");
            self.pass_token().await;
            return TickOutcome::Busy;
        }

        let order = match self.queue.dequeue().await {
            Ok(order) => order,
            Err(e) => {
                tracing::warn!(replica = %self.id, error = %e, "order queue unavailable");
                None
            }
        };

        let Some(order) = order else {
            self.pass_token().await;
            return TickOutcome::QueueEmpty;
        };

        tracing::info!(
            replica = %self.id,
            order_id = %order.order_id,
            "entered critical region and dequeued an order"
        );
        self.busy.store(true, Ordering::SeqCst);
        self.pass_token().await;
        TickOutcome::Dispatched(self.spawn_execution(order))
    }

    fn spawn_execution(&self, order: Order) -> JoinHandle<OrderOutcome> {
        let processor = Arc::clone(&self.processor);
        let guard = BusyGuard(Arc::clone(&self.busy));
        tokio::spawn(async move {
            let _guard = guard;
            processor.process(order).await
        })
    }

    /// Hands the token to the next live replica in ring order.
    ///
    /// The token flag is cleared before the first probe, so there is never
    /// more than one holder. Returns the new holder, or `None` if every
    /// other replica failed. A ring of one keeps its token.
    ///
    /// A hand-off that errors counts as refused and the next peer is tried;
    /// see [`RingConfig`] for what that means under request timeouts.
    pub async fn pass_token(&self) -> Option<ReplicaId> {
        if self.total <= 1 {
            return None;
        }
        self.has_token.store(false, Ordering::SeqCst);

        for peer in self.id.ring_successors(self.total) {
            if !self.probe(peer).await {
                metrics::counter!("token_peers_skipped_total").increment(1);
                continue;
            }

            match self
                .transport
                .pass_token(peer, PassTokenRequest::for_recipient(peer))
                .await
            {
                Ok(true) => {
                    metrics::counter!("token_passes_total").increment(1);
                    tracing::info!(replica = %self.id, to = %peer, "passed token");
                    return Some(peer);
                }
                Ok(false) => {
                    tracing::warn!(replica = %self.id, to = %peer, "token refused");
                }
                Err(e) => {
                    tracing::warn!(
                        replica = %self.id,
                        to = %peer,
                        error = %e,
                        "token hand-off failed"
                    );
                }
            }
            metrics::counter!("token_peers_skipped_total").increment(1);
        }

        if self.config.retain_when_isolated {
            tracing::warn!(replica = %self.id, "no other live replica, keeping token");
            self.has_token.store(true, Ordering::SeqCst);
        } else {
            metrics::counter!("token_lost_total").increment(1);
            tracing::error!(replica = %self.id, "no live replica in ring, token lost");
        }
        None
    }

    async fn probe(&self, peer: ReplicaId) -> bool {
        match tokio::time::timeout(self.config.health_timeout, self.transport.check_health(peer))
            .await
        {
            Ok(Ok(true)) => true,
            Ok(Ok(false)) => {
                tracing::info!(replica = %self.id, %peer, "replica did not respond");
                false
            }
            Ok(Err(e)) => {
                tracing::info!(replica = %self.id, %peer, error = %e, "could not reach replica");
                false
            }
            Err(_) => {
                tracing::info!(replica = %self.id, %peer, "health check timed out");
                false
            }
        }
    }
}

/// Clears the busy flag when order execution ends, including by panic.
struct BusyGuard(Arc<AtomicBool>);

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}
