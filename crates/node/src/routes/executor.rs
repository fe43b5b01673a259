//! Executor replica endpoints: token hand-off and ring status.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use common::{AckResponse, PassTokenRequest, RingStatusResponse};
use executor::TokenRing;

pub type ExecutorState = Arc<TokenRing>;

/// POST /token: `PassToken(tokenId)`.
pub async fn receive_token(
    State(ring): State<ExecutorState>,
    Json(request): Json<PassTokenRequest>,
) -> Json<AckResponse> {
    Json(ring.receive_token(request))
}

/// GET /ring: this replica's token and busy flags.
pub async fn status(State(ring): State<ExecutorState>) -> Json<RingStatusResponse> {
    Json(ring.status())
}
