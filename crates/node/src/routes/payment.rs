//! Payment participant endpoints.

use axum::Json;
use axum::extract::State;
use common::{AckResponse, ExecutePaymentRequest, VoteRequest, VoteResponse};
use payment::PaymentParticipant;

/// POST /vote: `SendVoteToCoordinator()`.
pub async fn vote(
    State(participant): State<PaymentParticipant>,
    Json(_): Json<VoteRequest>,
) -> Json<VoteResponse> {
    Json(participant.vote())
}

/// POST /execute: `ExecutePayment(commitStatus)`.
#[tracing::instrument(skip(participant))]
pub async fn execute(
    State(participant): State<PaymentParticipant>,
    Json(request): Json<ExecutePaymentRequest>,
) -> Json<AckResponse> {
    Json(participant.execute(request.commit_status))
}
