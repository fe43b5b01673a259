//! Request and response bodies for every inter-service call.
//!
//! Each call has its own struct, built field by field. Field names are
//! camelCase on the wire.

use serde::{Deserialize, Serialize};

use crate::book::Book;
use crate::order::Order;
use crate::types::ReplicaId;

/// Generic `{success}` acknowledgment used by most calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AckResponse {
    pub success: bool,
}

impl AckResponse {
    pub fn ok() -> Self {
        Self { success: true }
    }

    pub fn failed() -> Self {
        Self { success: false }
    }
}

/// `Dequeue()` request to the order queue.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DequeueRequest {}

/// `Dequeue()` response. `order` is present iff `success`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DequeueResponse {
    pub success: bool,
    #[serde(default)]
    pub order: Option<Order>,
}

/// `SendVoteToCoordinator()` request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VoteRequest {}

/// A participant's vote: `success == true` is a commit vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteResponse {
    pub success: bool,
}

/// `ExecutePayment(commitStatus)` request.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutePaymentRequest {
    pub commit_status: bool,
}

/// `GetBook(requestId, commitStatus)` request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetBookRequest {
    pub request_id: String,
    #[serde(default)]
    pub commit_status: bool,
}

/// `UpdateBook(book, commitStatus)` request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBookRequest {
    pub book: Book,
    pub commit_status: bool,
}

/// `CheckHealth()` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheckResponse {
    pub status: String,
    pub alive: bool,
}

impl HealthCheckResponse {
    pub fn alive() -> Self {
        Self {
            status: "ok".to_string(),
            alive: true,
        }
    }
}

/// `PassToken(tokenId)` request. The receiver does not inspect the payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PassTokenRequest {
    pub token: String,
}

impl PassTokenRequest {
    /// Builds the hand-off message addressed to `recipient`.
    pub fn for_recipient(recipient: ReplicaId) -> Self {
        Self {
            token: recipient.to_string(),
        }
    }
}

/// Snapshot of an executor replica's position in the token ring.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RingStatusResponse {
    pub replica_id: ReplicaId,
    pub state: String,
    pub has_token: bool,
    pub busy: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dequeue_response_without_order() {
        let resp: DequeueResponse = serde_json::from_str(r#"{"success":false}"#).unwrap();
        assert!(!resp.success);
        assert!(resp.order.is_none());
    }

    #[test]
    fn update_request_uses_commit_status_field() {
        let req = UpdateBookRequest {
            book: Book::new("B1", "Dune", 4),
            commit_status: true,
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["commitStatus"], true);
        assert_eq!(json["book"]["copiesAvailable"], 4);
    }

    #[test]
    fn token_payload_names_recipient() {
        let req = PassTokenRequest::for_recipient(ReplicaId::new(4).unwrap());
        assert_eq!(req.token, "4");
    }
}
