//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use inventory::InventoryError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Bad request from the client.
    BadRequest(String),
    /// Inventory replica error.
    Inventory(InventoryError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Inventory(err) => inventory_error_to_response(err),
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn inventory_error_to_response(err: InventoryError) -> (StatusCode, String) {
    match &err {
        InventoryError::BookNotFound(_) => (StatusCode::NOT_FOUND, err.to_string()),
        InventoryError::PeerUnreachable { .. } | InventoryError::InvalidResponse { .. } => {
            (StatusCode::BAD_GATEWAY, err.to_string())
        }
        InventoryError::Catalog(_) | InventoryError::Serialization(_) => {
            tracing::error!(error = %err, "inventory failure");
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
    }
}

impl From<InventoryError> for ApiError {
    fn from(err: InventoryError) -> Self {
        ApiError::Inventory(err)
    }
}

#[cfg(test)]
mod tests {
    use common::ReplicaId;

    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (
                ApiError::from(InventoryError::BookNotFound("B1".into())),
                StatusCode::NOT_FOUND,
            ),
            (
                ApiError::from(InventoryError::PeerUnreachable {
                    replica: ReplicaId::FIRST,
                    reason: "connection refused".into(),
                }),
                StatusCode::BAD_GATEWAY,
            ),
            (ApiError::BadRequest("bad".into()), StatusCode::BAD_REQUEST),
        ];

        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }
}
