//! Inventory replica endpoints: client-facing book operations and the
//! chain links between replicas.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use common::{AckResponse, Book, GetBookRequest, UpdateBookRequest, VoteRequest, VoteResponse};
use inventory::ChainReplica;

use crate::error::ApiError;

pub type InventoryState = Arc<ChainReplica>;

/// POST /books: `AddBook(book)`.
#[tracing::instrument(skip(replica, book), fields(book_id = %book.id))]
pub async fn add(
    State(replica): State<InventoryState>,
    Json(book): Json<Book>,
) -> Result<Json<AckResponse>, ApiError> {
    validate(&book)?;
    Ok(Json(replica.add_book(book).await?))
}

/// GET /books: `ListBooks()`, served by the tail.
pub async fn list(State(replica): State<InventoryState>) -> Result<Json<Vec<Book>>, ApiError> {
    Ok(Json(replica.list_books().await?))
}

/// POST /books/get: `GetBook(requestId, commitStatus)`.
#[tracing::instrument(skip(replica, request), fields(book_id = %request.request_id))]
pub async fn get(
    State(replica): State<InventoryState>,
    Json(request): Json<GetBookRequest>,
) -> Result<Json<Book>, ApiError> {
    Ok(Json(replica.get_book(request).await?))
}

/// POST /books/update: `UpdateBook(book, commitStatus)`.
#[tracing::instrument(skip(replica, request), fields(book_id = %request.book.id, commit = request.commit_status))]
pub async fn update(
    State(replica): State<InventoryState>,
    Json(request): Json<UpdateBookRequest>,
) -> Result<Json<AckResponse>, ApiError> {
    validate(&request.book)?;
    Ok(Json(
        replica
            .update_book(request.book, request.commit_status)
            .await?,
    ))
}

/// POST /chain/head2tail
pub async fn head2tail(
    State(replica): State<InventoryState>,
    Json(book): Json<Book>,
) -> Result<Json<AckResponse>, ApiError> {
    Ok(Json(replica.head2tail(book).await?))
}

/// POST /chain/tail2head
pub async fn tail2head(
    State(replica): State<InventoryState>,
    Json(book): Json<Book>,
) -> Result<Json<AckResponse>, ApiError> {
    Ok(Json(replica.tail2head(book).await?))
}

/// POST /vote: `SendVoteToCoordinator()`.
pub async fn vote(
    State(replica): State<InventoryState>,
    Json(_): Json<VoteRequest>,
) -> Json<VoteResponse> {
    Json(replica.vote())
}

fn validate(book: &Book) -> Result<(), ApiError> {
    if book.id.trim().is_empty() {
        return Err(ApiError::BadRequest("book id must not be empty".to_string()));
    }
    Ok(())
}
