//! HTTP handlers for `/books`.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde_json::Value;
use shelf_http::{AppError, JsonBody};

use super::{
    models::{BookEnvelope, BookList, MessageResponse},
    repository::{BookRepository, RepoError},
    schema,
};

/// Shared handle threaded through every handler.
pub type BookStore = Arc<dyn BookRepository>;

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::Database(source) => AppError::Internal(source.into()),
            missing @ RepoError::NotFound(_) => AppError::not_found(missing.to_string()),
        }
    }
}

pub fn router(store: BookStore) -> Router {
    Router::new()
        .route("/books", get(list_books).post(create_book))
        .route(
            "/books/{isbn}",
            get(get_book).put(update_book).delete(delete_book),
        )
        .with_state(store)
}

fn rejected(violations: Vec<schema::Violation>) -> AppError {
    AppError::validation(violations.iter().map(ToString::to_string))
}

async fn list_books(State(store): State<BookStore>) -> Result<Json<BookList>, AppError> {
    let books = store.list_all().await?;
    tracing::debug!(count = books.len(), "listed books");
    Ok(Json(BookList { books }))
}

async fn get_book(
    State(store): State<BookStore>,
    Path(isbn): Path<String>,
) -> Result<Json<BookEnvelope>, AppError> {
    let book = store.get_by_isbn(&isbn).await?;
    Ok(Json(BookEnvelope { book }))
}

async fn create_book(
    State(store): State<BookStore>,
    JsonBody(payload): JsonBody<Value>,
) -> Result<(StatusCode, Json<BookEnvelope>), AppError> {
    let book = schema::validate(&payload).map_err(rejected)?;
    let book = store.create(&book).await?;

    tracing::info!(isbn = %book.isbn, "book created");
    Ok((StatusCode::CREATED, Json(BookEnvelope { book })))
}

async fn update_book(
    State(store): State<BookStore>,
    Path(isbn): Path<String>,
    JsonBody(payload): JsonBody<Value>,
) -> Result<Json<BookEnvelope>, AppError> {
    let changes = schema::validate(&payload).map_err(rejected)?;
    if changes.isbn != isbn {
        tracing::debug!(%isbn, body_isbn = %changes.isbn, "body isbn ignored on update");
    }

    let book = store.update(&isbn, &changes).await?;

    tracing::info!(isbn = %book.isbn, "book updated");
    Ok(Json(BookEnvelope { book }))
}

async fn delete_book(
    State(store): State<BookStore>,
    Path(isbn): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    store.delete_by_isbn(&isbn).await?;

    tracing::info!(%isbn, "book deleted");
    Ok(Json(MessageResponse {
        message: "Book deleted",
    }))
}
