//! HTTP handlers for the `/books` resource.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use bookstore_http::error::{AppError, ErrorResponse, MessageResponse};
use utoipa_axum::{router::OpenApiRouter, routes};

use super::models::{Book, BookChanges, NewBook};
use super::repository::BookRepository;
use super::validation::Validate;

const NOT_FOUND: &str = "Book not found";
const DELETED: &str = "Book successfully deleted";

/// Shared handler state
#[derive(Clone)]
pub struct BookState {
    repository: Arc<dyn BookRepository>,
}

impl BookState {
    pub fn new(repository: Arc<dyn BookRepository>) -> Self {
        Self { repository }
    }
}

/// Routes for the books resource together with their OpenAPI description
pub fn router(state: BookState) -> OpenApiRouter {
    OpenApiRouter::<BookState>::new()
        .routes(routes!(create_book, list_books))
        .routes(routes!(get_book, update_book, delete_book))
        .with_state(state)
}

/// Create a book
#[utoipa::path(
    post,
    path = "/books",
    tag = "books",
    request_body = NewBook,
    responses(
        (status = 201, description = "Book created", body = Book),
        (status = 400, description = "Malformed body or invalid fields", body = ErrorResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse)
    )
)]
pub async fn create_book(
    State(state): State<BookState>,
    payload: Result<Json<NewBook>, JsonRejection>,
) -> Result<(StatusCode, Json<Book>), AppError> {
    let Json(new_book) = payload.map_err(|rejection| {
        tracing::error!(error = %rejection.body_text(), "failed to bind book");
        AppError::from(rejection)
    })?;

    new_book.validate().map_err(|errors| {
        tracing::error!(%errors, "failed to validate book");
        AppError::from(errors)
    })?;

    let book = state.repository.insert(new_book).await.map_err(|error| {
        tracing::error!(%error, "failed to insert book");
        AppError::from(error)
    })?;

    tracing::info!(book_id = book.id, title = %book.title, isbn = %book.isbn, "book created");
    Ok((StatusCode::CREATED, Json(book)))
}

/// List all books
#[utoipa::path(
    get,
    path = "/books",
    tag = "books",
    responses(
        (status = 200, description = "All books, in no particular order", body = Vec<Book>),
        (status = 500, description = "Storage failure", body = ErrorResponse)
    )
)]
pub async fn list_books(State(state): State<BookState>) -> Result<Json<Vec<Book>>, AppError> {
    let books = state.repository.find_all().await.map_err(|error| {
        tracing::error!(%error, "failed to list books");
        AppError::from(error)
    })?;

    Ok(Json(books))
}

/// Fetch a book by id
#[utoipa::path(
    get,
    path = "/books/{id}",
    tag = "books",
    params(("id" = i64, Path, description = "Book identifier")),
    responses(
        (status = 200, description = "The book", body = Book),
        (status = 404, description = "No such book", body = ErrorResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse)
    )
)]
pub async fn get_book(
    State(state): State<BookState>,
    Path(id): Path<String>,
) -> Result<Json<Book>, AppError> {
    let book = find_active(&state, &id).await?;
    Ok(Json(book))
}

/// Update a book
///
/// Fields left out of the body keep their stored values.
#[utoipa::path(
    put,
    path = "/books/{id}",
    tag = "books",
    params(("id" = i64, Path, description = "Book identifier")),
    request_body = BookChanges,
    responses(
        (status = 200, description = "Book updated", body = Book),
        (status = 400, description = "Malformed body or invalid fields", body = ErrorResponse),
        (status = 404, description = "No such book", body = ErrorResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse)
    )
)]
pub async fn update_book(
    State(state): State<BookState>,
    Path(id): Path<String>,
    payload: Result<Json<BookChanges>, JsonRejection>,
) -> Result<Json<Book>, AppError> {
    // The lookup decides 404 before the body is considered
    let mut book = find_active(&state, &id).await?;

    let Json(changes) = payload.map_err(|rejection| {
        tracing::error!(book_id = book.id, error = %rejection.body_text(), "failed to bind book");
        AppError::from(rejection)
    })?;

    book.apply(changes);

    book.validate().map_err(|errors| {
        tracing::error!(book_id = book.id, %errors, "failed to validate book");
        AppError::from(errors)
    })?;

    let book = state.repository.save(&book).await.map_err(|error| {
        tracing::error!(book_id = book.id, %error, "failed to save book");
        AppError::from(error)
    })?;

    tracing::info!(book_id = book.id, "book updated");
    Ok(Json(book))
}

/// Delete a book
#[utoipa::path(
    delete,
    path = "/books/{id}",
    tag = "books",
    params(("id" = i64, Path, description = "Book identifier")),
    responses(
        (status = 200, description = "Book deleted", body = MessageResponse),
        (status = 404, description = "No such book", body = ErrorResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse)
    )
)]
pub async fn delete_book(
    State(state): State<BookState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let id = parse_id(&id)?;

    let affected = state.repository.delete_by_id(id).await.map_err(|error| {
        tracing::error!(book_id = id, %error, "failed to delete book");
        AppError::from(error)
    })?;

    if affected == 0 {
        return Err(AppError::not_found(NOT_FOUND));
    }

    tracing::info!(book_id = id, "book deleted");
    Ok(Json(MessageResponse::new(DELETED)))
}

async fn find_active(state: &BookState, raw_id: &str) -> Result<Book, AppError> {
    let id = parse_id(raw_id)?;

    state
        .repository
        .find_by_id(id)
        .await
        .map_err(|error| {
            tracing::error!(book_id = id, %error, "failed to fetch book");
            AppError::from(error)
        })?
        .ok_or_else(|| AppError::not_found(NOT_FOUND))
}

/// A segment that is not an integer cannot name a stored book.
fn parse_id(raw_id: &str) -> Result<i64, AppError> {
    raw_id
        .parse::<i64>()
        .map_err(|_| AppError::not_found(NOT_FOUND))
}
