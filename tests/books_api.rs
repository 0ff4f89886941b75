use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    response::Response,
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt; // for `oneshot`

use bookstore_app::modules::books::models::{Book, NewBook};
use bookstore_app::modules::books::repository::{
    BookRepository, InMemoryBookRepository, RepositoryError, RepositoryResult,
};
use bookstore_app::Application;
use bookstore_kernel::settings::Settings;

/// Builds the full application router over the given repository
fn build_test_app(repository: Arc<dyn BookRepository>) -> Router {
    let app = Application::with_repository(repository, None);
    bookstore_http::build_router(app.registry(), &Settings::default())
}

fn memory_app() -> Router {
    build_test_app(Arc::new(InMemoryBookRepository::new()))
}

fn json_request(method: Method, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn empty_request(method: Method, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response: Response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn designing_your_life() -> Value {
    json!({
        "title": "Designing Your Life",
        "author": "Bill Burnett and Dave Evans",
        "isbn": "9781101875322"
    })
}

async fn create(app: &Router, body: Value) -> Value {
    let (status, created) = send(app, json_request(Method::POST, "/books", body)).await;
    assert_eq!(status, StatusCode::CREATED);
    created
}

#[tokio::test]
async fn create_returns_stored_record() {
    let app = memory_app();

    let (status, body) = send(&app, json_request(Method::POST, "/books", designing_your_life())).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["title"], "Designing Your Life");
    assert_eq!(body["author"], "Bill Burnett and Dave Evans");
    assert_eq!(body["isbn"], "9781101875322");
    assert!(body["id"].as_i64().unwrap() > 0);
    assert!(body["created_at"].is_string());
    assert!(body["updated_at"].is_string());
    assert!(body.get("deleted_at").is_none());

    let book: Book = serde_json::from_value(body).unwrap();
    assert_eq!(book.created_at, book.updated_at);
}

#[tokio::test]
async fn create_rejects_missing_title_or_author() {
    let app = memory_app();

    for body in [
        json!({"title": ""}),
        json!({"author": "Paulo Coelho", "isbn": "9780062315007"}),
        json!({"title": "The Alchemist", "isbn": "9780062315007"}),
    ] {
        let (status, error) = send(&app, json_request(Method::POST, "/books", body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error["error"], "Validation failed");
        assert!(!error["details"].as_array().unwrap().is_empty());
    }
}

#[tokio::test]
async fn create_rejects_malformed_isbn() {
    let app = memory_app();

    for isbn in ["007", "12345", "978-1101875322"] {
        let body = json!({"title": "The Alchemist", "author": "Paulo Coelho", "isbn": isbn});
        let (status, error) = send(&app, json_request(Method::POST, "/books", body)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST, "isbn {isbn}");
        assert_eq!(error["details"], json!([{"field": "isbn", "error": "isbn"}]));
    }
}

#[tokio::test]
async fn create_accepts_both_isbn_lengths() {
    let app = memory_app();

    for isbn in ["9780385348876", "0385348878"] {
        let body = json!({"title": "The Martian", "author": "Andy Weir", "isbn": isbn});
        create(&app, body).await;
    }
}

#[tokio::test]
async fn create_rejects_unparseable_bodies() {
    let app = memory_app();

    let malformed = Request::builder()
        .method(Method::POST)
        .uri("/books")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"title\": "))
        .unwrap();
    let (status, error) = send(&app, malformed).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(error["error"].is_string());

    let wrong_type = json_request(Method::POST, "/books", json!({"title": 42}));
    let (status, _) = send(&app, wrong_type).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let no_content_type = Request::builder()
        .method(Method::POST)
        .uri("/books")
        .body(Body::from(designing_your_life().to_string()))
        .unwrap();
    let (status, _) = send(&app, no_content_type).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn list_is_empty_before_any_create() {
    let app = memory_app();

    let (status, body) = send(&app, empty_request(Method::GET, "/books")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn list_returns_every_created_book() {
    let app = memory_app();
    create(&app, designing_your_life()).await;
    create(
        &app,
        json!({"title": "The Alchemist", "author": "Paulo Coelho", "isbn": "9780062315007"}),
    )
    .await;

    let (status, body) = send(&app, empty_request(Method::GET, "/books")).await;

    assert_eq!(status, StatusCode::OK);
    let titles: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|book| book["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles.len(), 2);
    assert!(titles.contains(&"Designing Your Life"));
    assert!(titles.contains(&"The Alchemist"));
}

#[tokio::test]
async fn get_by_id_returns_matching_record() {
    let app = memory_app();
    let created = create(&app, designing_your_life()).await;

    let uri = format!("/books/{}", created["id"]);
    let (status, body) = send(&app, empty_request(Method::GET, &uri)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, created);
}

#[tokio::test]
async fn get_by_unknown_id_is_not_found() {
    let app = memory_app();

    for uri in ["/books/999", "/books/not-a-number"] {
        let (status, body) = send(&app, empty_request(Method::GET, uri)).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
        assert_eq!(body, json!({"error": "Book not found"}));
    }
}

#[tokio::test]
async fn update_merges_body_onto_stored_record() {
    let app = memory_app();
    let created = create(&app, designing_your_life()).await;
    let uri = format!("/books/{}", created["id"]);

    let (status, body) = send(
        &app,
        json_request(Method::PUT, &uri, json!({"title": "Designing Your Work Life"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], created["id"]);
    assert_eq!(body["title"], "Designing Your Work Life");
    assert_eq!(body["author"], "Bill Burnett and Dave Evans");
    assert_eq!(body["isbn"], "9781101875322");
    assert_eq!(body["created_at"], created["created_at"]);

    let (_, fetched) = send(&app, empty_request(Method::GET, &uri)).await;
    assert_eq!(fetched["title"], "Designing Your Work Life");
}

#[tokio::test]
async fn update_with_invalid_fields_is_rejected() {
    let app = memory_app();
    let created = create(&app, designing_your_life()).await;
    let uri = format!("/books/{}", created["id"]);

    let (status, body) = send(&app, json_request(Method::PUT, &uri, json!({"isbn": "00"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({
            "error": "Validation failed",
            "details": [{"field": "isbn", "error": "isbn"}]
        })
    );

    let (status, _) = send(&app, json_request(Method::PUT, &uri, json!({"author": ""}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, fetched) = send(&app, empty_request(Method::GET, &uri)).await;
    assert_eq!(fetched, created);
}

#[tokio::test]
async fn update_of_unknown_id_is_not_found_before_binding() {
    let app = memory_app();

    let garbage = Request::builder()
        .method(Method::PUT)
        .uri("/books/42")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("not json at all"))
        .unwrap();
    let (status, body) = send(&app, garbage).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"error": "Book not found"}));
}

#[tokio::test]
async fn update_with_malformed_body_is_bad_request() {
    let app = memory_app();
    let created = create(&app, designing_your_life()).await;

    let garbage = Request::builder()
        .method(Method::PUT)
        .uri(format!("/books/{}", created["id"]))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{"))
        .unwrap();
    let (status, _) = send(&app, garbage).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn delete_soft_deletes_record() {
    let app = memory_app();
    let created = create(&app, designing_your_life()).await;
    let uri = format!("/books/{}", created["id"]);

    let (status, body) = send(&app, empty_request(Method::DELETE, &uri)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"message": "Book successfully deleted"}));

    let (status, _) = send(&app, empty_request(Method::GET, &uri)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, all) = send(&app, empty_request(Method::GET, "/books")).await;
    assert_eq!(all, json!([]));

    let (status, _) = send(&app, json_request(Method::PUT, &uri, json!({"title": "Back"}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_of_unknown_id_is_not_found() {
    let app = memory_app();
    let created = create(&app, designing_your_life()).await;
    let uri = format!("/books/{}", created["id"]);

    send(&app, empty_request(Method::DELETE, &uri)).await;
    let (status, body) = send(&app, empty_request(Method::DELETE, &uri)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"error": "Book not found"}));

    let (status, _) = send(&app, empty_request(Method::DELETE, "/books/12345")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn responses_carry_request_id() {
    let app = memory_app();

    let request = Request::builder()
        .uri("/books")
        .header("x-request-id", "trace-from-gateway")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.headers()["x-request-id"], "trace-from-gateway");
}

/// Repository whose every call fails like an unreachable database
struct UnavailableRepository;

#[async_trait]
impl BookRepository for UnavailableRepository {
    async fn insert(&self, _book: NewBook) -> RepositoryResult<Book> {
        Err(RepositoryError::Database(sqlx::Error::PoolTimedOut))
    }

    async fn find_all(&self) -> RepositoryResult<Vec<Book>> {
        Err(RepositoryError::Database(sqlx::Error::PoolTimedOut))
    }

    async fn find_by_id(&self, _id: i64) -> RepositoryResult<Option<Book>> {
        Err(RepositoryError::Database(sqlx::Error::PoolTimedOut))
    }

    async fn save(&self, _book: &Book) -> RepositoryResult<Book> {
        Err(RepositoryError::Database(sqlx::Error::PoolTimedOut))
    }

    async fn delete_by_id(&self, _id: i64) -> RepositoryResult<u64> {
        Err(RepositoryError::Database(sqlx::Error::PoolTimedOut))
    }
}

#[tokio::test]
async fn storage_failures_are_internal_errors() {
    let app = build_test_app(Arc::new(UnavailableRepository));

    let requests = [
        json_request(Method::POST, "/books", designing_your_life()),
        empty_request(Method::GET, "/books"),
        empty_request(Method::GET, "/books/1"),
        json_request(Method::PUT, "/books/1", json!({"title": "x"})),
        empty_request(Method::DELETE, "/books/1"),
    ];

    for request in requests {
        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["error"].is_string());
    }
}

#[tokio::test]
async fn invalid_create_never_reaches_storage() {
    let app = build_test_app(Arc::new(UnavailableRepository));

    let (status, _) = send(&app, json_request(Method::POST, "/books", json!({"isbn": "12345"}))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn openapi_document_lists_book_operations() {
    let app = memory_app();

    let (status, document) = send(&app, empty_request(Method::GET, "/api-docs/openapi.json")).await;

    assert_eq!(status, StatusCode::OK);
    let books = &document["paths"]["/books"];
    assert!(books.get("get").is_some());
    assert!(books.get("post").is_some());
    let book = &document["paths"]["/books/{id}"];
    assert!(book.get("get").is_some());
    assert!(book.get("put").is_some());
    assert!(book.get("delete").is_some());
    assert!(document["components"]["schemas"].get("Book").is_some());
}
