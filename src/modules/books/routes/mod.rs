//! HTTP handlers for `/api/books`.

use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    routing::get,
    Json, Router,
};
use library_http::AppError;
use uuid::Uuid;

use super::models::{Book, BookInput, BooksFilter};
use super::service::BookService;
use crate::utils::pagination::Page;

pub fn router(service: Arc<BookService>) -> Router {
    Router::new()
        .route("/", get(list_books).post(create_book))
        .route(
            "/{id}",
            get(get_book).put(update_book).delete(delete_book),
        )
        .with_state(service)
}

async fn list_books(
    State(service): State<Arc<BookService>>,
    query: Result<Query<BooksFilter>, QueryRejection>,
) -> Result<Json<Page<Book>>, AppError> {
    let Query(filter) = query?;
    Ok(Json(service.list(filter).await?))
}

async fn create_book(
    State(service): State<Arc<BookService>>,
    body: Result<Json<BookInput>, JsonRejection>,
) -> Result<(StatusCode, Json<Book>), AppError> {
    let Json(input) = body?;
    let book = service.add(input).await?;
    Ok((StatusCode::CREATED, Json(book)))
}

async fn get_book(
    State(service): State<Arc<BookService>>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Book>, AppError> {
    let Path(id) = path?;
    Ok(Json(service.get(id).await?))
}

async fn update_book(
    State(service): State<Arc<BookService>>,
    path: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<BookInput>, JsonRejection>,
) -> Result<Json<Book>, AppError> {
    let Path(id) = path?;
    let Json(input) = body?;
    Ok(Json(service.update(id, input).await?))
}

async fn delete_book(
    State(service): State<Arc<BookService>>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Book>, AppError> {
    let Path(id) = path?;
    Ok(Json(service.delete(id).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{book, book_input, InMemoryBookRequests, InMemoryBooks};
    use axum::body::Body;
    use axum::http::{header, Request};
    use http_body_util::BodyExt;
    use library_cache::Cache;
    use tower::ServiceExt;

    fn app(books: Arc<InMemoryBooks>) -> Router {
        let requests = InMemoryBookRequests::new(books.clone());
        router(Arc::new(BookService::new(
            books,
            requests,
            Cache::in_memory(),
        )))
    }

    async fn json(response: axum::response::Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post(uri: &str, body: &impl serde::Serialize) -> Request<Body> {
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(body).unwrap()))
            .unwrap()
    }

    #[tokio::test]
    async fn create_returns_201_with_the_stored_book() {
        let books = InMemoryBooks::with([]);

        let response = app(books.clone())
            .oneshot(post("/", &book_input("Clean Code")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        let body = json(response).await;
        assert_eq!(body["title"], "Clean Code");
        assert_eq!(body["status"], "available");
        assert_eq!(books.len(), 1);
    }

    #[tokio::test]
    async fn blank_title_is_422_with_field_details() {
        let response = app(InMemoryBooks::with([]))
            .oneshot(post("/", &book_input("   ")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = json(response).await;
        assert_eq!(body["error"]["message"], "Invalid book data.");
        assert_eq!(body["error"]["details"][0]["field"], "title");
    }

    #[tokio::test]
    async fn unknown_book_is_404() {
        let uri = format!("/{}", Uuid::now_v7());
        let response = app(InMemoryBooks::with([]))
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(json(response).await["error"]["code"], "not_found");
    }

    #[tokio::test]
    async fn list_applies_query_filters() {
        let books = InMemoryBooks::with([book("Clean Code"), book("Refactoring")]);

        let response = app(books)
            .oneshot(
                Request::get("/?title=code&page_size=5")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json(response).await;
        assert_eq!(body["total_count"], 1);
        assert_eq!(body["page_size"], 5);
        assert_eq!(body["items"][0]["title"], "Clean Code");
    }

    #[tokio::test]
    async fn malformed_id_and_query_share_the_error_envelope() {
        let app = app(InMemoryBooks::with([]));

        let response = app
            .clone()
            .oneshot(Request::get("/not-a-uuid").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json(response).await["error"]["code"], "bad_request");

        let response = app
            .oneshot(
                Request::get("/?status=misplaced")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json(response).await["error"]["code"], "bad_request");
    }

    #[tokio::test]
    async fn delete_returns_the_removed_book() {
        let stored = book("Refactoring");
        let books = InMemoryBooks::with([stored.clone()]);

        let response = app(books.clone())
            .oneshot(
                Request::delete(format!("/{}", stored.id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json(response).await["id"], stored.id.to_string());
        assert_eq!(books.len(), 0);
    }
}
