//! HTTP handlers for `/api/book-requests`.

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

use super::models::{
    BookRequestDetails, BookRequestDto, BookRequestFilter, BookRequestRecord,
    UpdateBookRequestDto,
};
use super::service::BookRequestService;
use crate::utils::pagination::Page;

pub fn router(service: Arc<BookRequestService>) -> Router {
    Router::new()
        .route("/", get(list_requests).post(create_request))
        .route(
            "/{id}",
            get(get_request).put(update_request).delete(delete_request),
        )
        .with_state(service)
}

async fn list_requests(
    State(service): State<Arc<BookRequestService>>,
    query: Result<Query<BookRequestFilter>, QueryRejection>,
) -> Result<Json<Page<BookRequestDetails>>, AppError> {
    let Query(filter) = query?;
    Ok(Json(service.list(filter).await?))
}

async fn create_request(
    State(service): State<Arc<BookRequestService>>,
    body: Result<Json<BookRequestDto>, JsonRejection>,
) -> Result<(StatusCode, Json<BookRequestRecord>), AppError> {
    let Json(dto) = body?;
    let record = service.add(dto).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

async fn get_request(
    State(service): State<Arc<BookRequestService>>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<BookRequestDetails>, AppError> {
    let Path(id) = path?;
    Ok(Json(service.get(id).await?))
}

async fn update_request(
    State(service): State<Arc<BookRequestService>>,
    path: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<UpdateBookRequestDto>, JsonRejection>,
) -> Result<Json<BookRequestRecord>, AppError> {
    let Path(id) = path?;
    let Json(dto) = body?;
    Ok(Json(service.update(id, dto).await?))
}

async fn delete_request(
    State(service): State<Arc<BookRequestService>>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<BookRequestRecord>, AppError> {
    let Path(id) = path?;
    Ok(Json(service.delete(id).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{book, request_dto, InMemoryBookRequests, InMemoryBooks};
    use axum::body::Body;
    use axum::http::{header, Request};
    use http_body_util::BodyExt;
    use library_cache::Cache;
    use tower::ServiceExt;

    fn app(books: Arc<InMemoryBooks>) -> Router {
        let requests = InMemoryBookRequests::new(books.clone());
        router(Arc::new(BookRequestService::new(
            requests,
            books,
            Cache::in_memory(),
        )))
    }

    async fn json(response: axum::response::Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn send(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn create_then_fetch_details() {
        let app = app(InMemoryBooks::with([book("Clean Code")]));

        let created = app
            .clone()
            .oneshot(send(
                "POST",
                "/",
                serde_json::to_value(request_dto("Clean Code", "555-0100")).unwrap(),
            ))
            .await
            .unwrap();
        assert_eq!(created.status(), StatusCode::CREATED);
        let id = json(created).await["request"]["id"]
            .as_str()
            .unwrap()
            .to_string();

        let fetched = app
            .oneshot(Request::get(format!("/{id}")).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(fetched.status(), StatusCode::OK);
        let details = json(fetched).await;
        assert_eq!(details["book_title"], "Clean Code");
        assert_eq!(details["requestor"], "Jane Doe");
        assert_eq!(details["contact_number"], "555-0100");
    }

    #[tokio::test]
    async fn unknown_title_is_404() {
        let response = app(InMemoryBooks::with([]))
            .oneshot(send(
                "POST",
                "/",
                serde_json::to_value(request_dto("Dune", "555-0100")).unwrap(),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(json(response).await["error"]["message"], "Book not found.");
    }

    #[tokio::test]
    async fn nil_id_is_422() {
        let response = app(InMemoryBooks::with([]))
            .oneshot(send(
                "PUT",
                &format!("/{}", Uuid::nil()),
                serde_json::json!({ "book_title": "Clean Code" }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            json(response).await["error"]["message"],
            "Invalid book request ID."
        );
    }

    #[tokio::test]
    async fn list_returns_an_empty_page() {
        let response = app(InMemoryBooks::with([]))
            .oneshot(
                Request::get("/?request_date=2024-05-01")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json(response).await;
        assert_eq!(body["total_count"], 0);
        assert_eq!(body["total_pages"], 0);
        assert_eq!(body["page_number"], 1);
    }
}
