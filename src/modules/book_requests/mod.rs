pub mod models;
pub mod repository;
pub mod routes;
pub mod service;

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use library_kernel::{InitCtx, Migration, Module};

use service::BookRequestService;

/// Borrow requests and the people who make them, under `/api/book-requests`.
pub struct BookRequestsModule {
    service: Arc<BookRequestService>,
}

impl BookRequestsModule {
    pub fn new(service: Arc<BookRequestService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl Module for BookRequestsModule {
    fn name(&self) -> &'static str {
        "book-requests"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            "book requests module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        routes::router(self.service.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        let error = |description: &str| {
            serde_json::json!({
                "description": description,
                "content": { "application/json": { "schema": { "$ref": "#/components/schemas/ErrorResponse" } } }
            })
        };
        let record = |description: &str| {
            serde_json::json!({
                "description": description,
                "content": { "application/json": { "schema": { "$ref": "#/components/schemas/BookRequestRecord" } } }
            })
        };
        let id_param = serde_json::json!({
            "name": "id", "in": "path", "required": true,
            "schema": { "type": "string", "format": "uuid" }
        });

        Some(serde_json::json!({
            "paths": {
                "/": {
                    "get": {
                        "summary": "List book requests",
                        "tags": ["Book requests"],
                        "parameters": [
                            { "name": "page_index", "in": "query", "schema": { "type": "integer", "minimum": 1 } },
                            { "name": "page_size", "in": "query", "schema": { "type": "integer", "minimum": 1, "maximum": 100 } },
                            { "name": "requestor_name", "in": "query", "schema": { "type": "string" } },
                            { "name": "book_title", "in": "query", "schema": { "type": "string" } },
                            { "name": "request_date", "in": "query", "schema": { "type": "string", "format": "date" } }
                        ],
                        "responses": {
                            "200": {
                                "description": "One page of requests",
                                "content": { "application/json": { "schema": { "$ref": "#/components/schemas/BookRequestPage" } } }
                            },
                            "500": error("Store failure")
                        }
                    },
                    "post": {
                        "summary": "Request a book by title",
                        "tags": ["Book requests"],
                        "requestBody": {
                            "required": true,
                            "content": { "application/json": { "schema": { "$ref": "#/components/schemas/BookRequestDto" } } }
                        },
                        "responses": {
                            "201": record("Created"),
                            "404": error("Book not found"),
                            "422": error("Validation error")
                        }
                    }
                },
                "/{id}": {
                    "get": {
                        "summary": "Fetch a book request",
                        "tags": ["Book requests"],
                        "parameters": [id_param.clone()],
                        "responses": {
                            "200": {
                                "description": "The request",
                                "content": { "application/json": { "schema": { "$ref": "#/components/schemas/BookRequestDetails" } } }
                            },
                            "404": error("Book request not found")
                        }
                    },
                    "put": {
                        "summary": "Rebind a request to another book",
                        "tags": ["Book requests"],
                        "parameters": [id_param.clone()],
                        "requestBody": {
                            "required": true,
                            "content": { "application/json": { "schema": { "$ref": "#/components/schemas/UpdateBookRequestDto" } } }
                        },
                        "responses": {
                            "200": record("Updated"),
                            "404": error("Book request or book not found"),
                            "422": error("Validation error")
                        }
                    },
                    "delete": {
                        "summary": "Delete a book request",
                        "tags": ["Book requests"],
                        "parameters": [id_param],
                        "responses": {
                            "200": record("Deleted"),
                            "404": error("Book request not found")
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "BookRequestDto": {
                        "type": "object",
                        "properties": {
                            "book_title": { "type": "string" },
                            "first_name": { "type": "string" },
                            "last_name": { "type": "string" },
                            "contact_number": { "type": "string" }
                        },
                        "required": ["book_title", "first_name", "last_name", "contact_number"]
                    },
                    "UpdateBookRequestDto": {
                        "type": "object",
                        "properties": { "book_title": { "type": "string" } },
                        "required": ["book_title"]
                    },
                    "BookRequestor": {
                        "type": "object",
                        "properties": {
                            "id": { "type": "string", "format": "uuid" },
                            "first_name": { "type": "string" },
                            "last_name": { "type": "string" },
                            "contact_number": { "type": "string" }
                        }
                    },
                    "BookRequest": {
                        "type": "object",
                        "properties": {
                            "id": { "type": "string", "format": "uuid" },
                            "book_id": { "type": "string", "format": "uuid" },
                            "book_requestor_id": { "type": "string", "format": "uuid" },
                            "request_date": { "type": "string", "format": "date-time" },
                            "return_date": { "type": "string", "format": "date-time" }
                        }
                    },
                    "BookRequestRecord": {
                        "type": "object",
                        "properties": {
                            "request": { "$ref": "#/components/schemas/BookRequest" },
                            "book": { "$ref": "#/components/schemas/Book" },
                            "requestor": { "$ref": "#/components/schemas/BookRequestor" }
                        }
                    },
                    "BookRequestDetails": {
                        "type": "object",
                        "properties": {
                            "id": { "type": "string", "format": "uuid" },
                            "book_title": { "type": "string" },
                            "author": { "type": "string" },
                            "requestor": { "type": "string" },
                            "contact_number": { "type": "string" },
                            "request_date": { "type": "string", "format": "date-time" },
                            "return_date": { "type": "string", "format": "date-time" }
                        }
                    },
                    "BookRequestPage": {
                        "type": "object",
                        "properties": {
                            "items": { "type": "array", "items": { "$ref": "#/components/schemas/BookRequestDetails" } },
                            "total_count": { "type": "integer" },
                            "total_pages": { "type": "integer" },
                            "page_number": { "type": "integer" },
                            "page_size": { "type": "integer" }
                        }
                    }
                }
            }
        }))
    }

    fn migrations(&self) -> Vec<Migration> {
        vec![Migration {
            id: "001_init",
            up: r#"
                CREATE TABLE book_requestors (
                    id             UUID PRIMARY KEY,
                    first_name     TEXT NOT NULL,
                    last_name      TEXT NOT NULL,
                    contact_number TEXT NOT NULL UNIQUE
                );

                CREATE TABLE book_requests (
                    id                UUID        PRIMARY KEY,
                    book_id           UUID        NOT NULL REFERENCES books (id) ON DELETE CASCADE,
                    book_requestor_id UUID        NOT NULL REFERENCES book_requestors (id) ON DELETE CASCADE,
                    request_date      TIMESTAMPTZ NOT NULL,
                    return_date       TIMESTAMPTZ NOT NULL
                );

                CREATE INDEX book_requests_book_id_idx ON book_requests (book_id);
                CREATE INDEX book_requests_requestor_id_idx ON book_requests (book_requestor_id);
                CREATE INDEX book_requests_request_date_idx ON book_requests (request_date);
                "#,
        }]
    }
}

pub fn create_module(service: Arc<BookRequestService>) -> Arc<dyn Module> {
    Arc::new(BookRequestsModule::new(service))
}
