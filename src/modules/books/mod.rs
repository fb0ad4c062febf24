pub mod models;
pub mod repository;
pub mod routes;
pub mod service;

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use library_kernel::{InitCtx, Migration, Module};

use service::BookService;

/// Catalogue of books: CRUD over `/api/books`.
pub struct BooksModule {
    service: Arc<BookService>,
}

impl BooksModule {
    pub fn new(service: Arc<BookService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl Module for BooksModule {
    fn name(&self) -> &'static str {
        "books"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            "books module initialized"
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
        let book = |description: &str| {
            serde_json::json!({
                "description": description,
                "content": { "application/json": { "schema": { "$ref": "#/components/schemas/Book" } } }
            })
        };
        let id_param = serde_json::json!({
            "name": "id", "in": "path", "required": true,
            "schema": { "type": "string", "format": "uuid" }
        });
        let input_body = serde_json::json!({
            "required": true,
            "content": { "application/json": { "schema": { "$ref": "#/components/schemas/BookInput" } } }
        });

        Some(serde_json::json!({
            "paths": {
                "/": {
                    "get": {
                        "summary": "List books",
                        "tags": ["Books"],
                        "parameters": [
                            { "name": "page_index", "in": "query", "schema": { "type": "integer", "minimum": 1 } },
                            { "name": "page_size", "in": "query", "schema": { "type": "integer", "minimum": 1, "maximum": 100 } },
                            { "name": "title", "in": "query", "schema": { "type": "string" } },
                            { "name": "author", "in": "query", "schema": { "type": "string" } },
                            { "name": "isbn", "in": "query", "schema": { "type": "string" } },
                            { "name": "status", "in": "query", "schema": { "$ref": "#/components/schemas/BookStatus" } }
                        ],
                        "responses": {
                            "200": {
                                "description": "One page of books",
                                "content": { "application/json": { "schema": { "$ref": "#/components/schemas/BookPage" } } }
                            },
                            "500": error("Store failure")
                        }
                    },
                    "post": {
                        "summary": "Create a book",
                        "tags": ["Books"],
                        "requestBody": input_body.clone(),
                        "responses": {
                            "201": book("Created"),
                            "422": error("Validation error"),
                            "500": error("Store failure")
                        }
                    }
                },
                "/{id}": {
                    "get": {
                        "summary": "Fetch a book",
                        "tags": ["Books"],
                        "parameters": [id_param.clone()],
                        "responses": {
                            "200": book("The book"),
                            "404": error("Book not found"),
                            "422": error("Invalid id")
                        }
                    },
                    "put": {
                        "summary": "Replace a book",
                        "tags": ["Books"],
                        "parameters": [id_param.clone()],
                        "requestBody": input_body,
                        "responses": {
                            "200": book("Updated"),
                            "404": error("Book not found"),
                            "422": error("Validation error")
                        }
                    },
                    "delete": {
                        "summary": "Delete a book",
                        "tags": ["Books"],
                        "parameters": [id_param],
                        "responses": {
                            "200": book("Deleted"),
                            "404": error("Book not found")
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "BookStatus": {
                        "type": "string",
                        "enum": ["none", "available", "borrowed", "lost", "reserved"]
                    },
                    "Book": {
                        "type": "object",
                        "properties": {
                            "id": { "type": "string", "format": "uuid" },
                            "title": { "type": "string" },
                            "description": { "type": "string" },
                            "author": { "type": "string" },
                            "isbn": { "type": "string" },
                            "publisher": { "type": "string" },
                            "quantity": { "type": "integer" },
                            "release_date": { "type": "string", "format": "date-time" },
                            "status": { "$ref": "#/components/schemas/BookStatus" }
                        },
                        "required": ["id", "title", "author", "isbn", "quantity", "release_date", "status"]
                    },
                    "BookInput": {
                        "type": "object",
                        "properties": {
                            "title": { "type": "string" },
                            "description": { "type": "string" },
                            "author": { "type": "string" },
                            "isbn": { "type": "string" },
                            "publisher": { "type": "string" },
                            "quantity": { "type": "integer", "minimum": 0 },
                            "release_date": { "type": "string", "format": "date-time" },
                            "status": { "$ref": "#/components/schemas/BookStatus" }
                        },
                        "required": ["title", "author", "release_date"]
                    },
                    "BookPage": {
                        "type": "object",
                        "properties": {
                            "items": { "type": "array", "items": { "$ref": "#/components/schemas/Book" } },
                            "total_count": { "type": "integer" },
                            "total_pages": { "type": "integer" },
                            "page_number": { "type": "integer" },
                            "page_size": { "type": "integer" }
                        },
                        "required": ["items", "total_count", "total_pages", "page_number", "page_size"]
                    }
                }
            }
        }))
    }

    fn migrations(&self) -> Vec<Migration> {
        vec![Migration {
            id: "001_init",
            up: r#"
                CREATE TYPE book_status AS ENUM ('none', 'available', 'borrowed', 'lost', 'reserved');

                CREATE TABLE books (
                    id           UUID        PRIMARY KEY,
                    title        TEXT        NOT NULL,
                    description  TEXT        NOT NULL DEFAULT '',
                    author       TEXT        NOT NULL,
                    isbn         TEXT        NOT NULL DEFAULT '',
                    publisher    TEXT        NOT NULL DEFAULT '',
                    quantity     INTEGER     NOT NULL DEFAULT 0 CHECK (quantity >= 0),
                    release_date TIMESTAMPTZ NOT NULL,
                    status       book_status NOT NULL DEFAULT 'none'
                );

                CREATE INDEX books_title_lower_idx ON books (LOWER(title));
                "#,
        }]
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module stopped");
        Ok(())
    }
}

pub fn create_module(service: Arc<BookService>) -> Arc<dyn Module> {
    Arc::new(BooksModule::new(service))
}
