//! Book workflow: CRUD with cache-aside reads on `book:{id}`.

use std::sync::Arc;

use library_cache::{Cache, CacheKey};
use uuid::Uuid;

use super::models::{Book, BookInput, BooksFilter};
use super::repository::BookRepository;
use crate::modules::book_requests::repository::BookRequestRepository;
use crate::error::{RepoError, ServiceError, ServiceResult};
use crate::utils::ensure_id;
use crate::utils::pagination::Page;

const NOT_FOUND: &str = "Book not found.";
const INVALID_ID: &str = "Invalid book ID.";

#[derive(Clone)]
pub struct BookService {
    books: Arc<dyn BookRepository>,
    requests: Arc<dyn BookRequestRepository>,
    cache: Cache,
}

impl BookService {
    pub fn new(
        books: Arc<dyn BookRepository>,
        requests: Arc<dyn BookRequestRepository>,
        cache: Cache,
    ) -> Self {
        Self {
            books,
            requests,
            cache,
        }
    }

    pub async fn add(&self, input: BookInput) -> ServiceResult<Book> {
        input.validate()?;
        let book = input.into_book(Uuid::now_v7());

        let stored = self.books.insert(&book).await.map_err(store_error)?;
        self.cache.remove(&CacheKey::book(stored.id)).await;

        tracing::info!(book_id = %stored.id, title = %stored.title, "book added");
        Ok(stored)
    }

    pub async fn update(&self, id: Uuid, input: BookInput) -> ServiceResult<Book> {
        let id = ensure_id(id, INVALID_ID)?;
        input.validate()?;

        let existing = self
            .books
            .find_by_id(id)
            .await
            .map_err(store_error)?
            .ok_or_else(|| RepoError::NotFound.into_service(NOT_FOUND))?;

        let updated = self
            .books
            .update(&input.into_book(id))
            .await
            .map_err(store_error)?;

        self.cache.remove(&CacheKey::book(id)).await;
        self.cache
            .remove(&CacheKey::request_book(&existing.title))
            .await;
        if CacheKey::request_book(&updated.title) != CacheKey::request_book(&existing.title) {
            self.cache
                .remove(&CacheKey::request_book(&updated.title))
                .await;
        }
        // Cached request details embed the book's title and author.
        let request_ids = self.requests.ids_for_book(id).await.map_err(store_error)?;
        self.forget_requests(&request_ids).await;

        tracing::info!(book_id = %id, "book updated");
        Ok(updated)
    }

    pub async fn delete(&self, id: Uuid) -> ServiceResult<Book> {
        let id = ensure_id(id, INVALID_ID)?;

        // Collected first: the delete cascades to these rows.
        let request_ids = self.requests.ids_for_book(id).await.map_err(store_error)?;

        let removed = self
            .books
            .delete(id)
            .await
            .map_err(store_error)?;

        self.cache.remove(&CacheKey::book(id)).await;
        self.cache
            .remove(&CacheKey::request_book(&removed.title))
            .await;
        self.forget_requests(&request_ids).await;

        tracing::info!(
            book_id = %id,
            cascaded_requests = request_ids.len(),
            "book deleted"
        );
        Ok(removed)
    }

    pub async fn get(&self, id: Uuid) -> ServiceResult<Book> {
        let id = ensure_id(id, INVALID_ID)?;
        let key = CacheKey::book(id);

        if let Some(book) = self.cache.get::<Book>(&key).await {
            return Ok(book);
        }

        let book = self
            .books
            .find_by_id(id)
            .await
            .map_err(store_error)?
            .ok_or_else(|| RepoError::NotFound.into_service(NOT_FOUND))?;

        self.cache.set(&key, &book).await;
        Ok(book)
    }

    pub async fn list(&self, filter: BooksFilter) -> ServiceResult<Page<Book>> {
        self.books.list(&filter).await.map_err(store_error)
    }

    async fn forget_requests(&self, request_ids: &[Uuid]) {
        for request_id in request_ids {
            self.cache.remove(&CacheKey::book_request(*request_id)).await;
        }
    }
}

fn store_error(err: RepoError) -> ServiceError {
    if let RepoError::Persistence(message) = &err {
        tracing::error!(error = %message, "book store failure");
    }
    err.into_service(NOT_FOUND)
}
