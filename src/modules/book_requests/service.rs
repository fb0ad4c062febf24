//! Request workflow.
//!
//! Adding a request resolves the book by title and the requestor by contact
//! number, both cache-aside, before anything is written. Every mutation
//! invalidates `bookrequest:{id}` after the store write succeeds.

use std::sync::Arc;

use library_cache::{Cache, CacheKey};
use time::OffsetDateTime;
use uuid::Uuid;

use super::models::{
    BookRequest, BookRequestDetails, BookRequestDto, BookRequestFilter, BookRequestRecord,
    BookRequestor, UpdateBookRequestDto,
};
use super::repository::BookRequestRepository;
use crate::error::{FieldViolation, RepoError, ServiceError, ServiceResult};
use crate::modules::books::models::Book;
use crate::modules::books::repository::BookRepository;
use crate::utils::ensure_id;
use crate::utils::pagination::Page;

const NOT_FOUND: &str = "Book request not found.";
const BOOK_NOT_FOUND: &str = "Book not found.";
const INVALID_ID: &str = "Invalid book request ID.";

#[derive(Clone)]
pub struct BookRequestService {
    requests: Arc<dyn BookRequestRepository>,
    books: Arc<dyn BookRepository>,
    cache: Cache,
}

impl BookRequestService {
    pub fn new(
        requests: Arc<dyn BookRequestRepository>,
        books: Arc<dyn BookRepository>,
        cache: Cache,
    ) -> Self {
        Self {
            requests,
            books,
            cache,
        }
    }

    pub async fn add(&self, dto: BookRequestDto) -> ServiceResult<BookRequestRecord> {
        dto.validate()?;

        let book = self.resolve_book(&dto.book_title).await?;
        let requestor = self.resolve_requestor(&dto).await?;

        let request = BookRequest::open(
            Uuid::now_v7(),
            book.id,
            requestor.id,
            OffsetDateTime::now_utc(),
        );
        let stored = self.requests.insert(&request).await.map_err(store_error)?;
        self.cache.remove(&CacheKey::book_request(stored.id)).await;

        tracing::info!(
            request_id = %stored.id,
            book_id = %book.id,
            requestor_id = %requestor.id,
            return_date = %stored.return_date,
            "book request added"
        );
        Ok(BookRequestRecord {
            request: stored,
            book,
            requestor,
        })
    }

    pub async fn update(
        &self,
        id: Uuid,
        dto: UpdateBookRequestDto,
    ) -> ServiceResult<BookRequestRecord> {
        let id = ensure_id(id, INVALID_ID)?;
        if dto.book_title.trim().is_empty() {
            return Err(ServiceError::invalid_fields(
                "Invalid book request data.",
                vec![FieldViolation::new("book_title", "required")],
            ));
        }

        let existing = self.load(id).await?;

        // Straight to the store: a rebind should not trust a cached title.
        let book = self
            .books
            .find_by_title(&dto.book_title)
            .await
            .map_err(store_error)?
            .ok_or_else(|| ServiceError::NotFound(BOOK_NOT_FOUND.to_string()))?;

        let request = BookRequest {
            book_id: book.id,
            ..existing.request
        };
        let updated = self.requests.update(&request).await.map_err(store_error)?;
        self.cache.remove(&CacheKey::book_request(id)).await;

        tracing::info!(request_id = %id, book_id = %book.id, "book request updated");
        Ok(BookRequestRecord {
            request: updated,
            book,
            requestor: existing.requestor,
        })
    }

    pub async fn delete(&self, id: Uuid) -> ServiceResult<BookRequestRecord> {
        let id = ensure_id(id, INVALID_ID)?;
        let existing = self.load(id).await?;

        let removed = self.requests.delete(id).await.map_err(store_error)?;
        self.cache.remove(&CacheKey::book_request(id)).await;

        tracing::info!(request_id = %id, "book request deleted");
        Ok(BookRequestRecord {
            request: removed,
            ..existing
        })
    }

    pub async fn get(&self, id: Uuid) -> ServiceResult<BookRequestDetails> {
        let id = ensure_id(id, INVALID_ID)?;
        let key = CacheKey::book_request(id);

        if let Some(record) = self.cache.get::<BookRequestRecord>(&key).await {
            return Ok(BookRequestDetails::from(&record));
        }

        let record = self.load(id).await?;
        self.cache.set(&key, &record).await;
        Ok(BookRequestDetails::from(&record))
    }

    pub async fn list(&self, filter: BookRequestFilter) -> ServiceResult<Page<BookRequestDetails>> {
        self.requests.list_details(&filter).await.map_err(store_error)
    }

    async fn load(&self, id: Uuid) -> ServiceResult<BookRequestRecord> {
        self.requests
            .find_by_id(id)
            .await
            .map_err(store_error)?
            .ok_or_else(|| ServiceError::NotFound(NOT_FOUND.to_string()))
    }

    async fn resolve_book(&self, title: &str) -> ServiceResult<Book> {
        let key = CacheKey::request_book(title);
        if let Some(book) = self.cache.get::<Book>(&key).await {
            return Ok(book);
        }

        let book = self
            .books
            .find_by_title(title)
            .await
            .map_err(store_error)?
            .ok_or_else(|| ServiceError::NotFound(BOOK_NOT_FOUND.to_string()))?;

        self.cache.set(&key, &book).await;
        Ok(book)
    }

    async fn resolve_requestor(&self, dto: &BookRequestDto) -> ServiceResult<BookRequestor> {
        let key = CacheKey::request_requestor(&dto.contact_number);
        if let Some(requestor) = self.cache.get::<BookRequestor>(&key).await {
            return Ok(requestor);
        }

        let existing = self
            .requests
            .find_requestor_by_contact(&dto.contact_number)
            .await
            .map_err(store_error)?;

        let requestor = match existing {
            Some(requestor) => requestor,
            None => {
                let created = self
                    .requests
                    .insert_requestor(&dto.new_requestor(Uuid::now_v7()))
                    .await
                    .map_err(store_error)?;
                tracing::info!(requestor_id = %created.id, "book requestor registered");
                created
            }
        };

        self.cache.set(&key, &requestor).await;
        Ok(requestor)
    }
}

fn store_error(err: RepoError) -> ServiceError {
    if let RepoError::Persistence(message) = &err {
        tracing::error!(error = %message, "book request store failure");
    }
    err.into_service(NOT_FOUND)
}
