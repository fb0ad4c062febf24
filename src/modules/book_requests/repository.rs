//! Persistence gateway for book requests and their requestors.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use time::OffsetDateTime;
use uuid::Uuid;

use super::models::{
    BookRequest, BookRequestDetails, BookRequestFilter, BookRequestRecord, BookRequestor,
};
use crate::error::RepoError;
use crate::modules::books::models::{Book, BookStatus};
use crate::utils::pagination::Page;
use crate::utils::{contains_pattern, non_blank};

#[async_trait]
pub trait BookRequestRepository: Send + Sync {
    /// The request joined with its book and requestor.
    async fn find_by_id(&self, id: Uuid) -> Result<Option<BookRequestRecord>, RepoError>;

    async fn list_details(
        &self,
        filter: &BookRequestFilter,
    ) -> Result<Page<BookRequestDetails>, RepoError>;

    async fn insert(&self, request: &BookRequest) -> Result<BookRequest, RepoError>;

    /// `NotFound` when the id is absent.
    async fn update(&self, request: &BookRequest) -> Result<BookRequest, RepoError>;

    /// Returns the removed row; `NotFound` when the id is absent.
    async fn delete(&self, id: Uuid) -> Result<BookRequest, RepoError>;

    /// Ids of every request that references `book_id`.
    async fn ids_for_book(&self, book_id: Uuid) -> Result<Vec<Uuid>, RepoError>;

    async fn find_requestor_by_contact(
        &self,
        contact_number: &str,
    ) -> Result<Option<BookRequestor>, RepoError>;

    /// Insert `requestor` unless one with the same contact number exists, in
    /// which case the stored row is returned unchanged.
    async fn insert_requestor(&self, requestor: &BookRequestor)
        -> Result<BookRequestor, RepoError>;
}

#[derive(sqlx::FromRow)]
struct RecordRow {
    id: Uuid,
    request_date: OffsetDateTime,
    return_date: OffsetDateTime,
    book_id: Uuid,
    book_title: String,
    book_description: String,
    book_author: String,
    book_isbn: String,
    book_publisher: String,
    book_quantity: i32,
    book_release_date: OffsetDateTime,
    book_status: BookStatus,
    requestor_id: Uuid,
    requestor_first_name: String,
    requestor_last_name: String,
    requestor_contact_number: String,
}

impl From<RecordRow> for BookRequestRecord {
    fn from(row: RecordRow) -> Self {
        Self {
            request: BookRequest {
                id: row.id,
                book_id: row.book_id,
                book_requestor_id: row.requestor_id,
                request_date: row.request_date,
                return_date: row.return_date,
            },
            book: Book {
                id: row.book_id,
                title: row.book_title,
                description: row.book_description,
                author: row.book_author,
                isbn: row.book_isbn,
                publisher: row.book_publisher,
                quantity: row.book_quantity,
                release_date: row.book_release_date,
                status: row.book_status,
            },
            requestor: BookRequestor {
                id: row.requestor_id,
                first_name: row.requestor_first_name,
                last_name: row.requestor_last_name,
                contact_number: row.requestor_contact_number,
            },
        }
    }
}

const DETAILS_FROM: &str = " FROM book_requests r \
    JOIN books b ON b.id = r.book_id \
    JOIN book_requestors q ON q.id = r.book_requestor_id \
    WHERE TRUE";

#[derive(Clone)]
pub struct PgBookRequestRepository {
    pool: PgPool,
}

impl PgBookRequestRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &BookRequestFilter) {
        if let Some(title) = non_blank(&filter.book_title) {
            qb.push(" AND b.title ILIKE ").push_bind(contains_pattern(title));
        }
        if let Some(name) = non_blank(&filter.requestor_name) {
            let pattern = contains_pattern(name);
            qb.push(" AND (q.first_name ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR q.last_name ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR (q.first_name || ' ' || q.last_name) ILIKE ")
                .push_bind(pattern)
                .push(")");
        }
        if let Some(day) = filter.request_date {
            qb.push(" AND (r.request_date AT TIME ZONE 'UTC')::date = ")
                .push_bind(day);
        }
    }
}

#[async_trait]
impl BookRequestRepository for PgBookRequestRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<BookRequestRecord>, RepoError> {
        let row = sqlx::query_as::<_, RecordRow>(
            r#"
            SELECT r.id, r.request_date, r.return_date,
                   b.id AS book_id, b.title AS book_title, b.description AS book_description,
                   b.author AS book_author, b.isbn AS book_isbn, b.publisher AS book_publisher,
                   b.quantity AS book_quantity, b.release_date AS book_release_date,
                   b.status AS book_status,
                   q.id AS requestor_id, q.first_name AS requestor_first_name,
                   q.last_name AS requestor_last_name,
                   q.contact_number AS requestor_contact_number
            FROM book_requests r
            JOIN books b ON b.id = r.book_id
            JOIN book_requestors q ON q.id = r.book_requestor_id
            WHERE r.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(BookRequestRecord::from))
    }

    async fn list_details(
        &self,
        filter: &BookRequestFilter,
    ) -> Result<Page<BookRequestDetails>, RepoError> {
        let page = filter.page();

        let mut count_qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*)");
        count_qb.push(DETAILS_FROM);
        Self::push_filters(&mut count_qb, filter);
        let total_count: i64 = count_qb
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;

        let mut items_qb = QueryBuilder::<Postgres>::new(
            "SELECT r.id, b.title AS book_title, b.author, \
             TRIM(q.first_name || ' ' || q.last_name) AS requestor, \
             q.contact_number, r.request_date, r.return_date",
        );
        items_qb.push(DETAILS_FROM);
        Self::push_filters(&mut items_qb, filter);
        items_qb
            .push(" ORDER BY r.request_date DESC, r.id LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());
        let items = items_qb
            .build_query_as::<BookRequestDetails>()
            .fetch_all(&self.pool)
            .await?;

        Ok(Page::new(items, total_count, page))
    }

    async fn insert(&self, request: &BookRequest) -> Result<BookRequest, RepoError> {
        let stored = sqlx::query_as::<_, BookRequest>(
            r#"
            INSERT INTO book_requests (id, book_id, book_requestor_id, request_date, return_date)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, book_id, book_requestor_id, request_date, return_date
            "#,
        )
        .bind(request.id)
        .bind(request.book_id)
        .bind(request.book_requestor_id)
        .bind(request.request_date)
        .bind(request.return_date)
        .fetch_one(&self.pool)
        .await?;

        Ok(stored)
    }

    async fn update(&self, request: &BookRequest) -> Result<BookRequest, RepoError> {
        sqlx::query_as::<_, BookRequest>(
            r#"
            UPDATE book_requests
            SET book_id = $2,
                book_requestor_id = $3,
                request_date = $4,
                return_date = $5
            WHERE id = $1
            RETURNING id, book_id, book_requestor_id, request_date, return_date
            "#,
        )
        .bind(request.id)
        .bind(request.book_id)
        .bind(request.book_requestor_id)
        .bind(request.request_date)
        .bind(request.return_date)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(RepoError::NotFound)
    }

    async fn delete(&self, id: Uuid) -> Result<BookRequest, RepoError> {
        sqlx::query_as::<_, BookRequest>(
            r#"
            DELETE FROM book_requests
            WHERE id = $1
            RETURNING id, book_id, book_requestor_id, request_date, return_date
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(RepoError::NotFound)
    }

    async fn ids_for_book(&self, book_id: Uuid) -> Result<Vec<Uuid>, RepoError> {
        let ids = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT id
            FROM book_requests
            WHERE book_id = $1
            "#,
        )
        .bind(book_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }

    async fn find_requestor_by_contact(
        &self,
        contact_number: &str,
    ) -> Result<Option<BookRequestor>, RepoError> {
        let requestor = sqlx::query_as::<_, BookRequestor>(
            r#"
            SELECT id, first_name, last_name, contact_number
            FROM book_requestors
            WHERE contact_number = $1
            "#,
        )
        .bind(contact_number)
        .fetch_optional(&self.pool)
        .await?;

        Ok(requestor)
    }

    async fn insert_requestor(
        &self,
        requestor: &BookRequestor,
    ) -> Result<BookRequestor, RepoError> {
        // The no-op update makes RETURNING yield the existing row on conflict.
        let stored = sqlx::query_as::<_, BookRequestor>(
            r#"
            INSERT INTO book_requestors (id, first_name, last_name, contact_number)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (contact_number)
            DO UPDATE SET contact_number = EXCLUDED.contact_number
            RETURNING id, first_name, last_name, contact_number
            "#,
        )
        .bind(requestor.id)
        .bind(&requestor.first_name)
        .bind(&requestor.last_name)
        .bind(&requestor.contact_number)
        .fetch_one(&self.pool)
        .await?;

        Ok(stored)
    }
}
