//! Persistence gateway for books.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::models::{Book, BooksFilter};
use crate::error::RepoError;
use crate::utils::pagination::Page;
use crate::utils::{contains_pattern, non_blank};

#[async_trait]
pub trait BookRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Book>, RepoError>;

    /// Exact title match ignoring case and surrounding whitespace.
    async fn find_by_title(&self, title: &str) -> Result<Option<Book>, RepoError>;

    async fn list(&self, filter: &BooksFilter) -> Result<Page<Book>, RepoError>;

    async fn insert(&self, book: &Book) -> Result<Book, RepoError>;

    /// Replaces every column; `NotFound` when the id is absent.
    async fn update(&self, book: &Book) -> Result<Book, RepoError>;

    /// Returns the removed row; `NotFound` when the id is absent.
    async fn delete(&self, id: Uuid) -> Result<Book, RepoError>;
}

#[derive(Clone)]
pub struct PgBookRepository {
    pool: PgPool,
}

impl PgBookRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &BooksFilter) {
        if let Some(title) = non_blank(&filter.title) {
            qb.push(" AND title ILIKE ").push_bind(contains_pattern(title));
        }
        if let Some(author) = non_blank(&filter.author) {
            qb.push(" AND author ILIKE ").push_bind(contains_pattern(author));
        }
        if let Some(isbn) = non_blank(&filter.isbn) {
            qb.push(" AND isbn ILIKE ").push_bind(contains_pattern(isbn));
        }
        if let Some(status) = filter.status {
            qb.push(" AND status = ").push_bind(status);
        }
    }
}

#[async_trait]
impl BookRepository for PgBookRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Book>, RepoError> {
        let book = sqlx::query_as::<_, Book>(
            r#"
            SELECT id, title, description, author, isbn, publisher, quantity, release_date, status
            FROM books
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(book)
    }

    async fn find_by_title(&self, title: &str) -> Result<Option<Book>, RepoError> {
        let book = sqlx::query_as::<_, Book>(
            r#"
            SELECT id, title, description, author, isbn, publisher, quantity, release_date, status
            FROM books
            WHERE LOWER(title) = LOWER($1)
            ORDER BY id
            LIMIT 1
            "#,
        )
        .bind(title.trim())
        .fetch_optional(&self.pool)
        .await?;

        Ok(book)
    }

    async fn list(&self, filter: &BooksFilter) -> Result<Page<Book>, RepoError> {
        let page = filter.page();

        let mut count_qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM books WHERE TRUE");
        Self::push_filters(&mut count_qb, filter);
        let total_count: i64 = count_qb
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;

        let mut items_qb = QueryBuilder::<Postgres>::new(
            "SELECT id, title, description, author, isbn, publisher, quantity, release_date, status \
             FROM books WHERE TRUE",
        );
        Self::push_filters(&mut items_qb, filter);
        items_qb
            .push(" ORDER BY title, id LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());
        let items = items_qb
            .build_query_as::<Book>()
            .fetch_all(&self.pool)
            .await?;

        Ok(Page::new(items, total_count, page))
    }

    async fn insert(&self, book: &Book) -> Result<Book, RepoError> {
        let stored = sqlx::query_as::<_, Book>(
            r#"
            INSERT INTO books (id, title, description, author, isbn, publisher, quantity, release_date, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id, title, description, author, isbn, publisher, quantity, release_date, status
            "#,
        )
        .bind(book.id)
        .bind(&book.title)
        .bind(&book.description)
        .bind(&book.author)
        .bind(&book.isbn)
        .bind(&book.publisher)
        .bind(book.quantity)
        .bind(book.release_date)
        .bind(book.status)
        .fetch_one(&self.pool)
        .await?;

        Ok(stored)
    }

    async fn update(&self, book: &Book) -> Result<Book, RepoError> {
        sqlx::query_as::<_, Book>(
            r#"
            UPDATE books
            SET title = $2,
                description = $3,
                author = $4,
                isbn = $5,
                publisher = $6,
                quantity = $7,
                release_date = $8,
                status = $9
            WHERE id = $1
            RETURNING id, title, description, author, isbn, publisher, quantity, release_date, status
            "#,
        )
        .bind(book.id)
        .bind(&book.title)
        .bind(&book.description)
        .bind(&book.author)
        .bind(&book.isbn)
        .bind(&book.publisher)
        .bind(book.quantity)
        .bind(book.release_date)
        .bind(book.status)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(RepoError::NotFound)
    }

    async fn delete(&self, id: Uuid) -> Result<Book, RepoError> {
        sqlx::query_as::<_, Book>(
            r#"
            DELETE FROM books
            WHERE id = $1
            RETURNING id, title, description, author, isbn, publisher, quantity, release_date, status
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(RepoError::NotFound)
    }
}
