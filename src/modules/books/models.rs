use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::{FieldViolation, ServiceError};
use crate::utils::pagination::{PageRequest, DEFAULT_PAGE_SIZE};

/// Shelf status of a book.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, sqlx::Type,
)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "book_status", rename_all = "lowercase")]
pub enum BookStatus {
    #[default]
    None,
    Available,
    Borrowed,
    Lost,
    Reserved,
}

/// A catalogued title.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Book {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub author: String,
    pub isbn: String,
    pub publisher: String,
    pub quantity: i32,
    #[serde(with = "time::serde::rfc3339")]
    pub release_date: OffsetDateTime,
    pub status: BookStatus,
}

/// Payload for creating or replacing a book.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookInput {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub author: String,
    #[serde(default)]
    pub isbn: String,
    #[serde(default)]
    pub publisher: String,
    #[serde(default)]
    pub quantity: i32,
    #[serde(with = "time::serde::rfc3339")]
    pub release_date: OffsetDateTime,
    #[serde(default)]
    pub status: BookStatus,
}

impl BookInput {
    pub fn validate(&self) -> Result<(), ServiceError> {
        let mut violations = Vec::new();
        if self.title.trim().is_empty() {
            violations.push(FieldViolation::new("title", "required"));
        }
        if self.author.trim().is_empty() {
            violations.push(FieldViolation::new("author", "required"));
        }
        if self.quantity < 0 {
            violations.push(FieldViolation::new("quantity", "must not be negative"));
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(ServiceError::invalid_fields("Invalid book data.", violations))
        }
    }

    pub fn into_book(self, id: Uuid) -> Book {
        Book {
            id,
            title: self.title.trim().to_string(),
            description: self.description,
            author: self.author.trim().to_string(),
            isbn: self.isbn.trim().to_string(),
            publisher: self.publisher,
            quantity: self.quantity,
            release_date: self.release_date,
            status: self.status,
        }
    }
}

/// Listing filter; text fields match as case-insensitive substrings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BooksFilter {
    pub page_index: u32,
    pub page_size: u32,
    pub title: Option<String>,
    pub author: Option<String>,
    pub isbn: Option<String>,
    pub status: Option<BookStatus>,
}

impl Default for BooksFilter {
    fn default() -> Self {
        Self {
            page_index: 1,
            page_size: DEFAULT_PAGE_SIZE,
            title: None,
            author: None,
            isbn: None,
            status: None,
        }
    }
}

impl BooksFilter {
    pub fn page(&self) -> PageRequest {
        PageRequest::new(self.page_index, self.page_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn input() -> BookInput {
        BookInput {
            title: " Clean Code ".into(),
            description: String::new(),
            author: "Robert C. Martin".into(),
            isbn: "9780132350884".into(),
            publisher: "Prentice Hall".into(),
            quantity: 3,
            release_date: datetime!(2008-08-01 0:00 UTC),
            status: BookStatus::Available,
        }
    }

    #[test]
    fn blank_title_and_negative_quantity_are_reported_together() {
        let mut bad = input();
        bad.title = "  ".into();
        bad.quantity = -1;

        match bad.validate() {
            Err(ServiceError::Validation { details, .. }) => {
                let fields: Vec<_> = details.iter().map(|d| d.field).collect();
                assert_eq!(fields, vec!["title", "quantity"]);
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn into_book_trims_identity_fields() {
        let id = Uuid::now_v7();
        let book = input().into_book(id);
        assert_eq!(book.id, id);
        assert_eq!(book.title, "Clean Code");
    }

    #[test]
    fn status_uses_lowercase_wire_names() {
        assert_eq!(
            serde_json::to_string(&BookStatus::Reserved).unwrap(),
            "\"reserved\""
        );
        let parsed: BookStatus = serde_json::from_str("\"lost\"").unwrap();
        assert_eq!(parsed, BookStatus::Lost);
    }

    #[test]
    fn filter_defaults_to_first_page_of_ten() {
        let filter = BooksFilter::default();
        assert_eq!(filter.page(), PageRequest::new(1, 10));
    }
}
