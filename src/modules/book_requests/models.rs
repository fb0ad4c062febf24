use serde::{Deserialize, Serialize};
use time::{Date, Duration, OffsetDateTime};
use uuid::Uuid;

use crate::error::{FieldViolation, ServiceError};
use crate::modules::books::models::Book;
use crate::utils::pagination::{PageRequest, DEFAULT_PAGE_SIZE};

/// Borrowing window granted when a request is opened.
pub const LOAN_PERIOD: Duration = Duration::days(7);

/// Someone who asked to borrow a book; resolved by contact number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct BookRequestor {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub contact_number: String,
}

impl BookRequestor {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

/// A persisted borrow request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct BookRequest {
    pub id: Uuid,
    pub book_id: Uuid,
    pub book_requestor_id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub request_date: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub return_date: OffsetDateTime,
}

impl BookRequest {
    /// A new request dated `now`, due back after [`LOAN_PERIOD`].
    pub fn open(id: Uuid, book_id: Uuid, book_requestor_id: Uuid, now: OffsetDateTime) -> Self {
        Self {
            id,
            book_id,
            book_requestor_id,
            request_date: now,
            return_date: now + LOAN_PERIOD,
        }
    }
}

/// A request together with the book and requestor it references.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookRequestRecord {
    pub request: BookRequest,
    pub book: Book,
    pub requestor: BookRequestor,
}

/// Flattened read model returned by `get` and `list`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct BookRequestDetails {
    pub id: Uuid,
    pub book_title: String,
    pub author: String,
    pub requestor: String,
    pub contact_number: String,
    #[serde(with = "time::serde::rfc3339")]
    pub request_date: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub return_date: OffsetDateTime,
}

impl From<&BookRequestRecord> for BookRequestDetails {
    fn from(record: &BookRequestRecord) -> Self {
        Self {
            id: record.request.id,
            book_title: record.book.title.clone(),
            author: record.book.author.clone(),
            requestor: record.requestor.full_name(),
            contact_number: record.requestor.contact_number.clone(),
            request_date: record.request.request_date,
            return_date: record.request.return_date,
        }
    }
}

/// Inbound request to borrow a book by title.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookRequestDto {
    pub book_title: String,
    pub first_name: String,
    pub last_name: String,
    pub contact_number: String,
}

impl BookRequestDto {
    pub fn validate(&self) -> Result<(), ServiceError> {
        let required = [
            ("book_title", &self.book_title),
            ("first_name", &self.first_name),
            ("last_name", &self.last_name),
            ("contact_number", &self.contact_number),
        ];
        let violations: Vec<_> = required
            .iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|&(field, _)| FieldViolation::new(field, "required"))
            .collect();

        if violations.is_empty() {
            Ok(())
        } else {
            Err(ServiceError::invalid_fields(
                "Invalid book request data.",
                violations,
            ))
        }
    }

    pub fn new_requestor(&self, id: Uuid) -> BookRequestor {
        BookRequestor {
            id,
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            contact_number: self.contact_number.clone(),
        }
    }
}

/// Rebinds an existing request to another book.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateBookRequestDto {
    pub book_title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BookRequestFilter {
    pub page_index: u32,
    pub page_size: u32,
    /// Substring of the requestor's first, last or full name.
    pub requestor_name: Option<String>,
    /// Substring of the book title.
    pub book_title: Option<String>,
    /// Calendar day (UTC) the request was opened.
    pub request_date: Option<Date>,
}

impl Default for BookRequestFilter {
    fn default() -> Self {
        Self {
            page_index: 1,
            page_size: DEFAULT_PAGE_SIZE,
            requestor_name: None,
            book_title: None,
            request_date: None,
        }
    }
}

impl BookRequestFilter {
    pub fn page(&self) -> PageRequest {
        PageRequest::new(self.page_index, self.page_size)
    }
}
