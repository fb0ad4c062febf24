//! Error types at the persistence and workflow boundaries.

use library_http::AppError;
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

/// Failure reported by a repository.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("record not found")]
    NotFound,
    #[error("persistence error: {0}")]
    Persistence(String),
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }

    /// Lift into the workflow taxonomy, naming the missing entity.
    pub fn into_service(self, not_found: &str) -> ServiceError {
        match self {
            RepoError::NotFound => ServiceError::NotFound(not_found.to_string()),
            RepoError::Persistence(message) => ServiceError::Store(message),
        }
    }
}

impl From<sqlx::Error> for RepoError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => RepoError::NotFound,
            other => RepoError::from_persistence(other),
        }
    }
}

/// A single rejected input field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldViolation {
    pub field: &'static str,
    pub error: &'static str,
}

impl FieldViolation {
    pub fn new(field: &'static str, error: &'static str) -> Self {
        Self { field, error }
    }
}

/// Outcome of a failed workflow call. Nothing else escapes a workflow.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Rejected before any I/O.
    #[error("{message}")]
    Validation {
        message: String,
        details: Vec<FieldViolation>,
    },
    #[error("{0}")]
    NotFound(String),
    /// The store failed; carries the underlying message.
    #[error("{0}")]
    Store(String),
}

impl ServiceError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            details: Vec::new(),
        }
    }

    pub fn invalid_fields(message: impl Into<String>, details: Vec<FieldViolation>) -> Self {
        Self::Validation {
            message: message.into(),
            details,
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Validation { message, details } => AppError::validation(
                details
                    .into_iter()
                    .map(|d| json!({ "field": d.field, "error": d.error }))
                    .collect(),
                message,
            ),
            ServiceError::NotFound(message) => AppError::not_found(message),
            ServiceError::Store(message) => AppError::Internal(anyhow::anyhow!(message)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn repo_errors_map_to_service_taxonomy() {
        assert!(matches!(
            RepoError::NotFound.into_service("Book not found."),
            ServiceError::NotFound(message) if message == "Book not found."
        ));
        assert!(matches!(
            RepoError::from_persistence("connection reset").into_service("Book not found."),
            ServiceError::Store(message) if message == "connection reset"
        ));
    }

    #[test]
    fn row_not_found_is_not_found() {
        assert!(matches!(
            RepoError::from(sqlx::Error::RowNotFound),
            RepoError::NotFound
        ));
    }

    #[test]
    fn service_errors_map_to_http_status() {
        let validation: AppError = ServiceError::invalid_fields(
            "Invalid book data.",
            vec![FieldViolation::new("title", "required")],
        )
        .into();
        assert_eq!(validation.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let missing: AppError = ServiceError::NotFound("Book not found.".into()).into();
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);

        let store: AppError = ServiceError::Store("disk full".into()).into();
        assert_eq!(store.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
