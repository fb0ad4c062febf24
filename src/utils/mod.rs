//! Small helpers shared by the domain modules.

pub mod pagination;

use uuid::Uuid;

use crate::error::ServiceError;

/// Canonical form for case-insensitive title matching.
pub fn normalize_title(title: &str) -> String {
    title.trim().to_lowercase()
}

/// `None` for absent or whitespace-only filter values.
pub fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// `%value%` for ILIKE, with LIKE metacharacters escaped.
pub fn contains_pattern(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len() + 2);
    escaped.push('%');
    for ch in value.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}

/// Case-insensitive substring match, the in-process twin of `ILIKE '%..%'`.
pub fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Reject the nil UUID before any I/O.
pub fn ensure_id(id: Uuid, message: &str) -> Result<Uuid, ServiceError> {
    if id.is_nil() {
        Err(ServiceError::invalid(message))
    } else {
        Ok(id)
    }
}
