use std::fmt;
use std::time::Duration;

use library_kernel::settings::CacheSettings;
use uuid::Uuid;

/// Key namespaces shared by the book and book-request workflows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    /// `book:{id}`
    Book,
    /// `bookrequest:{id}`
    BookRequest,
    /// `bookrequest:book:{title}`, book resolution by title.
    RequestBook,
    /// `bookrequest:requestor:{contact number}`
    RequestRequestor,
}

impl Namespace {
    pub const ALL: [Namespace; 4] = [
        Namespace::Book,
        Namespace::BookRequest,
        Namespace::RequestBook,
        Namespace::RequestRequestor,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Namespace::Book => "book",
            Namespace::BookRequest => "bookrequest",
            Namespace::RequestBook => "bookrequest:book",
            Namespace::RequestRequestor => "bookrequest:requestor",
        }
    }
}

/// A fully qualified cache key, `{namespace}:{suffix}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    namespace: Namespace,
    suffix: String,
}

impl CacheKey {
    pub fn new(namespace: Namespace, suffix: impl Into<String>) -> Self {
        Self {
            namespace,
            suffix: suffix.into(),
        }
    }

    pub fn book(id: Uuid) -> Self {
        Self::new(Namespace::Book, id.to_string())
    }

    pub fn book_request(id: Uuid) -> Self {
        Self::new(Namespace::BookRequest, id.to_string())
    }

    /// Title keys are normalized (trimmed, lowercased) to line up with the
    /// case-insensitive title lookup.
    pub fn request_book(title: &str) -> Self {
        Self::new(Namespace::RequestBook, title.trim().to_lowercase())
    }

    pub fn request_requestor(contact_number: &str) -> Self {
        Self::new(Namespace::RequestRequestor, contact_number)
    }

    pub fn namespace(&self) -> Namespace {
        self.namespace
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace.as_str(), self.suffix)
    }
}

/// Namespace → TTL table consumed by both workflows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TtlPolicy {
    book: Duration,
    book_request: Duration,
    request_book: Duration,
    request_requestor: Duration,
}

impl Default for TtlPolicy {
    fn default() -> Self {
        Self {
            book: Duration::from_secs(5 * 60),
            book_request: Duration::from_secs(5 * 60),
            request_book: Duration::from_secs(10 * 60),
            request_requestor: Duration::from_secs(10 * 60),
        }
    }
}

impl TtlPolicy {
    /// Defaults with any `cache.ttl_seconds` overrides applied.
    pub fn from_settings(settings: &CacheSettings) -> Self {
        let mut policy = Self::default();
        for namespace in Namespace::ALL {
            if let Some(ttl) = settings.ttl_override(namespace.as_str()) {
                policy = policy.with(namespace, ttl);
            }
        }
        policy
    }

    pub fn with(mut self, namespace: Namespace, ttl: Duration) -> Self {
        *self.slot_mut(namespace) = ttl;
        self
    }

    pub fn ttl(&self, namespace: Namespace) -> Duration {
        match namespace {
            Namespace::Book => self.book,
            Namespace::BookRequest => self.book_request,
            Namespace::RequestBook => self.request_book,
            Namespace::RequestRequestor => self.request_requestor,
        }
    }

    fn slot_mut(&mut self, namespace: Namespace) -> &mut Duration {
        match namespace {
            Namespace::Book => &mut self.book,
            Namespace::BookRequest => &mut self.book_request,
            Namespace::RequestBook => &mut self.request_book,
            Namespace::RequestRequestor => &mut self.request_requestor,
        }
    }
}
