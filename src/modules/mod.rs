pub mod book_requests;
pub mod books;

use std::sync::Arc;

use library_cache::Cache;
use library_kernel::ModuleRegistry;
use sqlx::PgPool;

use book_requests::repository::{BookRequestRepository, PgBookRequestRepository};
use book_requests::service::BookRequestService;
use books::repository::{BookRepository, PgBookRepository};
use books::service::BookService;

/// Shared collaborators handed to every domain module.
#[derive(Clone)]
pub struct ModuleDeps {
    pub books: Arc<dyn BookRepository>,
    pub requests: Arc<dyn BookRequestRepository>,
    pub cache: Cache,
}

impl ModuleDeps {
    pub fn postgres(pool: PgPool, cache: Cache) -> Self {
        Self {
            books: Arc::new(PgBookRepository::new(pool.clone())),
            requests: Arc::new(PgBookRequestRepository::new(pool)),
            cache,
        }
    }
}

/// Register the domain modules. `books` goes first: its migration creates
/// the table `book-requests` references.
pub fn register_all(registry: &mut ModuleRegistry, deps: &ModuleDeps) {
    let book_service = Arc::new(BookService::new(
        deps.books.clone(),
        deps.requests.clone(),
        deps.cache.clone(),
    ));
    let request_service = Arc::new(BookRequestService::new(
        deps.requests.clone(),
        deps.books.clone(),
        deps.cache.clone(),
    ));

    registry.register_custom(books::create_module(book_service));
    registry.register_custom(book_requests::create_module(request_service));
}
