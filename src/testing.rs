//! In-memory doubles for the repositories and a cache store that records
//! traffic, shared by the workflow and handler tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use library_cache::{Cache, CacheResult, CacheStore, InMemoryStore, TtlPolicy};
use time::macros::datetime;
use uuid::Uuid;

use crate::error::RepoError;
use crate::modules::book_requests::models::{
    BookRequest, BookRequestDetails, BookRequestDto, BookRequestFilter, BookRequestRecord,
    BookRequestor,
};
use crate::modules::book_requests::repository::BookRequestRepository;
use crate::modules::books::models::{Book, BookInput, BookStatus, BooksFilter};
use crate::modules::books::repository::BookRepository;
use crate::utils::pagination::Page;
use crate::utils::{contains_ci, non_blank, normalize_title};

#[derive(Default)]
pub struct Calls {
    pub finds: AtomicUsize,
    pub inserts: AtomicUsize,
    pub updates: AtomicUsize,
    pub deletes: AtomicUsize,
}

impl Calls {
    fn bump(counter: &AtomicUsize) {
        counter.fetch_add(1, Ordering::SeqCst);
    }

    pub fn finds(&self) -> usize {
        self.finds.load(Ordering::SeqCst)
    }

    pub fn inserts(&self) -> usize {
        self.inserts.load(Ordering::SeqCst)
    }

    pub fn updates(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }

    pub fn deletes(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }

    pub fn writes(&self) -> usize {
        self.inserts() + self.updates() + self.deletes()
    }
}

#[derive(Default)]
pub struct InMemoryBooks {
    rows: Mutex<HashMap<Uuid, Book>>,
    failing: AtomicBool,
    pub calls: Calls,
}

impl InMemoryBooks {
    pub fn with(books: impl IntoIterator<Item = Book>) -> Arc<Self> {
        let repo = Self::default();
        {
            let mut rows = repo.rows.lock().unwrap();
            for book in books {
                rows.insert(book.id, book);
            }
        }
        Arc::new(repo)
    }

    /// Every later call fails with a persistence error.
    pub fn fail(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }

    pub fn snapshot(&self, id: Uuid) -> Option<Book> {
        self.rows.lock().unwrap().get(&id).cloned()
    }

    pub fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    fn check(&self) -> Result<(), RepoError> {
        if self.failing.load(Ordering::SeqCst) {
            Err(RepoError::from_persistence("connection reset by peer"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl BookRepository for InMemoryBooks {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Book>, RepoError> {
        Calls::bump(&self.calls.finds);
        self.check()?;
        Ok(self.snapshot(id))
    }

    async fn find_by_title(&self, title: &str) -> Result<Option<Book>, RepoError> {
        Calls::bump(&self.calls.finds);
        self.check()?;
        let wanted = normalize_title(title);
        let rows = self.rows.lock().unwrap();
        let mut matches: Vec<_> = rows
            .values()
            .filter(|book| normalize_title(&book.title) == wanted)
            .cloned()
            .collect();
        matches.sort_by_key(|book| book.id);
        Ok(matches.into_iter().next())
    }

    async fn list(&self, filter: &BooksFilter) -> Result<Page<Book>, RepoError> {
        self.check()?;
        let rows = self.rows.lock().unwrap();
        let mut books: Vec<_> = rows
            .values()
            .filter(|book| non_blank(&filter.title).is_none_or(|t| contains_ci(&book.title, t)))
            .filter(|book| non_blank(&filter.author).is_none_or(|a| contains_ci(&book.author, a)))
            .filter(|book| non_blank(&filter.isbn).is_none_or(|i| contains_ci(&book.isbn, i)))
            .filter(|book| filter.status.is_none_or(|s| book.status == s))
            .cloned()
            .collect();
        books.sort_by(|a, b| a.title.cmp(&b.title).then(a.id.cmp(&b.id)));
        Ok(Page::from_vec(books, filter.page()))
    }

    async fn insert(&self, book: &Book) -> Result<Book, RepoError> {
        Calls::bump(&self.calls.inserts);
        self.check()?;
        self.rows.lock().unwrap().insert(book.id, book.clone());
        Ok(book.clone())
    }

    async fn update(&self, book: &Book) -> Result<Book, RepoError> {
        Calls::bump(&self.calls.updates);
        self.check()?;
        let mut rows = self.rows.lock().unwrap();
        let slot = rows.get_mut(&book.id).ok_or(RepoError::NotFound)?;
        *slot = book.clone();
        Ok(book.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<Book, RepoError> {
        Calls::bump(&self.calls.deletes);
        self.check()?;
        self.rows.lock().unwrap().remove(&id).ok_or(RepoError::NotFound)
    }
}

/// Request store that joins against a shared [`InMemoryBooks`].
pub struct InMemoryBookRequests {
    books: Arc<InMemoryBooks>,
    rows: Mutex<HashMap<Uuid, BookRequest>>,
    requestors: Mutex<HashMap<String, BookRequestor>>,
    failing_requestor_insert: AtomicBool,
    pub calls: Calls,
    pub requestor_inserts: AtomicUsize,
}

impl InMemoryBookRequests {
    pub fn new(books: Arc<InMemoryBooks>) -> Arc<Self> {
        Arc::new(Self {
            books,
            rows: Mutex::new(HashMap::new()),
            requestors: Mutex::new(HashMap::new()),
            failing_requestor_insert: AtomicBool::new(false),
            calls: Calls::default(),
            requestor_inserts: AtomicUsize::new(0),
        })
    }

    /// Every later requestor insert fails with a persistence error.
    pub fn fail_requestor_insert(&self) {
        self.failing_requestor_insert.store(true, Ordering::SeqCst);
    }

    pub fn seed_requestor(&self, requestor: BookRequestor) {
        self.requestors
            .lock()
            .unwrap()
            .insert(requestor.contact_number.clone(), requestor);
    }

    pub fn seed_request(&self, request: BookRequest) {
        self.rows.lock().unwrap().insert(request.id, request);
    }

    pub fn request_count(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    pub fn requestor_count(&self) -> usize {
        self.requestors.lock().unwrap().len()
    }

    pub fn requestor_inserts(&self) -> usize {
        self.requestor_inserts.load(Ordering::SeqCst)
    }

    fn compose(&self, request: &BookRequest) -> Option<BookRequestRecord> {
        let book = self.books.snapshot(request.book_id)?;
        let requestor = self
            .requestors
            .lock()
            .unwrap()
            .values()
            .find(|r| r.id == request.book_requestor_id)
            .cloned()?;
        Some(BookRequestRecord {
            request: request.clone(),
            book,
            requestor,
        })
    }
}

#[async_trait]
impl BookRequestRepository for InMemoryBookRequests {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<BookRequestRecord>, RepoError> {
        Calls::bump(&self.calls.finds);
        let request = self.rows.lock().unwrap().get(&id).cloned();
        Ok(request.and_then(|r| self.compose(&r)))
    }

    async fn list_details(
        &self,
        filter: &BookRequestFilter,
    ) -> Result<Page<BookRequestDetails>, RepoError> {
        let requests: Vec<_> = self.rows.lock().unwrap().values().cloned().collect();
        let mut records: Vec<_> = requests
            .iter()
            .filter_map(|r| self.compose(r))
            .filter(|rec| {
                non_blank(&filter.book_title).is_none_or(|t| contains_ci(&rec.book.title, t))
            })
            .filter(|rec| {
                non_blank(&filter.requestor_name).is_none_or(|n| {
                    contains_ci(&rec.requestor.first_name, n)
                        || contains_ci(&rec.requestor.last_name, n)
                        || contains_ci(&rec.requestor.full_name(), n)
                })
            })
            .filter(|rec| {
                filter
                    .request_date
                    .is_none_or(|day| rec.request.request_date.date() == day)
            })
            .collect();
        records.sort_by(|a, b| {
            b.request
                .request_date
                .cmp(&a.request.request_date)
                .then(a.request.id.cmp(&b.request.id))
        });
        let details = records.iter().map(BookRequestDetails::from).collect();
        Ok(Page::from_vec(details, filter.page()))
    }

    async fn insert(&self, request: &BookRequest) -> Result<BookRequest, RepoError> {
        Calls::bump(&self.calls.inserts);
        self.rows.lock().unwrap().insert(request.id, request.clone());
        Ok(request.clone())
    }

    async fn update(&self, request: &BookRequest) -> Result<BookRequest, RepoError> {
        Calls::bump(&self.calls.updates);
        let mut rows = self.rows.lock().unwrap();
        let slot = rows.get_mut(&request.id).ok_or(RepoError::NotFound)?;
        *slot = request.clone();
        Ok(request.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<BookRequest, RepoError> {
        Calls::bump(&self.calls.deletes);
        self.rows.lock().unwrap().remove(&id).ok_or(RepoError::NotFound)
    }

    async fn ids_for_book(&self, book_id: Uuid) -> Result<Vec<Uuid>, RepoError> {
        let mut ids: Vec<_> = self
            .rows
            .lock()
            .unwrap()
            .values()
            .filter(|r| r.book_id == book_id)
            .map(|r| r.id)
            .collect();
        ids.sort();
        Ok(ids)
    }

    async fn find_requestor_by_contact(
        &self,
        contact_number: &str,
    ) -> Result<Option<BookRequestor>, RepoError> {
        Ok(self.requestors.lock().unwrap().get(contact_number).cloned())
    }

    async fn insert_requestor(
        &self,
        requestor: &BookRequestor,
    ) -> Result<BookRequestor, RepoError> {
        self.requestor_inserts.fetch_add(1, Ordering::SeqCst);
        if self.failing_requestor_insert.load(Ordering::SeqCst) {
            return Err(RepoError::from_persistence(
                "duplicate key value violates unique constraint",
            ));
        }
        let mut requestors = self.requestors.lock().unwrap();
        let stored = requestors
            .entry(requestor.contact_number.clone())
            .or_insert_with(|| requestor.clone());
        Ok(stored.clone())
    }
}

/// Cache store that records hits, writes (with their TTL) and removals.
#[derive(Default)]
pub struct RecordingStore {
    inner: InMemoryStore,
    hits: Mutex<Vec<String>>,
    writes: Mutex<Vec<(String, Duration)>>,
    removals: Mutex<Vec<String>>,
}

impl RecordingStore {
    pub fn cache(store: &Arc<RecordingStore>) -> Cache {
        Cache::new(store.clone(), TtlPolicy::default())
    }

    pub fn hits(&self, key: &str) -> usize {
        self.hits.lock().unwrap().iter().filter(|k| *k == key).count()
    }

    /// TTL of the most recent write to `key`.
    pub fn ttl(&self, key: &str) -> Option<Duration> {
        self.writes
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, ttl)| *ttl)
    }

    pub fn total_removals(&self) -> usize {
        self.removals.lock().unwrap().len()
    }

    pub fn removals(&self, key: &str) -> usize {
        self.removals
            .lock()
            .unwrap()
            .iter()
            .filter(|k| *k == key)
            .count()
    }
}

#[async_trait]
impl CacheStore for RecordingStore {
    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let value = self.inner.get(key).await?;
        if value.is_some() {
            self.hits.lock().unwrap().push(key.to_string());
        }
        Ok(value)
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> CacheResult<()> {
        self.writes.lock().unwrap().push((key.to_string(), ttl));
        self.inner.set(key, value, ttl).await
    }

    async fn remove(&self, key: &str) -> CacheResult<()> {
        self.removals.lock().unwrap().push(key.to_string());
        self.inner.remove(key).await
    }
}

pub fn book(title: &str) -> Book {
    Book {
        id: Uuid::now_v7(),
        title: title.to_string(),
        description: String::new(),
        author: "Robert C. Martin".to_string(),
        isbn: "9780132350884".to_string(),
        publisher: "Prentice Hall".to_string(),
        quantity: 2,
        release_date: datetime!(2008-08-01 0:00 UTC),
        status: BookStatus::Available,
    }
}

pub fn book_input(title: &str) -> BookInput {
    BookInput {
        title: title.to_string(),
        description: "A handbook of agile software craftsmanship".to_string(),
        author: "Robert C. Martin".to_string(),
        isbn: "9780132350884".to_string(),
        publisher: "Prentice Hall".to_string(),
        quantity: 3,
        release_date: datetime!(2008-08-01 0:00 UTC),
        status: BookStatus::Available,
    }
}

pub fn request_dto(title: &str, contact_number: &str) -> BookRequestDto {
    BookRequestDto {
        book_title: title.to_string(),
        first_name: "Jane".to_string(),
        last_name: "Doe".to_string(),
        contact_number: contact_number.to_string(),
    }
}
