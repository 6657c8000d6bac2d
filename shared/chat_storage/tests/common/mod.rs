//! Shared setup for storage tests

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chat_storage::{
    entity::{GroupCreateRequest, MessageCreateRequest, UserCreateRequest},
    groups::GroupStorage,
    keys::TableKey,
    messages::MessageStorage,
    queries::AccessPatterns,
    registration::UserStorage,
    store::{
        ConditionalPut, ContinuationToken, InMemoryBackend, IndexQuery, Item, Page,
        SingleTableStore, StoreResult, TableBackend,
    },
};

/// Storage clients wired to one in-memory table
pub struct TestContext {
    pub backend: Arc<InMemoryBackend>,
    pub store: Arc<SingleTableStore>,
    pub users: UserStorage,
    pub groups: GroupStorage,
    pub messages: MessageStorage,
    pub queries: AccessPatterns,
}

/// Creates a fresh table and every storage client on top of it
pub fn setup_test() -> TestContext {
    let backend = Arc::new(InMemoryBackend::new());
    let store = Arc::new(SingleTableStore::new(backend.clone()));
    context(backend, store)
}

/// Like [`setup_test`], but every query page holds at most `page_size` items
pub fn setup_test_with_page_size(page_size: u32) -> (TestContext, Arc<PageCappedBackend>) {
    let backend = Arc::new(InMemoryBackend::new());
    let capped = Arc::new(PageCappedBackend {
        inner: backend.clone(),
        page_size,
        queries: AtomicUsize::new(0),
    });
    let store = Arc::new(SingleTableStore::new(capped.clone()));
    (context(backend, store), capped)
}

fn context(backend: Arc<InMemoryBackend>, store: Arc<SingleTableStore>) -> TestContext {
    TestContext {
        backend,
        users: UserStorage::new(store.clone()),
        groups: GroupStorage::new(store.clone()),
        messages: MessageStorage::new(store.clone()),
        queries: AccessPatterns::new(store.clone()),
        store,
    }
}

pub fn user_request(username: &str, email: &str) -> UserCreateRequest {
    UserCreateRequest {
        username: username.to_string(),
        email: email.to_string(),
        profile_picture: None,
    }
}

pub fn group_request(creator: &str, name: &str) -> GroupCreateRequest {
    GroupCreateRequest {
        user_id: creator.to_string(),
        name: name.to_string(),
        group_profile_pic: None,
        description: Some(format!("{name} description")),
    }
}

pub fn message_request(group_id: &str, author: &str, text: &str) -> MessageCreateRequest {
    MessageCreateRequest {
        group_id: group_id.to_string(),
        user_id: author.to_string(),
        message_text: text.to_string(),
    }
}

/// Forwards to an in-memory table while capping the size of query pages,
/// the way `DynamoDB` cuts pages at 1 MB
pub struct PageCappedBackend {
    inner: Arc<InMemoryBackend>,
    page_size: u32,
    queries: AtomicUsize,
}

impl PageCappedBackend {
    /// Number of pages read so far
    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TableBackend for PageCappedBackend {
    async fn put_item(&self, put: ConditionalPut) -> StoreResult<()> {
        self.inner.put_item(put).await
    }

    async fn transact_put_items(&self, puts: Vec<ConditionalPut>) -> StoreResult<()> {
        self.inner.transact_put_items(puts).await
    }

    async fn get_item(&self, key: &TableKey) -> StoreResult<Option<Item>> {
        self.inner.get_item(key).await
    }

    async fn query(
        &self,
        query: &IndexQuery,
        start: Option<ContinuationToken>,
        limit: Option<u32>,
    ) -> StoreResult<Page<Item>> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        let limit = limit.map_or(self.page_size, |limit| limit.min(self.page_size));
        self.inner.query(query, start, Some(limit)).await
    }
}
