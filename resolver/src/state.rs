//! Application state management

use std::sync::Arc;

use chat_storage::{
    groups::GroupStorage, messages::MessageStorage, queries::AccessPatterns,
    registration::UserStorage, store::SingleTableStore,
};

/// Storage clients shared across handlers
#[derive(Clone)]
pub struct ChatServices {
    /// User registration and lookup
    pub users: Arc<UserStorage>,
    /// Group and membership writes
    pub groups: Arc<GroupStorage>,
    /// Message and typing indicator writes
    pub messages: Arc<MessageStorage>,
    /// Read-side access patterns
    pub queries: Arc<AccessPatterns>,
}

impl ChatServices {
    /// Builds every storage client on top of one store
    #[must_use]
    pub fn new(store: Arc<SingleTableStore>) -> Self {
        Self {
            users: Arc::new(UserStorage::new(store.clone())),
            groups: Arc::new(GroupStorage::new(store.clone())),
            messages: Arc::new(MessageStorage::new(store.clone())),
            queries: Arc::new(AccessPatterns::new(store)),
        }
    }
}
