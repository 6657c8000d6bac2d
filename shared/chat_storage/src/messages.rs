//! Message and typing indicator writes

use std::sync::Arc;

use tracing::instrument;

use crate::entity::{
    new_id, now_millis, Message, MessageCreateRequest, MessageRecord, Record,
    TypingIndicator, TypingIndicatorRecord, TypingIndicatorRequest,
};
use crate::keys::typing_key;
use crate::store::{SingleTableStore, StoreResult};

/// Storage client for messages and typing state
pub struct MessageStorage {
    store: Arc<SingleTableStore>,
}

impl MessageStorage {
    /// Creates a new storage instance
    #[must_use]
    pub const fn new(store: Arc<SingleTableStore>) -> Self {
        Self { store }
    }

    /// Stores a message with a generated id, indexed under its group
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the `DynamoDB` put operation fails
    #[instrument(skip(self, request), fields(group_id = %request.group_id))]
    pub async fn send_message(&self, request: MessageCreateRequest) -> StoreResult<Message> {
        let message = MessageRecord::encode(request, new_id(), now_millis());
        self.store.put_if_absent(&message).await?;

        tracing::debug!(message_id = %message.id, "Stored message");
        Ok(message.project())
    }

    /// Records whether a user is typing in a group
    ///
    /// The write replaces the previous state for the same (user, group) pair.
    /// Returns the stored flag.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the `DynamoDB` put operation fails
    #[instrument(skip(self, request), fields(group_id = %request.group_id, user_id = %request.user_id))]
    pub async fn set_typing(&self, request: TypingIndicatorRequest) -> StoreResult<bool> {
        let indicator = TypingIndicatorRecord::encode(request, new_id(), now_millis());
        self.store.put(&indicator).await?;

        Ok(indicator.typing)
    }

    /// Gets the latest typing state of a user in a group
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the `DynamoDB` get operation fails
    pub async fn get_typing(
        &self,
        user_id: &str,
        group_id: &str,
    ) -> StoreResult<Option<TypingIndicator>> {
        let record = self
            .store
            .get_by_key::<TypingIndicatorRecord>(&typing_key(user_id, group_id))
            .await?;

        Ok(record.map(Record::project))
    }
}
