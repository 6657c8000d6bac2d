//! Group and membership writes

use std::sync::Arc;

use tracing::instrument;

use crate::entity::{
    new_id, now_millis, Group, GroupCreateRequest, GroupRecord, MembershipCreateRequest,
    MembershipRecord, Record,
};
use crate::keys::group_key;
use crate::store::{SingleTableStore, StoreError, StoreResult};

/// Storage client for groups and memberships
pub struct GroupStorage {
    store: Arc<SingleTableStore>,
}

impl GroupStorage {
    /// Creates a new storage instance
    #[must_use]
    pub const fn new(store: Arc<SingleTableStore>) -> Self {
        Self { store }
    }

    /// Creates a group with a generated id, indexed under its creator
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the `DynamoDB` put operation fails
    #[instrument(skip(self, request), fields(creator = %request.user_id))]
    pub async fn create_group(&self, request: GroupCreateRequest) -> StoreResult<Group> {
        let group = GroupRecord::encode(request, new_id(), now_millis());
        self.store.put_if_absent(&group).await?;

        tracing::info!(group_id = %group.id, "Created group");
        Ok(group.project())
    }

    /// Gets a single group by id
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the `DynamoDB` get operation fails
    pub async fn get_group(&self, group_id: &str) -> StoreResult<Option<Group>> {
        let record = self
            .store
            .get_by_key::<GroupRecord>(&group_key(group_id))
            .await?;

        Ok(record.map(Record::project))
    }

    /// Adds a user to a group
    ///
    /// Returns `false` when the user is already a member; the existing join
    /// record is left untouched.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the `DynamoDB` put operation fails for any other
    /// reason
    #[instrument(skip(self, request), fields(group_id = %request.group_id, user_id = %request.user_id))]
    pub async fn add_user_to_group(&self, request: MembershipCreateRequest) -> StoreResult<bool> {
        let membership = MembershipRecord::encode(request, new_id(), now_millis());

        match self.store.put_if_absent(&membership).await {
            Ok(()) => {
                tracing::info!("Added user to group");
                Ok(true)
            }
            Err(StoreError::AlreadyExists) => {
                tracing::debug!("User is already a member of the group");
                Ok(false)
            }
            Err(err) => Err(err),
        }
    }
}
