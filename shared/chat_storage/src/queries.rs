//! Access-pattern queries
//!
//! The fixed set of lookups the API serves. Every one is a key lookup or a
//! partition query on the table or one of its indexes; none scans.

use std::sync::Arc;

use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use serde::Serialize;
use tracing::instrument;

use crate::entity::{
    Group, GroupRecord, MembershipRecord, Message, MessageRecord, Record, User, UserRecord,
};
use crate::keys::{
    group_key, group_partition, user_key, user_partition, TableIndex, GROUP_SORT_PREFIX,
    MEMBERSHIP_SORT_PREFIX, MESSAGE_SORT_PREFIX,
};
use crate::store::{
    ContinuationToken, IndexQuery, Page, SingleTableStore, StoreError, StoreResult,
};

/// Group lookups in flight at once while resolving memberships
const MAX_CONCURRENT_GROUP_LOOKUPS: usize = 16;

/// A group the user is a member of
///
/// `group` is `None` when the membership outlived the group item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberGroup {
    /// Id taken from the membership row
    pub group_id: String,
    /// Resolved group, if it still exists
    pub group: Option<Group>,
}

/// Read-side lookups over the single table
#[derive(Clone)]
pub struct AccessPatterns {
    store: Arc<SingleTableStore>,
}

impl AccessPatterns {
    /// Creates a new query client
    #[must_use]
    pub const fn new(store: Arc<SingleTableStore>) -> Self {
        Self { store }
    }

    /// Streams the groups created by a user, in creation order
    pub fn groups_created_by(&self, user_id: &str) -> BoxStream<'_, StoreResult<Group>> {
        let query = IndexQuery::on_index(
            TableIndex::GroupsByCreator,
            user_partition(user_id),
            Some(GROUP_SORT_PREFIX),
        );

        self.store
            .query_by_index::<GroupRecord>(query, None)
            .map_ok(Record::project)
            .boxed()
    }

    /// Lists the groups a user belongs to
    ///
    /// Membership rows are read from the member's index partition and each
    /// group is then fetched by key, at most
    /// `MAX_CONCURRENT_GROUP_LOOKUPS` at a time and in membership order. A
    /// missing group is reported as `None` without failing the listing.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if a `DynamoDB` query or get operation fails
    #[instrument(skip(self))]
    pub async fn groups_user_belongs_to(&self, user_id: &str) -> StoreResult<Vec<MemberGroup>> {
        let query = IndexQuery::on_index(
            TableIndex::GroupsByCreator,
            user_partition(user_id),
            Some(MEMBERSHIP_SORT_PREFIX),
        );
        let memberships: Vec<MembershipRecord> = self
            .store
            .query_by_index::<MembershipRecord>(query, None)
            .try_collect()
            .await?;

        let lookups = memberships.into_iter().map(|membership| async move {
            let group = self
                .store
                .get_by_key::<GroupRecord>(&group_key(&membership.group_id))
                .await?
                .map(Record::project);

            if group.is_none() {
                tracing::warn!(
                    group_id = %membership.group_id,
                    "Membership references a group that no longer exists"
                );
            }

            Ok::<_, StoreError>(MemberGroup {
                group_id: membership.group_id,
                group,
            })
        });

        stream::iter(lookups)
            .buffered(MAX_CONCURRENT_GROUP_LOOKUPS)
            .try_collect()
            .await
    }

    /// Streams the messages of a group in creation order
    ///
    /// Resumes after `start` when a token from an earlier page is given.
    pub fn messages_in_group(
        &self,
        group_id: &str,
        start: Option<ContinuationToken>,
    ) -> BoxStream<'_, StoreResult<Message>> {
        self.store
            .query_by_index::<MessageRecord>(messages_query(group_id), start)
            .map_ok(Record::project)
            .boxed()
    }

    /// Reads one page of a group's messages
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the `DynamoDB` query fails
    #[instrument(skip(self, start))]
    pub async fn messages_in_group_page(
        &self,
        group_id: &str,
        limit: Option<u32>,
        start: Option<ContinuationToken>,
    ) -> StoreResult<Page<Message>> {
        let page = self
            .store
            .query_page::<MessageRecord>(&messages_query(group_id), start, limit)
            .await?;

        Ok(page.map(Record::project))
    }

    /// Resolves the author of a message
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the `DynamoDB` get operation fails
    pub async fn author_of_message(&self, message: &Message) -> StoreResult<Option<User>> {
        let author = self
            .store
            .get_by_key::<UserRecord>(&user_key(&message.user_id))
            .await?;

        if author.is_none() {
            tracing::warn!(message_id = %message.id, "Message author no longer exists");
        }

        Ok(author.map(Record::project))
    }
}

fn messages_query(group_id: &str) -> IndexQuery {
    IndexQuery::on_index(
        TableIndex::MessagesByGroup,
        group_partition(group_id),
        Some(MESSAGE_SORT_PREFIX),
    )
}
