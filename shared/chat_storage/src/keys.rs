//! Key codec for the group chat table
//!
//! Every entity shares one `PK`/`SK` key schema. Two global secondary indexes
//! serve the "groups by creator" and "messages by group" lookups. All key
//! values are built from a fixed prefix and the entity's natural identifier.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

const USER_PREFIX: &str = "USER#";
const USER_EMAIL_PREFIX: &str = "USEREMAIL#";
const GROUP_PREFIX: &str = "GROUP#";
const MEMBERSHIP_PREFIX: &str = "MEMBERSHIP#";
const MESSAGE_PREFIX: &str = "MESSAGE#";
const TYPING_SUFFIX: &str = "#TYPING";

/// Sort key prefix selecting group items in a user's index-1 partition
pub const GROUP_SORT_PREFIX: &str = GROUP_PREFIX;

/// Sort key prefix selecting membership items in a user's index-1 partition
pub const MEMBERSHIP_SORT_PREFIX: &str = MEMBERSHIP_PREFIX;

/// Sort key prefix selecting message items in a group's index-2 partition
pub const MESSAGE_SORT_PREFIX: &str = MESSAGE_PREFIX;

/// `DynamoDB` attribute names used by the table and index key schemas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum TableAttribute {
    /// Table partition key
    #[strum(serialize = "PK")]
    PartitionKey,
    /// Table sort key
    #[strum(serialize = "SK")]
    SortKey,
    /// Index-1 partition key (creator / member)
    #[strum(serialize = "GSI1PK")]
    Gsi1PartitionKey,
    /// Index-1 sort key
    #[strum(serialize = "GSI1SK")]
    Gsi1SortKey,
    /// Index-2 partition key (owning group)
    #[strum(serialize = "GSI2PK")]
    Gsi2PartitionKey,
    /// Index-2 sort key
    #[strum(serialize = "GSI2SK")]
    Gsi2SortKey,
    /// Entity discriminator
    #[strum(serialize = "ENTITY")]
    Entity,
}

/// Discriminator stored in the `ENTITY` attribute of every item
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityKind {
    /// Canonical user record
    User,
    /// Email reservation paired with a user
    #[serde(rename = "USEREMAIL")]
    #[strum(serialize = "USEREMAIL")]
    UserEmail,
    /// Chat group
    Group,
    /// Join record between a group and a user
    Membership,
    /// Message posted to a group
    Message,
    /// Latest typing state of a user in a group
    #[serde(rename = "TYPING")]
    #[strum(serialize = "TYPING")]
    TypingIndicator,
}

/// Global secondary indexes of the table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum TableIndex {
    /// Index-1: groups (and memberships) keyed by user
    #[strum(serialize = "getAllGroupsCreatedByUser")]
    GroupsByCreator,
    /// Index-2: messages keyed by owning group
    #[strum(serialize = "getMessagesPerGroup")]
    MessagesByGroup,
}

impl TableIndex {
    /// Partition and sort key attributes of this index
    #[must_use]
    pub const fn key_attributes(self) -> (TableAttribute, TableAttribute) {
        match self {
            Self::GroupsByCreator => (TableAttribute::Gsi1PartitionKey, TableAttribute::Gsi1SortKey),
            Self::MessagesByGroup => (TableAttribute::Gsi2PartitionKey, TableAttribute::Gsi2SortKey),
        }
    }
}

/// Primary key of an item
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TableKey {
    /// Partition key value
    pub pk: String,
    /// Sort key value
    pub sk: String,
}

impl TableKey {
    /// Creates a key from partition and sort values
    pub fn new(pk: impl Into<String>, sk: impl Into<String>) -> Self {
        Self {
            pk: pk.into(),
            sk: sk.into(),
        }
    }
}

/// Key attributes of an item inside a secondary index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexKey {
    /// Index partition key value
    pub pk: String,
    /// Index sort key value
    pub sk: String,
}

/// Partition value shared by everything keyed on a user
#[must_use]
pub fn user_partition(user_id: &str) -> String {
    format!("{USER_PREFIX}{user_id}")
}

/// Partition value shared by everything keyed on a group
#[must_use]
pub fn group_partition(group_id: &str) -> String {
    format!("{GROUP_PREFIX}{group_id}")
}

/// `USER#<username>` / `USER#<username>`
#[must_use]
pub fn user_key(username: &str) -> TableKey {
    let value = user_partition(username);
    TableKey::new(value.clone(), value)
}

/// `USEREMAIL#<email>` / `USEREMAIL#<email>`
#[must_use]
pub fn user_email_key(email: &str) -> TableKey {
    let value = format!("{USER_EMAIL_PREFIX}{email}");
    TableKey::new(value.clone(), value)
}

/// `GROUP#<groupId>` / `GROUP#<groupId>`
#[must_use]
pub fn group_key(group_id: &str) -> TableKey {
    let value = group_partition(group_id);
    TableKey::new(value.clone(), value)
}

/// Index-1 key placing a group under its creator
#[must_use]
pub fn group_creator_index_key(creator_id: &str, group_id: &str) -> IndexKey {
    IndexKey {
        pk: user_partition(creator_id),
        sk: group_partition(group_id),
    }
}

/// `GROUP#<groupId>` / `USER#<userId>`
#[must_use]
pub fn membership_key(group_id: &str, user_id: &str) -> TableKey {
    TableKey::new(group_partition(group_id), user_partition(user_id))
}

/// Index-1 key placing a membership under its member
#[must_use]
pub fn membership_index_key(user_id: &str, group_id: &str) -> IndexKey {
    IndexKey {
        pk: user_partition(user_id),
        sk: format!("{MEMBERSHIP_PREFIX}{group_id}"),
    }
}

/// `MESSAGE#<messageId>` / `MESSAGE#<messageId>`
#[must_use]
pub fn message_key(message_id: &str) -> TableKey {
    let value = format!("{MESSAGE_PREFIX}{message_id}");
    TableKey::new(value.clone(), value)
}

/// Index-2 key placing a message under its group
#[must_use]
pub fn group_messages_index_key(group_id: &str, message_id: &str) -> IndexKey {
    IndexKey {
        pk: group_partition(group_id),
        sk: format!("{MESSAGE_PREFIX}{message_id}"),
    }
}

/// `USER#<userId>` / `GROUP#<groupId>#TYPING`
#[must_use]
pub fn typing_key(user_id: &str, group_id: &str) -> TableKey {
    TableKey::new(
        user_partition(user_id),
        format!("{GROUP_PREFIX}{group_id}{TYPING_SUFFIX}"),
    )
}

/// Natural identifiers of an item, recoverable from its key and `ENTITY` tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NaturalKey {
    /// User identified by username
    User {
        /// Username
        username: String,
    },
    /// Email reservation
    UserEmail {
        /// Reserved email address
        email: String,
    },
    /// Group identified by id
    Group {
        /// Group id
        group_id: String,
    },
    /// Membership of a user in a group
    Membership {
        /// Group id
        group_id: String,
        /// Member id
        user_id: String,
    },
    /// Message identified by id
    Message {
        /// Message id
        message_id: String,
    },
    /// Typing state of a user in a group
    TypingIndicator {
        /// User id
        user_id: String,
        /// Group id
        group_id: String,
    },
}

impl NaturalKey {
    /// Encodes the natural identifiers into the table key
    #[must_use]
    pub fn table_key(&self) -> TableKey {
        match self {
            Self::User { username } => user_key(username),
            Self::UserEmail { email } => user_email_key(email),
            Self::Group { group_id } => group_key(group_id),
            Self::Membership { group_id, user_id } => membership_key(group_id, user_id),
            Self::Message { message_id } => message_key(message_id),
            Self::TypingIndicator { user_id, group_id } => typing_key(user_id, group_id),
        }
    }

    /// Recovers the natural identifiers from a table key
    ///
    /// Returns `None` when the key does not have the shape the entity kind uses.
    #[must_use]
    pub fn decode(entity: EntityKind, key: &TableKey) -> Option<Self> {
        let decoded = match entity {
            EntityKind::User => Self::User {
                username: single_value(key, USER_PREFIX)?,
            },
            EntityKind::UserEmail => Self::UserEmail {
                email: single_value(key, USER_EMAIL_PREFIX)?,
            },
            EntityKind::Group => Self::Group {
                group_id: single_value(key, GROUP_PREFIX)?,
            },
            EntityKind::Membership => Self::Membership {
                group_id: key.pk.strip_prefix(GROUP_PREFIX)?.to_string(),
                user_id: key.sk.strip_prefix(USER_PREFIX)?.to_string(),
            },
            EntityKind::Message => Self::Message {
                message_id: single_value(key, MESSAGE_PREFIX)?,
            },
            EntityKind::TypingIndicator => Self::TypingIndicator {
                user_id: key.pk.strip_prefix(USER_PREFIX)?.to_string(),
                group_id: key
                    .sk
                    .strip_prefix(GROUP_PREFIX)?
                    .strip_suffix(TYPING_SUFFIX)?
                    .to_string(),
            },
        };

        Some(decoded)
    }
}

/// Value of a key whose partition and sort halves are identical
fn single_value(key: &TableKey, prefix: &str) -> Option<String> {
    if key.pk != key.sk {
        return None;
    }
    key.pk.strip_prefix(prefix).map(ToString::to_string)
}
