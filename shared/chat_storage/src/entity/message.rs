use serde::{Deserialize, Serialize};

use super::Record;
use crate::keys::{group_messages_index_key, message_key, EntityKind, TableKey};

/// Request to post a message to a group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageCreateRequest {
    /// Target group
    pub group_id: String,
    /// Author
    pub user_id: String,
    /// Message body
    pub message_text: String,
}

/// Stored message item, indexed under its group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageRecord {
    /// `MESSAGE#<messageId>`
    #[serde(rename = "PK")]
    pub pk: String,
    /// `MESSAGE#<messageId>`
    #[serde(rename = "SK")]
    pub sk: String,
    /// `GROUP#<groupId>`
    #[serde(rename = "GSI2PK")]
    pub gsi2_pk: String,
    /// `MESSAGE#<messageId>`
    #[serde(rename = "GSI2SK")]
    pub gsi2_sk: String,
    /// Always [`EntityKind::Message`]
    #[serde(rename = "ENTITY")]
    pub entity: EntityKind,
    /// Server-generated id
    pub id: String,
    /// Author
    pub user_id: String,
    /// Owning group
    pub group_id: String,
    /// Message body
    pub message_text: String,
    /// Creation time in epoch milliseconds
    pub created_on: i64,
}

/// Message as returned to API callers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Server-generated id
    pub id: String,
    /// Author
    pub user_id: String,
    /// Owning group
    pub group_id: String,
    /// Message body
    pub message_text: String,
    /// Creation time in epoch milliseconds
    pub created_on: i64,
}

impl MessageRecord {
    /// Builds the message item
    #[must_use]
    pub fn encode(request: MessageCreateRequest, id: String, created_on: i64) -> Self {
        let key = message_key(&id);
        let listing = group_messages_index_key(&request.group_id, &id);
        Self {
            pk: key.pk,
            sk: key.sk,
            gsi2_pk: listing.pk,
            gsi2_sk: listing.sk,
            entity: EntityKind::Message,
            id,
            user_id: request.user_id,
            group_id: request.group_id,
            message_text: request.message_text,
            created_on,
        }
    }
}

impl Record for MessageRecord {
    const ENTITY: EntityKind = EntityKind::Message;
    type Projection = Message;

    fn table_key(&self) -> TableKey {
        TableKey::new(self.pk.clone(), self.sk.clone())
    }

    fn project(self) -> Message {
        Message {
            id: self.id,
            user_id: self.user_id,
            group_id: self.group_id,
            message_text: self.message_text,
            created_on: self.created_on,
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::keys::group_key;

    #[test]
    fn test_message_projection_recovers_fields() {
        let request = MessageCreateRequest {
            group_id: "g-1".to_string(),
            user_id: "alice".to_string(),
            message_text: "hello".to_string(),
        };
        let message = MessageRecord::encode(request, "m-1".to_string(), 99).project();

        assert_eq!(
            message,
            Message {
                id: "m-1".to_string(),
                user_id: "alice".to_string(),
                group_id: "g-1".to_string(),
                message_text: "hello".to_string(),
                created_on: 99,
            }
        );
    }

    #[test]
    fn test_message_index_partition_is_group_key() {
        let request = MessageCreateRequest {
            group_id: "g-1".to_string(),
            user_id: "alice".to_string(),
            message_text: "hello".to_string(),
        };
        let record = MessageRecord::encode(request, "m-1".to_string(), 99);

        assert_eq!(record.table_key(), message_key("m-1"));
        assert_eq!(record.gsi2_pk, group_key("g-1").pk);
        assert_eq!(record.gsi2_sk, "MESSAGE#m-1");
    }
}
