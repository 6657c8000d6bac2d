use serde::{Deserialize, Serialize};

use super::Record;
use crate::keys::{typing_key, EntityKind, TableKey};

/// Request to record a user's typing state in a group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypingIndicatorRequest {
    /// Group the user is typing in
    pub group_id: String,
    /// Typing user
    pub user_id: String,
    /// Whether the user is currently typing
    pub typing: bool,
}

/// Stored typing state; the latest write for a (user, group) pair replaces
/// the previous one
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypingIndicatorRecord {
    /// `USER#<userId>`
    #[serde(rename = "PK")]
    pub pk: String,
    /// `GROUP#<groupId>#TYPING`
    #[serde(rename = "SK")]
    pub sk: String,
    /// Always [`EntityKind::TypingIndicator`]
    #[serde(rename = "ENTITY")]
    pub entity: EntityKind,
    /// Server-generated id of this write
    pub id: String,
    /// Typing user
    pub user_id: String,
    /// Group
    pub group_id: String,
    /// Whether the user is typing
    pub typing: bool,
    /// Write time in epoch milliseconds
    pub created_on: i64,
}

/// Typing state without storage attributes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypingIndicator {
    /// Server-generated id of this write
    pub id: String,
    /// Typing user
    pub user_id: String,
    /// Group
    pub group_id: String,
    /// Whether the user is typing
    pub typing: bool,
    /// Write time in epoch milliseconds
    pub created_on: i64,
}

impl TypingIndicatorRecord {
    /// Builds the typing state item
    #[must_use]
    pub fn encode(request: TypingIndicatorRequest, id: String, created_on: i64) -> Self {
        let key = typing_key(&request.user_id, &request.group_id);
        Self {
            pk: key.pk,
            sk: key.sk,
            entity: EntityKind::TypingIndicator,
            id,
            user_id: request.user_id,
            group_id: request.group_id,
            typing: request.typing,
            created_on,
        }
    }
}

impl Record for TypingIndicatorRecord {
    const ENTITY: EntityKind = EntityKind::TypingIndicator;
    type Projection = TypingIndicator;

    fn table_key(&self) -> TableKey {
        TableKey::new(self.pk.clone(), self.sk.clone())
    }

    fn project(self) -> TypingIndicator {
        TypingIndicator {
            id: self.id,
            user_id: self.user_id,
            group_id: self.group_id,
            typing: self.typing,
            created_on: self.created_on,
        }
    }
}
