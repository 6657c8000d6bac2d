use serde::{Deserialize, Serialize};

use super::Record;
use crate::keys::{group_creator_index_key, group_key, EntityKind, TableKey};

/// Request to create a new group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupCreateRequest {
    /// Creator of the group
    pub user_id: String,
    /// Display name
    pub name: String,
    /// Optional group picture location
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_profile_pic: Option<String>,
    /// Optional description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Stored group item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupRecord {
    /// `GROUP#<groupId>`
    #[serde(rename = "PK")]
    pub pk: String,
    /// `GROUP#<groupId>`
    #[serde(rename = "SK")]
    pub sk: String,
    /// `USER#<creatorId>`
    #[serde(rename = "GSI1PK")]
    pub gsi1_pk: String,
    /// `GROUP#<groupId>`
    #[serde(rename = "GSI1SK")]
    pub gsi1_sk: String,
    /// Always [`EntityKind::Group`]
    #[serde(rename = "ENTITY")]
    pub entity: EntityKind,
    /// Server-generated id
    pub id: String,
    /// Creator of the group
    pub user_id: String,
    /// Display name
    pub name: String,
    /// Group picture location
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_profile_pic: Option<String>,
    /// Description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Creation time in epoch milliseconds
    pub created_on: i64,
}

/// Group as returned to API callers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    /// Server-generated id
    pub id: String,
    /// Creator of the group
    pub user_id: String,
    /// Display name
    pub name: String,
    /// Group picture location
    pub group_profile_pic: Option<String>,
    /// Description
    pub description: Option<String>,
    /// Creation time in epoch milliseconds
    pub created_on: i64,
}

impl GroupRecord {
    /// Builds the group item, indexed under its creator
    #[must_use]
    pub fn encode(request: GroupCreateRequest, id: String, created_on: i64) -> Self {
        let key = group_key(&id);
        let creator = group_creator_index_key(&request.user_id, &id);
        Self {
            pk: key.pk,
            sk: key.sk,
            gsi1_pk: creator.pk,
            gsi1_sk: creator.sk,
            entity: EntityKind::Group,
            id,
            user_id: request.user_id,
            name: request.name,
            group_profile_pic: request.group_profile_pic,
            description: request.description,
            created_on,
        }
    }
}

impl Record for GroupRecord {
    const ENTITY: EntityKind = EntityKind::Group;
    type Projection = Group;

    fn table_key(&self) -> TableKey {
        TableKey::new(self.pk.clone(), self.sk.clone())
    }

    fn project(self) -> Group {
        Group {
            id: self.id,
            user_id: self.user_id,
            name: self.name,
            group_profile_pic: self.group_profile_pic,
            description: self.description,
            created_on: self.created_on,
        }
    }
}
