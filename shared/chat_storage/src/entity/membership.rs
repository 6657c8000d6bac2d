use serde::{Deserialize, Serialize};

use super::Record;
use crate::keys::{membership_index_key, membership_key, EntityKind, TableKey};

/// Request to add a user to a group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MembershipCreateRequest {
    /// Group being joined
    pub group_id: String,
    /// Joining user
    pub user_id: String,
}

/// Stored join record, one per (group, user)
///
/// Also indexed under the member so a user's groups can be listed without a
/// scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MembershipRecord {
    /// `GROUP#<groupId>`
    #[serde(rename = "PK")]
    pub pk: String,
    /// `USER#<userId>`
    #[serde(rename = "SK")]
    pub sk: String,
    /// `USER#<userId>`
    #[serde(rename = "GSI1PK")]
    pub gsi1_pk: String,
    /// `MEMBERSHIP#<groupId>`
    #[serde(rename = "GSI1SK")]
    pub gsi1_sk: String,
    /// Always [`EntityKind::Membership`]
    #[serde(rename = "ENTITY")]
    pub entity: EntityKind,
    /// Server-generated id
    pub id: String,
    /// Group joined
    pub group_id: String,
    /// Member
    pub user_id: String,
    /// Creation time in epoch milliseconds
    pub created_on: i64,
}

/// Membership without storage attributes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Membership {
    /// Server-generated id
    pub id: String,
    /// Group joined
    pub group_id: String,
    /// Member
    pub user_id: String,
    /// Creation time in epoch milliseconds
    pub created_on: i64,
}

impl MembershipRecord {
    /// Builds the join record
    #[must_use]
    pub fn encode(request: MembershipCreateRequest, id: String, created_on: i64) -> Self {
        let key = membership_key(&request.group_id, &request.user_id);
        let member = membership_index_key(&request.user_id, &request.group_id);
        Self {
            pk: key.pk,
            sk: key.sk,
            gsi1_pk: member.pk,
            gsi1_sk: member.sk,
            entity: EntityKind::Membership,
            id,
            group_id: request.group_id,
            user_id: request.user_id,
            created_on,
        }
    }
}

impl Record for MembershipRecord {
    const ENTITY: EntityKind = EntityKind::Membership;
    type Projection = Membership;

    fn table_key(&self) -> TableKey {
        TableKey::new(self.pk.clone(), self.sk.clone())
    }

    fn project(self) -> Membership {
        Membership {
            id: self.id,
            group_id: self.group_id,
            user_id: self.user_id,
            created_on: self.created_on,
        }
    }
}
