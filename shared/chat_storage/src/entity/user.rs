use serde::{Deserialize, Serialize};

use super::Record;
use crate::keys::{user_email_key, user_key, EntityKind, TableKey};

/// Request to register a new user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserCreateRequest {
    /// Unique username, also the canonical user key
    pub username: String,
    /// Unique email address
    pub email: String,
    /// Optional profile picture location
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_picture: Option<String>,
}

/// Stored user item keyed by username
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    /// `USER#<username>`
    #[serde(rename = "PK")]
    pub pk: String,
    /// `USER#<username>`
    #[serde(rename = "SK")]
    pub sk: String,
    /// Always [`EntityKind::User`]
    #[serde(rename = "ENTITY")]
    pub entity: EntityKind,
    /// Server-generated id
    pub id: String,
    /// Username
    pub username: String,
    /// Email address
    pub email: String,
    /// Profile picture location
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_pic_url: Option<String>,
    /// Creation time in epoch milliseconds
    pub created_on: i64,
}

/// User as returned to API callers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Server-generated id
    pub id: String,
    /// Username
    pub username: String,
    /// Email address
    pub email: String,
    /// Profile picture location
    pub profile_pic_url: Option<String>,
    /// Creation time in epoch milliseconds
    pub created_on: i64,
}

impl UserRecord {
    /// Builds the user item for a registration
    #[must_use]
    pub fn encode(request: UserCreateRequest, id: String, created_on: i64) -> Self {
        let key = user_key(&request.username);
        Self {
            pk: key.pk,
            sk: key.sk,
            entity: EntityKind::User,
            id,
            username: request.username,
            email: request.email,
            profile_pic_url: request.profile_picture,
            created_on,
        }
    }
}

impl Record for UserRecord {
    const ENTITY: EntityKind = EntityKind::User;
    type Projection = User;

    fn table_key(&self) -> TableKey {
        TableKey::new(self.pk.clone(), self.sk.clone())
    }

    fn project(self) -> User {
        User {
            id: self.id,
            username: self.username,
            email: self.email,
            profile_pic_url: self.profile_pic_url,
            created_on: self.created_on,
        }
    }
}

/// Stored email reservation keyed by email
///
/// Shares `id` and `createdOn` with the user it was created alongside.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserEmailRecord {
    /// `USEREMAIL#<email>`
    #[serde(rename = "PK")]
    pub pk: String,
    /// `USEREMAIL#<email>`
    #[serde(rename = "SK")]
    pub sk: String,
    /// Always [`EntityKind::UserEmail`]
    #[serde(rename = "ENTITY")]
    pub entity: EntityKind,
    /// Id of the owning user
    pub id: String,
    /// Reserved email address
    pub email: String,
    /// Creation time in epoch milliseconds
    pub created_on: i64,
}

/// Email reservation without storage attributes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailReservation {
    /// Id of the owning user
    pub id: String,
    /// Reserved email address
    pub email: String,
    /// Creation time in epoch milliseconds
    pub created_on: i64,
}

impl UserEmailRecord {
    /// Builds an email reservation
    #[must_use]
    pub fn encode(email: String, id: String, created_on: i64) -> Self {
        let key = user_email_key(&email);
        Self {
            pk: key.pk,
            sk: key.sk,
            entity: EntityKind::UserEmail,
            id,
            email,
            created_on,
        }
    }

    /// Builds the reservation paired with a user item
    #[must_use]
    pub fn for_user(user: &UserRecord) -> Self {
        Self::encode(user.email.clone(), user.id.clone(), user.created_on)
    }
}

impl Record for UserEmailRecord {
    const ENTITY: EntityKind = EntityKind::UserEmail;
    type Projection = EmailReservation;

    fn table_key(&self) -> TableKey {
        TableKey::new(self.pk.clone(), self.sk.clone())
    }

    fn project(self) -> EmailReservation {
        EmailReservation {
            id: self.id,
            email: self.email,
            created_on: self.created_on,
        }
    }
}
