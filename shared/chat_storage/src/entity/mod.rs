//! Entity encoders
//!
//! Each entity kind has two shapes: a storage record carrying the key
//! attributes and the `ENTITY` discriminator, and the API-facing projection
//! carrying business fields only. `encode` builds the record from the natural
//! fields plus a server-generated id and timestamp; `project` drops the
//! storage-only attributes again.

mod group;
mod membership;
mod message;
mod typing;
mod user;

use serde::{de::DeserializeOwned, Serialize};

use crate::keys::{EntityKind, TableKey};

pub use group::{Group, GroupCreateRequest, GroupRecord};
pub use membership::{Membership, MembershipCreateRequest, MembershipRecord};
pub use message::{Message, MessageCreateRequest, MessageRecord};
pub use typing::{TypingIndicator, TypingIndicatorRecord, TypingIndicatorRequest};
pub use user::{EmailReservation, User, UserCreateRequest, UserEmailRecord, UserRecord};

/// A storable item of the single table
pub trait Record: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Value of the `ENTITY` discriminator for this record type
    const ENTITY: EntityKind;

    /// API-facing shape of the record
    type Projection;

    /// Primary key of this record
    fn table_key(&self) -> TableKey;

    /// Drops key attributes and the discriminator, keeping business fields
    fn project(self) -> Self::Projection;
}

/// Generates a new entity id
///
/// UUID v7 ids are time-ordered and monotonic within the process, so sorting
/// ids as strings yields creation order.
#[must_use]
pub fn new_id() -> String {
    uuid::Uuid::now_v7().to_string()
}

/// Server timestamp in epoch milliseconds
#[must_use]
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_ids_sort_in_creation_order() {
        let ids: Vec<String> = (0..64).map(|_| new_id()).collect();
        let mut sorted = ids.clone();
        sorted.sort();
        assert_eq!(ids, sorted);
    }

    #[test]
    fn test_new_ids_are_unique() {
        let first = new_id();
        let second = new_id();
        assert_ne!(first, second);
    }
}
