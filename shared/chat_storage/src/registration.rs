//! User registration
//!
//! A user item and its email reservation are written in one transaction, each
//! guarded by "key absent". The table therefore never holds a user without a
//! reservation, and neither a username nor an email can be taken twice.

use std::sync::Arc;

use thiserror::Error;
use tracing::instrument;

use crate::entity::{new_id, now_millis, Record, User, UserCreateRequest, UserEmailRecord, UserRecord};
use crate::keys::user_key;
use crate::store::{CancellationReason, ConditionalPut, SingleTableStore, StoreError, StoreResult};

/// Position of the user item in the registration transaction
const USERNAME_ITEM: usize = 0;
/// Position of the email reservation in the registration transaction
const EMAIL_ITEM: usize = 1;

/// Result type alias for registration
pub type RegistrationResult<T> = Result<T, RegistrationError>;

/// Why a registration was rejected
#[derive(Debug, Error)]
pub enum RegistrationError {
    /// Another user already has this username
    #[error("User with this username already exists.")]
    UsernameTaken,

    /// Another user already has this email
    #[error("User with this email already exists.")]
    EmailTaken,

    /// The store failed for a reason unrelated to uniqueness
    #[error("Could not create user account: {0}")]
    StoreUnavailable(#[from] StoreError),
}

/// Maps the per-item reasons of a cancelled registration to a single error
///
/// The first item that failed its precondition, in submission order, decides.
#[must_use]
pub fn classify_cancellation(reasons: Vec<CancellationReason>) -> RegistrationError {
    match reasons
        .iter()
        .position(CancellationReason::is_condition_failure)
    {
        Some(USERNAME_ITEM) => RegistrationError::UsernameTaken,
        Some(EMAIL_ITEM) => RegistrationError::EmailTaken,
        _ => RegistrationError::StoreUnavailable(StoreError::TransactionCancelled { reasons }),
    }
}

/// Storage client for user accounts
pub struct UserStorage {
    store: Arc<SingleTableStore>,
}

impl UserStorage {
    /// Creates a new storage instance
    #[must_use]
    pub const fn new(store: Arc<SingleTableStore>) -> Self {
        Self { store }
    }

    /// Registers a user, reserving the username and the email atomically
    ///
    /// # Errors
    ///
    /// Returns `RegistrationError::UsernameTaken` or
    /// `RegistrationError::EmailTaken` when the respective value is in use,
    /// and `RegistrationError::StoreUnavailable` for any other failure. No
    /// item is written in either case.
    #[instrument(skip(self, request), fields(username = %request.username))]
    pub async fn register_user(&self, request: UserCreateRequest) -> RegistrationResult<User> {
        let user = UserRecord::encode(request, new_id(), now_millis());
        let reservation = UserEmailRecord::for_user(&user);

        let puts = vec![
            ConditionalPut::if_absent(&user)?,
            ConditionalPut::if_absent(&reservation)?,
        ];

        match self.store.transact_put(puts).await {
            Ok(()) => {
                tracing::info!(user_id = %user.id, "Registered user");
                Ok(user.project())
            }
            Err(StoreError::TransactionCancelled { reasons }) => {
                let err = classify_cancellation(reasons);
                tracing::warn!("Rejected registration: {err}");
                Err(err)
            }
            Err(err) => Err(RegistrationError::StoreUnavailable(err)),
        }
    }

    /// Gets a user by username
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the `DynamoDB` get operation fails
    pub async fn get_user(&self, username: &str) -> StoreResult<Option<User>> {
        let record = self
            .store
            .get_by_key::<UserRecord>(&user_key(username))
            .await?;

        Ok(record.map(Record::project))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_username_failure_wins() {
        let err = classify_cancellation(vec![
            CancellationReason::ConditionalCheckFailed,
            CancellationReason::ConditionalCheckFailed,
        ]);
        assert!(matches!(err, RegistrationError::UsernameTaken));
    }

    #[test]
    fn test_email_failure() {
        let err = classify_cancellation(vec![
            CancellationReason::None,
            CancellationReason::ConditionalCheckFailed,
        ]);
        assert!(matches!(err, RegistrationError::EmailTaken));
        assert_eq!(err.to_string(), "User with this email already exists.");
    }

    #[test]
    fn test_non_condition_cancellation_is_unavailable() {
        let err = classify_cancellation(vec![
            CancellationReason::Other("TransactionConflict".to_string()),
            CancellationReason::None,
        ]);
        assert!(matches!(
            err,
            RegistrationError::StoreUnavailable(StoreError::TransactionCancelled { .. })
        ));
    }
}
