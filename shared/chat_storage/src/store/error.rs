//! Error types for single-table store operations

use thiserror::Error;

/// Result type alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Store error types
#[derive(Debug, Error)]
pub enum StoreError {
    /// A conditional put found its key already present
    #[error("Item already exists")]
    AlreadyExists,

    /// A transactional write was rejected as a whole
    ///
    /// `reasons` holds one entry per submitted item, in submission order.
    #[error("Transaction cancelled: {reasons:?}")]
    TransactionCancelled {
        /// Per-item outcomes in submission order
        reasons: Vec<CancellationReason>,
    },

    /// The backend call failed for reasons unrelated to a precondition
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// Failed to convert between a record and a `DynamoDB` item
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// A pagination token could not be decoded
    #[error("Invalid continuation token")]
    InvalidContinuationToken,
}

impl StoreError {
    /// Wraps a backend failure, logging the underlying error
    pub(crate) fn unavailable(operation: &str, err: &impl std::fmt::Debug) -> Self {
        tracing::error!("DynamoDB {operation} failed: {err:?}");
        Self::Unavailable(format!("{operation}: {err:?}"))
    }
}

impl From<serde_dynamo::Error> for StoreError {
    fn from(err: serde_dynamo::Error) -> Self {
        Self::SerializationError(err.to_string())
    }
}

/// Outcome of one item in a cancelled transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CancellationReason {
    /// The item passed its precondition; the transaction failed elsewhere
    None,
    /// The item's precondition did not hold
    ConditionalCheckFailed,
    /// Any other backend code (conflict, throttling, validation, ...)
    Other(String),
}

impl CancellationReason {
    /// Maps a raw backend cancellation code
    ///
    /// This is the only place that knows the backend's code strings.
    #[must_use]
    pub fn from_code(code: Option<&str>) -> Self {
        match code {
            None | Some("None") => Self::None,
            Some("ConditionalCheckFailed") => Self::ConditionalCheckFailed,
            Some(other) => Self::Other(other.to_string()),
        }
    }

    /// Whether this item failed its own precondition
    #[must_use]
    pub const fn is_condition_failure(&self) -> bool {
        matches!(self, Self::ConditionalCheckFailed)
    }
}

/// Classifies the ordered list of raw codes from a cancelled transaction
pub fn classify_cancellation_codes<'a>(
    codes: impl IntoIterator<Item = Option<&'a str>>,
) -> Vec<CancellationReason> {
    codes.into_iter().map(CancellationReason::from_code).collect()
}
