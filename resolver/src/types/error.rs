//! Universal error handling for the API

use aide::OperationOutput;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chat_storage::{registration::RegistrationError, store::StoreError};
use schemars::JsonSchema;
use serde::Serialize;

/// API error response envelope
#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApiErrorResponse {
    /// Whether the client should retry the request
    pub allow_retry: bool,
    /// Error details
    error: ErrorBody,
}

/// Error body containing code and message
#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    /// Machine-readable error code
    pub code: &'static str,
    /// Human-readable error message
    pub message: &'static str,
}

/// Application error type that wraps the API error response
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    inner: ApiErrorResponse,
}

impl AppError {
    /// Create a new application error
    #[must_use]
    pub const fn new(
        status: StatusCode,
        code: &'static str,
        msg: &'static str,
        retry: bool,
    ) -> Self {
        Self {
            status,
            inner: ApiErrorResponse {
                allow_retry: retry,
                error: ErrorBody { code, message: msg },
            },
        }
    }

    /// Request failed input validation
    #[must_use]
    pub const fn validation() -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            "validation_error",
            "Request validation failed",
            false,
        )
    }

    /// Unexpected failure inside the service
    #[must_use]
    pub const fn internal() -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal_error",
            "Internal server error",
            false,
        )
    }

    /// HTTP status of this error
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Machine-readable error code
    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.inner.error.code
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log the error based on status code
        match self.status.as_u16() {
            400..=499 => tracing::warn!(
                "Client error: {} - {}",
                self.inner.error.code,
                self.inner.error.message
            ),
            500..=599 => tracing::error!(
                "Server error: {} - {}",
                self.inner.error.code,
                self.inner.error.message
            ),
            _ => {}
        }

        (self.status, Json(self.inner)).into_response()
    }
}

/// Convert registration rejections to application errors
impl From<RegistrationError> for AppError {
    fn from(err: RegistrationError) -> Self {
        match err {
            RegistrationError::UsernameTaken => Self::new(
                StatusCode::CONFLICT,
                "username_taken",
                "User with this username already exists.",
                false,
            ),
            RegistrationError::EmailTaken => Self::new(
                StatusCode::CONFLICT,
                "email_taken",
                "User with this email already exists.",
                false,
            ),
            RegistrationError::StoreUnavailable(err) => {
                tracing::error!("Could not create user account: {err}");
                Self::new(
                    StatusCode::SERVICE_UNAVAILABLE,
                    "registration_failed",
                    "Could not create user account",
                    true,
                )
            }
        }
    }
}

/// Convert store errors to application errors
impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match &err {
            StoreError::AlreadyExists => {
                tracing::debug!("Item already exists");
                Self::new(
                    StatusCode::CONFLICT,
                    "already_exists",
                    "Item already exists",
                    false,
                )
            }
            StoreError::TransactionCancelled { reasons } => {
                tracing::warn!("Transaction cancelled: {reasons:?}");
                Self::new(
                    StatusCode::CONFLICT,
                    "transaction_cancelled",
                    "Write was rejected, try again",
                    true,
                )
            }
            StoreError::Unavailable(msg) => {
                tracing::error!("DynamoDB upstream error: {msg}");
                Self::new(
                    StatusCode::SERVICE_UNAVAILABLE,
                    "upstream_error",
                    "Storage temporarily unavailable",
                    true,
                )
            }
            StoreError::SerializationError(msg) => {
                tracing::error!("Stored item is malformed: {msg}");
                Self::internal()
            }
            StoreError::InvalidContinuationToken => Self::new(
                StatusCode::BAD_REQUEST,
                "invalid_next_token",
                "Invalid pagination token",
                false,
            ),
        }
    }
}

impl OperationOutput for AppError {
    type Inner = ApiErrorResponse;

    fn operation_response(
        ctx: &mut aide::generate::GenContext,
        operation: &mut aide::openapi::Operation,
    ) -> Option<aide::openapi::Response> {
        Json::<ApiErrorResponse>::operation_response(ctx, operation)
    }
}
