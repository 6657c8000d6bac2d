use axum::{Extension, Json};
use serde_json::Value;

use crate::{operation::Operation, state::ChatServices, types::AppError, types::ValidatedJson};

/// Resolve a single field
///
/// Runs one operation and returns its result as plain JSON. Lookups that find
/// nothing return `null`.
///
/// # Errors
///
/// Returns an error if:
/// - `400 BAD_REQUEST` - Unknown field, malformed or invalid arguments, or a bad `nextToken`
/// - `409 CONFLICT` - Username or email already taken
/// - `503 SERVICE_UNAVAILABLE` - Storage failure; the caller may retry
pub async fn handler(
    Extension(services): Extension<ChatServices>,
    ValidatedJson(operation): ValidatedJson<Operation>,
) -> Result<Json<Value>, AppError> {
    tracing::debug!(field = operation.field(), "Resolving field");

    let result = operation.execute(&services).await?;

    Ok(Json(result))
}
