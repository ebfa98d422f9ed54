/**
 * Routes Module
 * API route handlers
 */
pub mod admin;
pub mod contact;
pub mod ebook;
pub mod health;
pub mod media;
pub mod newsletter;
pub mod page;
pub mod webhook;

use axum::{
    extract::{FromRequest, Request},
    Json,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::audit::ClientInfo;
use crate::error::{ApiError, ResponseStatus, StoreError};
use crate::state::AppState;

// ============================================================================
// Shared Request/Response Types
// ============================================================================

/// JSON body extractor whose rejection is the standard 400 envelope.
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(JsonBody(value)),
            Err(rejection) => {
                tracing::debug!(error = %rejection.body_text(), "rejected request body");
                Err(ApiError::invalid_body())
            }
        }
    }
}

/// `{status, message, data}` body used by the admin endpoints
#[derive(Debug, Serialize, Deserialize)]
pub struct DataResponse<T> {
    pub status: ResponseStatus,
    pub message: String,
    pub data: T,
}

impl<T> DataResponse<T> {
    pub fn success(message: impl Into<String>, data: T) -> Self {
        Self {
            status: ResponseStatus::Success,
            message: message.into(),
            data,
        }
    }

    pub fn warning(message: impl Into<String>, data: T) -> Self {
        Self {
            status: ResponseStatus::Warning,
            message: message.into(),
            data,
        }
    }
}

/// Bulk action request: `{action, ids}`
#[derive(Debug, Deserialize)]
pub struct ActionRequest<A> {
    pub action: A,
    #[serde(default)]
    pub ids: Vec<i64>,
}

/// Bulk action result
#[derive(Debug, Serialize, Deserialize)]
pub struct ActionResponse {
    pub status: ResponseStatus,
    pub message: String,
    pub affected: u64,
}

impl ActionResponse {
    pub fn new(status: ResponseStatus, message: impl Into<String>, affected: u64) -> Self {
        Self {
            status,
            message: message.into(),
            affected,
        }
    }
}

/// Record an unexpected store failure in the audit trail, then hide it
/// behind the generic 500 body. Conflicts pass through unchanged.
pub(crate) async fn store_failure(
    state: &AppState,
    source: &str,
    client: &ClientInfo,
    context: &str,
    err: StoreError,
) -> ApiError {
    if let StoreError::Conflict(message) = err {
        return ApiError::Conflict(message);
    }
    state
        .audit
        .error(format!("{}: {}", context, err), source, client)
        .await;
    ApiError::internal()
}

/// Singular/plural noun for action messages.
pub(crate) fn plural(count: u64, one: &str, many: &str) -> String {
    if count == 1 {
        format!("1 {}", one)
    } else {
        format!("{} {}", count, many)
    }
}
