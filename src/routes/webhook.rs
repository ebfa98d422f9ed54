/**
 * Webhook Route
 * Backup capture for third-party form posts
 */
use axum::{extract::State, response::IntoResponse, Json};
use serde_json::Value;

use crate::audit::ClientInfo;
use crate::db::models::FormSource;
use crate::error::{ApiError, MessageResponse};
use crate::routes::{store_failure, JsonBody};
use crate::state::AppState;

const SOURCE: &str = "formsubmit_webhook";

fn subject(payload: &Value) -> &str {
    payload
        .get("_subject")
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .unwrap_or("Unknown")
}

/// `_source` names the originating form; anything unrecognised is a booking.
fn form_source(payload: &Value) -> FormSource {
    payload
        .get("_source")
        .and_then(Value::as_str)
        .and_then(|s| s.trim().to_lowercase().parse().ok())
        .unwrap_or(FormSource::Booking)
}

/// POST /api/formsubmit-webhook
pub async fn formsubmit_webhook(
    State(state): State<AppState>,
    client: ClientInfo,
    JsonBody(payload): JsonBody<Value>,
) -> Result<impl IntoResponse, ApiError> {
    let message = format!("FormSubmit webhook received: {}", subject(&payload));
    let source = form_source(&payload);

    if let Err(e) = state.store.insert_form_submission(source, payload).await {
        return Err(store_failure(&state, SOURCE, &client, "FormSubmit webhook error", e).await);
    }

    state.audit.info(message, SOURCE, &client).await;

    Ok(Json(MessageResponse::success("Submission received.")))
}
