/**
 * Admin Form Submission Routes
 * Captured webhook payloads
 */
use axum::{extract::State, http::header, response::IntoResponse, Json};

use super::SOURCE;
use crate::audit::ClientInfo;
use crate::error::ApiError;
use crate::routes::{plural, store_failure, DataResponse};
use crate::state::AppState;

/// GET /api/admin/form-submissions
pub async fn list_submissions(
    State(state): State<AppState>,
    client: ClientInfo,
) -> Result<impl IntoResponse, ApiError> {
    match state.store.list_form_submissions().await {
        Ok(rows) => Ok(Json(DataResponse::success(
            plural(rows.len() as u64, "submission", "submissions"),
            rows,
        ))),
        Err(e) => Err(store_failure(&state, SOURCE, &client, "Form submission list error", e).await),
    }
}

/// GET /api/admin/form-submissions/export - pretty JSON download
pub async fn export_submissions(
    State(state): State<AppState>,
    client: ClientInfo,
) -> Result<impl IntoResponse, ApiError> {
    let rows = match state.store.list_form_submissions().await {
        Ok(rows) => rows,
        Err(e) => {
            return Err(
                store_failure(&state, SOURCE, &client, "Form submission export error", e).await,
            )
        }
    };
    let body = serde_json::to_string_pretty(&rows).map_err(|e| {
        tracing::error!(error = %e, "failed to serialize form submissions");
        ApiError::internal()
    })?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/json"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"form_submissions.json\"",
            ),
        ],
        body,
    ))
}
