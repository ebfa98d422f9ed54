/**
 * Admin Settings Routes
 * The single site settings record
 */
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};

use super::SOURCE;
use crate::audit::ClientInfo;
use crate::db::models::SiteSettingsInput;
use crate::error::ApiError;
use crate::routes::{store_failure, DataResponse, JsonBody};
use crate::state::AppState;

fn check(input: &SiteSettingsInput) -> Result<(), ApiError> {
    let blank = |v: &Option<String>| v.as_deref().is_some_and(|s| s.trim().is_empty());
    if blank(&input.site_name) {
        return Err(ApiError::Validation("Site Name cannot be blank.".to_string()));
    }
    if blank(&input.contact_email) {
        return Err(ApiError::Validation("Contact Email cannot be blank.".to_string()));
    }
    Ok(())
}

/// GET /api/admin/settings
pub async fn get_settings(
    State(state): State<AppState>,
    client: ClientInfo,
) -> Result<impl IntoResponse, ApiError> {
    match state.store.settings_or_default().await {
        Ok(settings) => Ok(Json(DataResponse::success("Site settings", settings))),
        Err(e) => Err(store_failure(&state, SOURCE, &client, "Settings read error", e).await),
    }
}

/// POST /api/admin/settings - only while none exist
pub async fn create_settings(
    State(state): State<AppState>,
    client: ClientInfo,
    JsonBody(input): JsonBody<SiteSettingsInput>,
) -> Result<impl IntoResponse, ApiError> {
    check(&input)?;
    let created = match state.store.create_settings(input).await {
        Ok(created) => created,
        Err(e) => return Err(store_failure(&state, SOURCE, &client, "Settings create error", e).await),
    };
    let Some(settings) = created else {
        return Err(ApiError::Conflict(
            "Site settings already exist. Edit the existing settings instead.".to_string(),
        ));
    };

    state.audit.info("Site settings created", SOURCE, &client).await;
    Ok((
        StatusCode::CREATED,
        Json(DataResponse::success("Site settings created.", settings)),
    ))
}

/// PUT /api/admin/settings
pub async fn update_settings(
    State(state): State<AppState>,
    client: ClientInfo,
    JsonBody(input): JsonBody<SiteSettingsInput>,
) -> Result<impl IntoResponse, ApiError> {
    check(&input)?;
    match state.store.update_settings(input).await {
        Ok(settings) => {
            state.audit.info("Site settings updated", SOURCE, &client).await;
            Ok(Json(DataResponse::success("Site settings updated.", settings)))
        }
        Err(e) => Err(store_failure(&state, SOURCE, &client, "Settings update error", e).await),
    }
}
