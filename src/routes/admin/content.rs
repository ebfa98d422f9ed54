/**
 * Admin Content Routes
 * CRUD and bulk actions for every content block kind
 */
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::Value;

use super::SOURCE;
use crate::audit::ClientInfo;
use crate::db::models::{choices, BlockFilter, ContentBlockInput, ContentKind};
use crate::error::{ApiError, ResponseStatus};
use crate::routes::{plural, store_failure, ActionRequest, ActionResponse, DataResponse, JsonBody};
use crate::state::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentAction {
    Activate,
    Deactivate,
    Duplicate,
    Delete,
}

#[derive(Debug, Default, Deserialize)]
pub struct ContentListQuery {
    pub active: Option<bool>,
}

fn parse_kind(raw: &str) -> Result<ContentKind, ApiError> {
    raw.parse().map_err(|_| {
        ApiError::NotFound(format!(
            "Unknown content kind '{}'. Expected one of: {}.",
            raw,
            choices(ContentKind::ALL)
        ))
    })
}

/// Decode a block body for `kind`; the path decides the kind, not the body.
fn parse_input(kind: ContentKind, mut body: Value) -> Result<ContentBlockInput, ApiError> {
    let Some(fields) = body.as_object_mut() else {
        return Err(ApiError::invalid_body());
    };
    fields.insert("kind".to_string(), Value::String(kind.as_str().to_string()));

    let input: ContentBlockInput = serde_json::from_value(body)
        .map_err(|e| ApiError::Validation(format!("Invalid {} content: {}", kind, e)))?;
    input.validate().map_err(ApiError::Validation)?;
    Ok(input)
}

/// GET /api/admin/content/{kind}?active=
pub async fn list_blocks(
    State(state): State<AppState>,
    client: ClientInfo,
    Path(kind): Path<String>,
    Query(query): Query<ContentListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let kind = parse_kind(&kind)?;
    let filter = BlockFilter {
        active_only: query.active == Some(true),
        limit: None,
    };
    let mut blocks = match state.store.list_blocks(kind, filter).await {
        Ok(blocks) => blocks,
        Err(e) => return Err(store_failure(&state, SOURCE, &client, "Content list error", e).await),
    };
    if query.active == Some(false) {
        blocks.retain(|b| !b.is_active);
    }
    Ok(Json(DataResponse::success(
        plural(blocks.len() as u64, "block", "blocks"),
        blocks,
    )))
}

/// GET /api/admin/content/{kind}/{id}
pub async fn get_block(
    State(state): State<AppState>,
    client: ClientInfo,
    Path((kind, id)): Path<(String, i64)>,
) -> Result<impl IntoResponse, ApiError> {
    let kind = parse_kind(&kind)?;
    match state.store.get_block(kind, id).await {
        Ok(Some(block)) => Ok(Json(DataResponse::success("Content block", block))),
        Ok(None) => Err(ApiError::NotFound("Content block not found".to_string())),
        Err(e) => Err(store_failure(&state, SOURCE, &client, "Content read error", e).await),
    }
}

/// POST /api/admin/content/{kind}
pub async fn create_block(
    State(state): State<AppState>,
    client: ClientInfo,
    Path(kind): Path<String>,
    JsonBody(body): JsonBody<Value>,
) -> Result<impl IntoResponse, ApiError> {
    let kind = parse_kind(&kind)?;
    let input = parse_input(kind, body)?;

    let block = match state.store.insert_block(input).await {
        Ok(block) => block,
        Err(e) => return Err(store_failure(&state, SOURCE, &client, "Content create error", e).await),
    };

    state
        .audit
        .info(
            format!("Created {} block #{}: {}", kind, block.id, block.title),
            SOURCE,
            &client,
        )
        .await;
    Ok((
        StatusCode::CREATED,
        Json(DataResponse::success("Content block created.", block)),
    ))
}

/// PUT /api/admin/content/{kind}/{id}
pub async fn update_block(
    State(state): State<AppState>,
    client: ClientInfo,
    Path((kind, id)): Path<(String, i64)>,
    JsonBody(body): JsonBody<Value>,
) -> Result<impl IntoResponse, ApiError> {
    let kind = parse_kind(&kind)?;
    let input = parse_input(kind, body)?;

    match state.store.update_block(id, input).await {
        Ok(Some(block)) => {
            state
                .audit
                .info(format!("Updated {} block #{}", kind, id), SOURCE, &client)
                .await;
            Ok(Json(DataResponse::success("Content block updated.", block)))
        }
        Ok(None) => Err(ApiError::NotFound("Content block not found".to_string())),
        Err(e) => Err(store_failure(&state, SOURCE, &client, "Content update error", e).await),
    }
}

/// DELETE /api/admin/content/{kind}/{id}
pub async fn delete_block(
    State(state): State<AppState>,
    client: ClientInfo,
    Path((kind, id)): Path<(String, i64)>,
) -> Result<impl IntoResponse, ApiError> {
    let kind = parse_kind(&kind)?;
    match state.store.delete_blocks(kind, &[id]).await {
        Ok(0) => Err(ApiError::NotFound("Content block not found".to_string())),
        Ok(_) => {
            state
                .audit
                .info(format!("Deleted {} block #{}", kind, id), SOURCE, &client)
                .await;
            Ok(StatusCode::NO_CONTENT)
        }
        Err(e) => Err(store_failure(&state, SOURCE, &client, "Content delete error", e).await),
    }
}

/// POST /api/admin/content/{kind}/actions
pub async fn bulk_action(
    State(state): State<AppState>,
    client: ClientInfo,
    Path(kind): Path<String>,
    JsonBody(request): JsonBody<ActionRequest<ContentAction>>,
) -> Result<impl IntoResponse, ApiError> {
    let kind = parse_kind(&kind)?;
    if request.ids.is_empty() {
        return Err(ApiError::Validation("No items selected.".to_string()));
    }
    let ids = &request.ids;
    let store = &state.store;

    let result = match request.action {
        ContentAction::Activate => store
            .set_blocks_active(kind, ids, true)
            .await
            .map(|n| (n, "marked as active")),
        ContentAction::Deactivate => store
            .set_blocks_active(kind, ids, false)
            .await
            .map(|n| (n, "marked as inactive")),
        ContentAction::Duplicate => store
            .duplicate_blocks(kind, ids)
            .await
            .map(|copies| (copies.len() as u64, "duplicated")),
        ContentAction::Delete => store
            .delete_blocks(kind, ids)
            .await
            .map(|n| (n, "deleted")),
    };
    let (affected, verb) = match result {
        Ok(outcome) => outcome,
        Err(e) => return Err(store_failure(&state, SOURCE, &client, "Content action error", e).await),
    };

    let message = format!("{} {}", plural(affected, "item", "items"), verb);
    state
        .audit
        .info(format!("{} block action: {}", kind, message), SOURCE, &client)
        .await;
    Ok(Json(ActionResponse::new(
        ResponseStatus::Success,
        message,
        affected,
    )))
}
