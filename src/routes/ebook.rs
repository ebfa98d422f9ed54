/**
 * eBook Route
 * Counted download of the active free eBook
 */
use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::audit::ClientInfo;
use crate::error::{ApiError, ResponseStatus};
use crate::routes::store_failure;
use crate::state::AppState;

const SOURCE: &str = "ebook_download";

#[derive(Debug, Serialize, Deserialize)]
pub struct DownloadResponse {
    pub status: ResponseStatus,
    pub download_url: String,
    pub title: String,
}

/// POST /api/download-ebook/{id}
pub async fn download_ebook(
    State(state): State<AppState>,
    client: ClientInfo,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let ebook = match state.store.increment_download(id).await {
        Ok(Some(ebook)) => ebook,
        Ok(None) => return Err(ApiError::NotFound("Ebook not found".to_string())),
        Err(e) => {
            return Err(store_failure(&state, SOURCE, &client, "Ebook download error", e).await)
        }
    };

    state
        .audit
        .info(
            format!("Ebook download: {} by {}", ebook.title, client.ip_or_unknown()),
            SOURCE,
            &client,
        )
        .await;

    Ok(Json(DownloadResponse {
        status: ResponseStatus::Success,
        download_url: ebook.ebook_file.unwrap_or_default(),
        title: ebook.title,
    }))
}
