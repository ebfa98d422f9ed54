/**
 * Admin eBook Routes
 * The single-active rule is applied by the store; these handlers report what
 * it changed.
 */
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::SOURCE;
use crate::audit::ClientInfo;
use crate::db::models::{EbookInput, EbookWrite, FreeEbook};
use crate::error::{ApiError, ResponseStatus};
use crate::routes::{plural, store_failure, ActionRequest, ActionResponse, DataResponse, JsonBody};
use crate::state::AppState;

const NONE_ACTIVE_WARNING: &str =
    "No active eBooks will remain. Newsletter subscribers won't see any free eBook offer.";
const OTHERS_DEACTIVATED: &str =
    "Other eBooks have been deactivated. Only one eBook can be active at a time.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EbookAction {
    Deactivate,
    ResetDownloads,
    Delete,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EbookStats {
    pub id: i64,
    pub title: String,
    pub is_active: bool,
    pub download_count: i64,
    /// Whole days since creation, at least 1.
    pub days_live: i64,
    pub average_per_day: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatsSummary {
    pub total_downloads: i64,
    pub ebooks: Vec<EbookStats>,
}

fn stats_for(ebook: &FreeEbook, now: chrono::DateTime<Utc>) -> EbookStats {
    let days_live = (now - ebook.created_at).num_days().max(1);
    let average = ebook.download_count as f64 / days_live as f64;
    EbookStats {
        id: ebook.id,
        title: ebook.title.clone(),
        is_active: ebook.is_active,
        download_count: ebook.download_count,
        days_live,
        average_per_day: (average * 10.0).round() / 10.0,
    }
}

fn check(input: &EbookInput) -> Result<(), ApiError> {
    if input.title.trim().is_empty() {
        return Err(ApiError::Validation("Title is required.".to_string()));
    }
    Ok(())
}

/// Envelope for a write, with the single-active side effects spelled out.
fn write_response(done: &str, write: EbookWrite) -> DataResponse<FreeEbook> {
    if write.none_active {
        DataResponse::warning(format!("{} {}", done, NONE_ACTIVE_WARNING), write.ebook)
    } else if write.deactivated_others > 0 {
        DataResponse::success(format!("{} {}", done, OTHERS_DEACTIVATED), write.ebook)
    } else {
        DataResponse::success(done, write.ebook)
    }
}

/// GET /api/admin/ebooks
pub async fn list_ebooks(
    State(state): State<AppState>,
    client: ClientInfo,
) -> Result<impl IntoResponse, ApiError> {
    match state.store.list_ebooks().await {
        Ok(ebooks) => Ok(Json(DataResponse::success(
            plural(ebooks.len() as u64, "eBook", "eBooks"),
            ebooks,
        ))),
        Err(e) => Err(store_failure(&state, SOURCE, &client, "eBook list error", e).await),
    }
}

/// POST /api/admin/ebooks
pub async fn create_ebook(
    State(state): State<AppState>,
    client: ClientInfo,
    JsonBody(input): JsonBody<EbookInput>,
) -> Result<impl IntoResponse, ApiError> {
    check(&input)?;
    let write = match state.store.insert_ebook(input).await {
        Ok(write) => write,
        Err(e) => return Err(store_failure(&state, SOURCE, &client, "eBook create error", e).await),
    };
    state
        .audit
        .info(
            format!("Created eBook #{}: {}", write.ebook.id, write.ebook.title),
            SOURCE,
            &client,
        )
        .await;
    Ok((
        StatusCode::CREATED,
        Json(write_response("eBook created.", write)),
    ))
}

/// PUT /api/admin/ebooks/{id}
pub async fn update_ebook(
    State(state): State<AppState>,
    client: ClientInfo,
    Path(id): Path<i64>,
    JsonBody(input): JsonBody<EbookInput>,
) -> Result<impl IntoResponse, ApiError> {
    check(&input)?;
    match state.store.update_ebook(id, input).await {
        Ok(Some(write)) => {
            state
                .audit
                .info(format!("Updated eBook #{}", id), SOURCE, &client)
                .await;
            Ok(Json(write_response("eBook updated.", write)))
        }
        Ok(None) => Err(ApiError::NotFound("Ebook not found".to_string())),
        Err(e) => Err(store_failure(&state, SOURCE, &client, "eBook update error", e).await),
    }
}

/// POST /api/admin/ebooks/{id}/activate
pub async fn activate_ebook(
    State(state): State<AppState>,
    client: ClientInfo,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    match state.store.activate_ebook(id).await {
        Ok(Some(write)) => {
            state
                .audit
                .info(
                    format!("Activated eBook #{}: {}", id, write.ebook.title),
                    SOURCE,
                    &client,
                )
                .await;
            Ok(Json(write_response("eBook activated.", write)))
        }
        Ok(None) => Err(ApiError::NotFound("Ebook not found".to_string())),
        Err(e) => Err(store_failure(&state, SOURCE, &client, "eBook activate error", e).await),
    }
}

/// DELETE /api/admin/ebooks/{id}
pub async fn delete_ebook(
    State(state): State<AppState>,
    client: ClientInfo,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    match state.store.delete_ebooks(&[id]).await {
        Ok(0) => Err(ApiError::NotFound("Ebook not found".to_string())),
        Ok(_) => {
            state
                .audit
                .info(format!("Deleted eBook #{}", id), SOURCE, &client)
                .await;
            Ok(StatusCode::NO_CONTENT)
        }
        Err(e) => Err(store_failure(&state, SOURCE, &client, "eBook delete error", e).await),
    }
}

/// POST /api/admin/ebooks/actions
pub async fn bulk_action(
    State(state): State<AppState>,
    client: ClientInfo,
    JsonBody(request): JsonBody<ActionRequest<EbookAction>>,
) -> Result<impl IntoResponse, ApiError> {
    if request.ids.is_empty() {
        return Err(ApiError::Validation("No items selected.".to_string()));
    }
    let ids = &request.ids;

    let result = match request.action {
        EbookAction::Deactivate => state.store.deactivate_ebooks(ids).await.map(|(n, none)| {
            let message = format!("{} marked as inactive", plural(n, "eBook", "eBooks"));
            if none {
                (n, ResponseStatus::Warning, format!("{}. {}", message, NONE_ACTIVE_WARNING))
            } else {
                (n, ResponseStatus::Success, message)
            }
        }),
        EbookAction::ResetDownloads => state.store.reset_download_counts(ids).await.map(|n| {
            (
                n,
                ResponseStatus::Success,
                format!("Reset download count to 0 for {} eBook(s)", n),
            )
        }),
        EbookAction::Delete => state.store.delete_ebooks(ids).await.map(|n| {
            (
                n,
                ResponseStatus::Success,
                format!("{} deleted", plural(n, "eBook", "eBooks")),
            )
        }),
    };
    let (affected, status, message) = match result {
        Ok(outcome) => outcome,
        Err(e) => return Err(store_failure(&state, SOURCE, &client, "eBook action error", e).await),
    };

    state
        .audit
        .info(format!("eBook action: {}", message), SOURCE, &client)
        .await;
    Ok(Json(ActionResponse::new(status, message, affected)))
}

/// GET /api/admin/ebooks/stats
pub async fn download_stats(
    State(state): State<AppState>,
    client: ClientInfo,
) -> Result<impl IntoResponse, ApiError> {
    let ebooks = match state.store.list_ebooks().await {
        Ok(ebooks) => ebooks,
        Err(e) => return Err(store_failure(&state, SOURCE, &client, "eBook stats error", e).await),
    };
    let now = Utc::now();
    let summary = StatsSummary {
        total_downloads: ebooks.iter().map(|e| e.download_count).sum(),
        ebooks: ebooks.iter().map(|e| stats_for(e, now)).collect(),
    };
    Ok(Json(DataResponse::success("Download statistics", summary)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::test_support::{admin, admin_app, send, test_state};
    use crate::store::SiteStore;
    use serde_json::json;

    async fn active_titles(store: &crate::store::MemoryStore) -> Vec<String> {
        store
            .list_ebooks()
            .await
            .unwrap()
            .into_iter()
            .filter(|e| e.is_active)
            .map(|e| e.title)
            .collect()
    }

    #[test]
    fn test_stats_days_live_is_at_least_one() {
        let now = Utc::now();
        let ebook = FreeEbook {
            id: 1,
            title: "Guide".to_string(),
            subtitle: String::new(),
            description: String::new(),
            ebook_file: None,
            cover_image: None,
            is_active: true,
            download_count: 7,
            created_at: now - chrono::Duration::hours(3),
            updated_at: now,
        };
        let stats = stats_for(&ebook, now);
        assert_eq!(stats.days_live, 1);
        assert_eq!(stats.average_per_day, 7.0);

        let older = FreeEbook {
            created_at: now - chrono::Duration::days(4),
            ..ebook
        };
        assert_eq!(stats_for(&older, now).average_per_day, 1.8);
    }

    #[tokio::test]
    async fn test_creating_active_ebook_reports_deactivation() {
        let (state, store) = test_state();
        let app = admin_app(state);

        let (status, body) = send(
            app.clone(),
            admin("POST", "/api/admin/ebooks", Some(&json!({ "title": "A" }))),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["message"], "eBook created.");

        let (_, body) = send(
            app,
            admin("POST", "/api/admin/ebooks", Some(&json!({ "title": "B" }))),
        )
        .await;
        assert_eq!(body["status"], "success");
        assert!(body["message"].as_str().unwrap().contains("Only one eBook"));
        assert_eq!(active_titles(&store).await, vec!["B".to_string()]);
    }

    #[tokio::test]
    async fn test_activate_switches_active_ebook() {
        let (state, store) = test_state();
        let a = store
            .insert_ebook(EbookInput {
                title: "A".to_string(),
                ..EbookInput::default()
            })
            .await
            .unwrap()
            .ebook;
        let b = store
            .insert_ebook(EbookInput {
                title: "B".to_string(),
                is_active: false,
                ..EbookInput::default()
            })
            .await
            .unwrap()
            .ebook;
        assert_eq!(active_titles(&store).await, vec![a.title.clone()]);

        let (status, _) = send(
            admin_app(state),
            admin("POST", &format!("/api/admin/ebooks/{}/activate", b.id), None),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(active_titles(&store).await, vec!["B".to_string()]);
    }

    #[tokio::test]
    async fn test_deactivating_last_active_warns() {
        let (state, store) = test_state();
        let id = store
            .insert_ebook(EbookInput::default())
            .await
            .unwrap()
            .ebook
            .id;

        let (status, body) = send(
            admin_app(state),
            admin(
                "POST",
                "/api/admin/ebooks/actions",
                Some(&json!({ "action": "deactivate", "ids": [id] })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "warning");
        assert_eq!(body["affected"], 1);
        assert!(active_titles(&store).await.is_empty());
    }

    #[tokio::test]
    async fn test_reset_downloads_and_stats() {
        let (state, store) = test_state();
        let id = store
            .insert_ebook(EbookInput::default())
            .await
            .unwrap()
            .ebook
            .id;
        for _ in 0..3 {
            store.increment_download(id).await.unwrap();
        }
        let app = admin_app(state);

        let (_, body) = send(app.clone(), admin("GET", "/api/admin/ebooks/stats", None)).await;
        assert_eq!(body["data"]["total_downloads"], 3);
        assert_eq!(body["data"]["ebooks"][0]["days_live"], 1);

        let (_, body) = send(
            app,
            admin(
                "POST",
                "/api/admin/ebooks/actions",
                Some(&json!({ "action": "reset_downloads", "ids": [id] })),
            ),
        )
        .await;
        assert_eq!(body["message"], "Reset download count to 0 for 1 eBook(s)");
        assert_eq!(store.get_ebook(id).await.unwrap().unwrap().download_count, 0);
    }

    #[tokio::test]
    async fn test_update_cannot_touch_download_count() {
        let (state, store) = test_state();
        let id = store
            .insert_ebook(EbookInput::default())
            .await
            .unwrap()
            .ebook
            .id;
        store.increment_download(id).await.unwrap();

        let (status, body) = send(
            admin_app(state),
            admin(
                "PUT",
                &format!("/api/admin/ebooks/{}", id),
                Some(&json!({ "title": "Renamed", "download_count": 0 })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["title"], "Renamed");
        assert_eq!(body["data"]["download_count"], 1);
    }
}
