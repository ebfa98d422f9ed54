/**
 * Admin Log Routes
 * Audit trail browsing and retention
 */
use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use chrono::{Duration, Utc};
use serde::Deserialize;

use super::SOURCE;
use crate::audit::ClientInfo;
use crate::db::models::{choices, LogFilter, LogLevel};
use crate::error::{ApiError, ResponseStatus};
use crate::routes::{plural, store_failure, ActionResponse, DataResponse, JsonBody};
use crate::state::AppState;

const DEFAULT_LIMIT: i64 = 100;
const MAX_LIMIT: i64 = 1000;
const DEFAULT_RETENTION_DAYS: i64 = 30;
const MAX_RETENTION_DAYS: i64 = 36_500;

#[derive(Debug, Default, Deserialize)]
pub struct LogQuery {
    pub level: Option<String>,
    pub source: Option<String>,
    pub limit: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PurgeRequest {
    pub older_than_days: Option<i64>,
}

impl LogQuery {
    fn into_filter(self) -> Result<LogFilter, ApiError> {
        let level = match self.level.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(raw.parse::<LogLevel>().map_err(|_| {
                ApiError::Validation(format!(
                    "Level must be one of: {}.",
                    choices(LogLevel::ALL)
                ))
            })?),
        };
        Ok(LogFilter {
            level,
            source: self.source.filter(|s| !s.trim().is_empty()),
            limit: self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT),
        })
    }
}

/// GET /api/admin/logs?level=&source=&limit=
pub async fn list_logs(
    State(state): State<AppState>,
    client: ClientInfo,
    Query(query): Query<LogQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let filter = query.into_filter()?;
    match state.store.list_logs(filter).await {
        Ok(logs) => Ok(Json(DataResponse::success(
            plural(logs.len() as u64, "entry", "entries"),
            logs,
        ))),
        Err(e) => Err(store_failure(&state, SOURCE, &client, "Log list error", e).await),
    }
}

/// POST /api/admin/logs/purge
pub async fn purge_logs(
    State(state): State<AppState>,
    client: ClientInfo,
    JsonBody(request): JsonBody<PurgeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let days = request.older_than_days.unwrap_or(DEFAULT_RETENTION_DAYS);
    if !(0..=MAX_RETENTION_DAYS).contains(&days) {
        return Err(ApiError::Validation(format!(
            "older_than_days must be between 0 and {}.",
            MAX_RETENTION_DAYS
        )));
    }
    let Some(cutoff) = Utc::now().checked_sub_signed(Duration::days(days)) else {
        return Err(ApiError::Validation("older_than_days is out of range.".to_string()));
    };
    let removed = match state.store.purge_logs_before(cutoff).await {
        Ok(removed) => removed,
        Err(e) => return Err(store_failure(&state, SOURCE, &client, "Log purge error", e).await),
    };

    let message = format!(
        "Deleted {} older than {} days",
        plural(removed, "log entry", "log entries"),
        days
    );
    state.audit.info(message.clone(), SOURCE, &client).await;
    Ok(Json(ActionResponse::new(ResponseStatus::Success, message, removed)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::test_support::{admin, admin_app, send, test_state};
    use axum::http::StatusCode;
    use serde_json::json;

    #[test]
    fn test_limit_is_clamped() {
        let filter = LogQuery {
            limit: Some(50_000),
            ..Default::default()
        }
        .into_filter()
        .unwrap();
        assert_eq!(filter.limit, MAX_LIMIT);
        assert!(LogQuery {
            level: Some("debug".to_string()),
            ..Default::default()
        }
        .into_filter()
        .is_err());
    }

    #[tokio::test]
    async fn test_list_by_level_and_purge() {
        let (state, _) = test_state();
        let client = ClientInfo::default();
        state.audit.info("one", "test", &client).await;
        state.audit.error("two", "test", &client).await;
        let app = admin_app(state);

        let (status, body) = send(
            app.clone(),
            admin("GET", "/api/admin/logs?level=error", None),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"].as_array().unwrap().len(), 1);
        assert_eq!(body["data"][0]["message"], "two");

        let (_, body) = send(
            app.clone(),
            admin("POST", "/api/admin/logs/purge", Some(&json!({}))),
        )
        .await;
        assert_eq!(body["affected"], 0);

        let (status, _) = send(
            app,
            admin(
                "POST",
                "/api/admin/logs/purge",
                Some(&json!({ "older_than_days": -1 })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_huge_retention_is_rejected_not_fatal() {
        let (state, _) = test_state();
        let (status, body) = send(
            admin_app(state),
            admin(
                "POST",
                "/api/admin/logs/purge",
                Some(&json!({ "older_than_days": 1_000_000_000_i64 })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], "error");
    }
}
