/**
 * Admin Subscription Routes
 * Newsletter subscriber management and export
 */
use axum::{
    extract::{Query, State},
    http::header,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;

use super::SOURCE;
use crate::audit::ClientInfo;
use crate::error::{ApiError, ResponseStatus};
use crate::routes::{plural, store_failure, ActionRequest, ActionResponse, DataResponse, JsonBody};
use crate::state::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionAction {
    Activate,
    Deactivate,
}

#[derive(Debug, Default, Deserialize)]
pub struct SubscriptionQuery {
    pub active: Option<bool>,
}

/// GET /api/admin/subscriptions?active=
pub async fn list_subscriptions(
    State(state): State<AppState>,
    client: ClientInfo,
    Query(query): Query<SubscriptionQuery>,
) -> Result<impl IntoResponse, ApiError> {
    match state.store.list_subscriptions(query.active).await {
        Ok(subs) => Ok(Json(DataResponse::success(
            plural(subs.len() as u64, "subscription", "subscriptions"),
            subs,
        ))),
        Err(e) => Err(store_failure(&state, SOURCE, &client, "Subscription list error", e).await),
    }
}

/// POST /api/admin/subscriptions/actions
pub async fn bulk_action(
    State(state): State<AppState>,
    client: ClientInfo,
    JsonBody(request): JsonBody<ActionRequest<SubscriptionAction>>,
) -> Result<impl IntoResponse, ApiError> {
    if request.ids.is_empty() {
        return Err(ApiError::Validation("No items selected.".to_string()));
    }
    let active = request.action == SubscriptionAction::Activate;
    let changed = match state.store.set_subscriptions_active(&request.ids, active).await {
        Ok(changed) => changed,
        Err(e) => {
            return Err(store_failure(&state, SOURCE, &client, "Subscription action error", e).await)
        }
    };

    let message = format!(
        "{} marked as {}",
        plural(changed, "subscription", "subscriptions"),
        if active { "active" } else { "inactive" }
    );
    state.audit.info(message.clone(), SOURCE, &client).await;
    Ok(Json(ActionResponse::new(ResponseStatus::Success, message, changed)))
}

/// GET /api/admin/subscriptions/export - active emails, one per line
pub async fn export_emails(
    State(state): State<AppState>,
    client: ClientInfo,
) -> Result<impl IntoResponse, ApiError> {
    let subs = match state.store.list_subscriptions(Some(true)).await {
        Ok(subs) => subs,
        Err(e) => {
            return Err(store_failure(&state, SOURCE, &client, "Subscription export error", e).await)
        }
    };
    let mut body = subs
        .iter()
        .map(|s| s.email.as_str())
        .collect::<Vec<_>>()
        .join("\n");
    if !body.is_empty() {
        body.push('\n');
    }
    state
        .audit
        .info(
            format!("Exported {}", plural(subs.len() as u64, "subscriber", "subscribers")),
            SOURCE,
            &client,
        )
        .await;
    Ok((
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"newsletter_subscribers.txt\"",
            ),
        ],
        body,
    ))
}

#[cfg(test)]
mod tests {
    use crate::db::models::{NewSubscription, SubscriptionSource};
    use crate::routes::test_support::{admin, admin_app, test_state};
    use crate::store::SiteStore;
    use axum::http::StatusCode;
    use serde_json::json;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_deactivate_then_export_active_only() {
        let (state, store) = test_state();
        let mut ids = Vec::new();
        for email in ["a@example.com", "b@example.com"] {
            let outcome = store
                .subscribe(NewSubscription {
                    email: email.to_string(),
                    name: String::new(),
                    source: SubscriptionSource::Footer,
                    agreed_to_terms: true,
                })
                .await
                .unwrap();
            if let crate::db::models::SubscribeOutcome::Created(s) = outcome {
                ids.push(s.id);
            }
        }
        let app = admin_app(state);

        let res = app
            .clone()
            .oneshot(admin(
                "POST",
                "/api/admin/subscriptions/actions",
                Some(&json!({ "action": "deactivate", "ids": [ids[0]] })),
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);

        let res = app
            .oneshot(admin("GET", "/api/admin/subscriptions/export", None))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert!(res.headers()["content-type"]
            .to_str()
            .unwrap()
            .starts_with("text/plain"));
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(std::str::from_utf8(&bytes).unwrap(), "b@example.com\n");
        assert_eq!(store.list_subscriptions(Some(false)).await.unwrap().len(), 1);
    }
}
