/**
 * Newsletter Route
 * Idempotent subscribe endpoint
 */
use axum::{extract::State, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};

use crate::audit::ClientInfo;
use crate::db::models::{choices, NewSubscription, SubscribeOutcome, SubscriptionSource};
use crate::error::{ApiError, ResponseStatus};
use crate::routes::{store_failure, JsonBody};
use crate::state::AppState;

const SOURCE: &str = "newsletter_form";

#[derive(Debug, Default, Deserialize)]
pub struct SubscribeRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub name: String,
    pub source: Option<String>,
    pub agreed_to_terms: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SubscribeResponse {
    pub status: ResponseStatus,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription_id: Option<i64>,
}

impl SubscribeRequest {
    fn validate(self) -> Result<NewSubscription, ApiError> {
        let email = self.email.trim().to_lowercase();
        if email.is_empty() {
            return Err(ApiError::Validation("Email is required.".to_string()));
        }

        let source = match self.source.as_deref().map(str::trim) {
            None | Some("") => SubscriptionSource::NewsletterSection,
            Some(raw) => raw.parse().map_err(|_| {
                ApiError::Validation(format!(
                    "Source must be one of: {}.",
                    choices(SubscriptionSource::ALL)
                ))
            })?,
        };

        let name = match self.name.trim() {
            "" => email.split('@').next().unwrap_or_default().to_string(),
            name => name.to_string(),
        };

        Ok(NewSubscription {
            email,
            name,
            source,
            agreed_to_terms: self.agreed_to_terms.unwrap_or(true),
        })
    }
}

/// POST /api/newsletter-submit
pub async fn newsletter_submit(
    State(state): State<AppState>,
    client: ClientInfo,
    JsonBody(payload): JsonBody<SubscribeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let new = payload.validate()?;
    let email = new.email.clone();

    let outcome = match state.store.subscribe(new).await {
        Ok(outcome) => outcome,
        Err(e) => {
            return Err(
                store_failure(&state, SOURCE, &client, "Newsletter subscription error", e).await,
            )
        }
    };

    let response = match outcome {
        SubscribeOutcome::AlreadySubscribed(existing) => SubscribeResponse {
            status: ResponseStatus::Info,
            message: format!(
                "You are already subscribed to our newsletter! (Subscribed on {})",
                existing.created_at.format("%Y-%m-%d")
            ),
            subscription_id: None,
        },
        SubscribeOutcome::Created(subscription) => {
            state
                .audit
                .success(
                    format!("New newsletter subscription: {}", email),
                    SOURCE,
                    &client,
                )
                .await;
            SubscribeResponse {
                status: ResponseStatus::Success,
                message: "Thank you for subscribing to our newsletter!".to_string(),
                subscription_id: Some(subscription.id),
            }
        }
    };

    Ok(Json(response))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::test_support::{post_json, send, test_state, with_peer};
    use crate::store::SiteStore;
    use axum::{http::StatusCode, routing::post, Router};
    use chrono::Utc;
    use serde_json::json;

    fn router(state: AppState) -> Router {
        with_peer(
            Router::new()
                .route("/api/newsletter-submit", post(newsletter_submit))
                .with_state(state),
        )
    }

    #[tokio::test]
    async fn test_subscribe_defaults_name_and_source() {
        let (state, store) = test_state();
        let (status, body) = send(
            router(state),
            post_json("/api/newsletter-submit", &json!({ "email": " Reader@Example.com " })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "success");
        assert!(body["subscription_id"].is_i64());

        let subs = store.list_subscriptions(None).await.unwrap();
        assert_eq!(subs[0].email, "reader@example.com");
        assert_eq!(subs[0].name, "reader");
        assert_eq!(subs[0].source, SubscriptionSource::NewsletterSection);
        assert!(subs[0].agreed_to_terms);
    }

    #[tokio::test]
    async fn test_second_subscribe_is_informational() {
        let (state, store) = test_state();
        let payload = json!({ "email": "reader@example.com", "source": "footer" });
        send(router(state.clone()), post_json("/api/newsletter-submit", &payload)).await;
        let (status, body) =
            send(router(state), post_json("/api/newsletter-submit", &payload)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "info");
        let expected = format!(
            "You are already subscribed to our newsletter! (Subscribed on {})",
            Utc::now().format("%Y-%m-%d")
        );
        assert_eq!(body["message"], expected);
        assert!(body.get("subscription_id").is_none());
        assert_eq!(store.list_subscriptions(None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_email() {
        let (state, _) = test_state();
        let (status, body) = send(
            router(state),
            post_json("/api/newsletter-submit", &json!({ "name": "x" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Email is required.");
    }

    #[tokio::test]
    async fn test_unknown_source_is_rejected() {
        let (state, _) = test_state();
        let (status, _) = send(
            router(state),
            post_json(
                "/api/newsletter-submit",
                &json!({ "email": "a@b.co", "source": "popup" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
