/**
 * Admin Routes
 * Data and bulk actions behind the admin bearer secret
 */
pub mod contacts;
pub mod content;
pub mod ebooks;
pub mod logs;
pub mod settings;
pub mod submissions;
pub mod subscriptions;

use axum::{
    extract::{DefaultBodyLimit, Request, State},
    http::header,
    middleware::{self, Next},
    response::Response,
    routing::{get, post, put},
    Router,
};
use sha2::{Digest, Sha256};

use crate::error::ApiError;
use crate::routes::media;
use crate::state::AppState;

/// Audit source tag for admin writes.
pub(crate) const SOURCE: &str = "admin";

/// Lowercase sha256 hex, the format ADMIN_TOKEN_HASH is stored in.
pub fn hash_admin_token(token: &str) -> String {
    format!("{:x}", Sha256::digest(token.as_bytes()))
}

fn bearer_token(request: &Request) -> Option<&str> {
    request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

pub async fn require_admin(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(expected) = state.config.admin_token_hash.as_deref() else {
        return Err(ApiError::Unavailable(
            "Admin access is not configured.".to_string(),
        ));
    };
    let Some(token) = bearer_token(&request) else {
        return Err(ApiError::Unauthorized("Authorization required".to_string()));
    };
    if hash_admin_token(token) != expected {
        tracing::warn!(path = %request.uri().path(), "rejected admin token");
        return Err(ApiError::Unauthorized("Invalid admin token".to_string()));
    }
    Ok(next.run(request).await)
}

pub fn router(state: &AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/settings",
            get(settings::get_settings)
                .post(settings::create_settings)
                .put(settings::update_settings),
        )
        .route(
            "/content/{kind}",
            get(content::list_blocks).post(content::create_block),
        )
        .route("/content/{kind}/actions", post(content::bulk_action))
        .route(
            "/content/{kind}/{id}",
            get(content::get_block)
                .put(content::update_block)
                .delete(content::delete_block),
        )
        .route("/ebooks", get(ebooks::list_ebooks).post(ebooks::create_ebook))
        .route("/ebooks/stats", get(ebooks::download_stats))
        .route("/ebooks/actions", post(ebooks::bulk_action))
        .route(
            "/ebooks/{id}",
            put(ebooks::update_ebook).delete(ebooks::delete_ebook),
        )
        .route("/ebooks/{id}/activate", post(ebooks::activate_ebook))
        .route("/contacts", get(contacts::list_contacts))
        .route("/contacts/actions", post(contacts::bulk_action))
        .route(
            "/contacts/{id}",
            get(contacts::get_contact).patch(contacts::update_contact),
        )
        .route("/subscriptions", get(subscriptions::list_subscriptions))
        .route("/subscriptions/actions", post(subscriptions::bulk_action))
        .route("/subscriptions/export", get(subscriptions::export_emails))
        .route("/logs", get(logs::list_logs))
        .route("/logs/purge", post(logs::purge_logs))
        .route("/form-submissions", get(submissions::list_submissions))
        .route("/form-submissions/export", get(submissions::export_submissions))
        .route(
            "/media/{folder}",
            post(media::upload_media).layer(DefaultBodyLimit::max(state.config.max_upload_bytes)),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), require_admin))
}
