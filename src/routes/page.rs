/**
 * Page Route
 * Assembles every active content block into one JSON document
 */
use axum::{
    extract::{Query, State},
    http::header,
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use std::collections::HashMap;

use crate::audit::ClientInfo;
use crate::content::{self, Segment};
use crate::db::models::{BlockFilter, ContentBlock, ContentBody, ContentKind, FreeEbook, SiteSettings};
use crate::error::ApiError;
use crate::routes::store_failure;
use crate::state::AppState;
use crate::store::StoreResult;

const GALLERY_LIMIT: i64 = 6;
const SOURCE: &str = "home_view";

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct AboutView {
    #[serde(flatten)]
    pub block: ContentBlock,
    pub segments: Vec<Segment>,
    pub html: String,
    pub bullet_list: Vec<String>,
    pub has_long_content: bool,
    /// Long content and a second image to put beside it.
    pub show_second_image: bool,
}

#[derive(Debug, Serialize)]
pub struct ServiceView {
    #[serde(flatten)]
    pub block: ContentBlock,
    pub topic_list: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct NewsletterView {
    #[serde(flatten)]
    pub block: ContentBlock,
    pub benefit_list: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct PageResponse {
    pub site_settings: SiteSettings,
    pub hero_images: Vec<ContentBlock>,
    pub about_section: Option<AboutView>,
    pub services: Vec<ServiceView>,
    pub results: Vec<ContentBlock>,
    pub gallery_images: Vec<ContentBlock>,
    pub testimonials: Vec<ContentBlock>,
    pub newsletter: Option<NewsletterView>,
    pub free_ebook: Option<FreeEbook>,
    pub subscribed: bool,
}

// ============================================================================
// View Builders
// ============================================================================

fn about_view(block: ContentBlock) -> AboutView {
    let (text, has_image_2, bullets) = match &block.body {
        ContentBody::About {
            content,
            image_2,
            bullet_points,
        } => (
            content.as_str(),
            image_2.as_deref().is_some_and(|img| !img.is_empty()),
            bullet_points.as_str(),
        ),
        _ => ("", false, ""),
    };
    let segments = content::format_content(text);
    let has_long_content = content::has_long_content(text);

    AboutView {
        html: content::render_html(&segments),
        bullet_list: content::split_lines(bullets),
        show_second_image: has_long_content && has_image_2,
        has_long_content,
        segments,
        block,
    }
}

fn service_view(block: ContentBlock) -> ServiceView {
    let topic_list = match &block.body {
        ContentBody::Service { topics, .. } => content::split_commas(topics),
        _ => Vec::new(),
    };
    ServiceView { block, topic_list }
}

fn newsletter_view(block: ContentBlock) -> NewsletterView {
    let benefit_list = match &block.body {
        ContentBody::Newsletter { benefits, .. } => content::split_lines(benefits),
        _ => Vec::new(),
    };
    NewsletterView {
        block,
        benefit_list,
    }
}

async fn active(state: &AppState, kind: ContentKind, limit: Option<i64>) -> StoreResult<Vec<ContentBlock>> {
    state
        .store
        .list_blocks(
            kind,
            BlockFilter {
                active_only: true,
                limit,
            },
        )
        .await
}

async fn load_page(state: &AppState, subscribed: bool) -> StoreResult<PageResponse> {
    let store = &state.store;
    Ok(PageResponse {
        site_settings: store.settings_or_default().await?,
        hero_images: active(state, ContentKind::Hero, None).await?,
        about_section: store
            .latest_active_block(ContentKind::About)
            .await?
            .map(about_view),
        services: active(state, ContentKind::Service, None)
            .await?
            .into_iter()
            .map(service_view)
            .collect(),
        results: active(state, ContentKind::ImpactResult, None).await?,
        gallery_images: active(state, ContentKind::Gallery, Some(GALLERY_LIMIT)).await?,
        testimonials: active(state, ContentKind::Testimonial, None).await?,
        newsletter: store
            .latest_active_block(ContentKind::Newsletter)
            .await?
            .map(newsletter_view),
        free_ebook: store.active_ebook().await?,
        subscribed,
    })
}

// ============================================================================
// Handlers
// ============================================================================

/// GET / and GET /api/page
pub async fn home(
    State(state): State<AppState>,
    client: ClientInfo,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, ApiError> {
    let page = match load_page(&state, params.contains_key("subscribed")).await {
        Ok(page) => page,
        Err(e) => return Err(store_failure(&state, SOURCE, &client, "Home view error", e).await),
    };

    state
        .audit
        .info(
            format!("Home page viewed from IP: {}", client.ip_or_unknown()),
            SOURCE,
            &client,
        )
        .await;

    Ok((
        [
            (header::CACHE_CONTROL, "no-cache, no-store, must-revalidate, max-age=0"),
            (header::PRAGMA, "no-cache"),
            (header::EXPIRES, "0"),
            (header::X_FRAME_OPTIONS, "DENY"),
            (header::X_CONTENT_TYPE_OPTIONS, "nosniff"),
            (header::X_XSS_PROTECTION, "1; mode=block"),
        ],
        Json(page),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::{ContentBlockInput, EbookInput, GalleryPosition, LogFilter};
    use crate::routes::test_support::{send, test_state, with_peer};
    use crate::store::SiteStore;
    use axum::{body::Body, http::Request, http::StatusCode, routing::get, Router};
    use tower::ServiceExt;

    fn router(state: AppState) -> Router {
        with_peer(
            Router::new()
                .route("/", get(home))
                .route("/api/page", get(home))
                .with_state(state),
        )
    }

    fn about(content: &str, image_2: Option<&str>) -> ContentBlockInput {
        ContentBlockInput {
            title: "About".to_string(),
            media: Some("/media/about/a.jpg".to_string()),
            is_active: true,
            sort_order: 0,
            body: ContentBody::About {
                content: content.to_string(),
                image_2: image_2.map(str::to_string),
                bullet_points: "One\n\nTwo".to_string(),
            },
        }
    }

    fn gallery(n: i32) -> ContentBlockInput {
        ContentBlockInput {
            title: format!("Photo {}", n),
            media: Some(format!("/media/gallery/{}.jpg", n)),
            is_active: true,
            sort_order: n,
            body: ContentBody::Gallery {
                description: String::new(),
                position: GalleryPosition::Small,
            },
        }
    }

    fn get_req(uri: &str) -> Request<Body> {
        Request::get(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_empty_site_gets_default_settings() {
        let (state, store) = test_state();
        let (status, body) = send(router(state), get_req("/")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["site_settings"]["site_name"], "Fusion Force LLC");
        assert!(body["about_section"].is_null());
        assert_eq!(body["subscribed"], false);
        assert!(store.settings().await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_about_section_is_formatted() {
        let (state, store) = test_state();
        store
            .insert_block(about(
                "**A**\nx\n**B**\ny\n**C**\nz",
                Some("/media/about/b.jpg"),
            ))
            .await
            .unwrap();

        let (_, body) = send(router(state), get_req("/api/page")).await;
        let about = &body["about_section"];
        assert_eq!(about["kind"], "about");
        assert_eq!(about["has_long_content"], true);
        assert_eq!(about["show_second_image"], true);
        assert_eq!(about["segments"][0]["type"], "heading");
        assert_eq!(about["segments"][1]["text"], "x");
        assert_eq!(about["bullet_list"], serde_json::json!(["One", "Two"]));
    }

    #[tokio::test]
    async fn test_second_image_needs_an_image() {
        let (state, store) = test_state();
        store
            .insert_block(about("**A**\n**B**\n**C**", None))
            .await
            .unwrap();
        let (_, body) = send(router(state), get_req("/")).await;
        assert_eq!(body["about_section"]["has_long_content"], true);
        assert_eq!(body["about_section"]["show_second_image"], false);
    }

    #[tokio::test]
    async fn test_gallery_is_capped_and_ebook_included() {
        let (state, store) = test_state();
        for n in 0..8 {
            store.insert_block(gallery(n)).await.unwrap();
        }
        store.insert_ebook(EbookInput::default()).await.unwrap();

        let (_, body) = send(router(state), get_req("/?subscribed")).await;
        assert_eq!(body["gallery_images"].as_array().unwrap().len(), 6);
        assert_eq!(body["gallery_images"][0]["title"], "Photo 0");
        assert_eq!(body["free_ebook"]["title"], "Free Leadership Guide");
        assert_eq!(body["subscribed"], true);
    }

    #[tokio::test]
    async fn test_page_sets_no_cache_headers_and_audits() {
        let (state, store) = test_state();
        let res = router(state).oneshot(get_req("/")).await.unwrap();
        assert_eq!(
            res.headers()["cache-control"],
            "no-cache, no-store, must-revalidate, max-age=0"
        );
        assert_eq!(res.headers()["x-frame-options"], "DENY");

        let logs = store
            .list_logs(LogFilter {
                limit: 10,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(logs[0].message, "Home page viewed from IP: 192.0.2.10");
        assert_eq!(logs[0].source, "home_view");
    }
}
