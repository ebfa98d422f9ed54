//! Site Backend - library for app logic and testing

pub mod audit;
pub mod config;
pub mod content;
pub mod db;
pub mod error;
pub mod logging;
pub mod routes;
pub mod state;
pub mod store;

use axum::{
    http::{header, Method},
    middleware,
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, limit::RequestBodyLimitLayer,
    services::ServeDir, trace::TraceLayer,
};

use crate::config::AppConfig;
use crate::state::AppState;
use crate::store::{MemoryStore, PgStore, SiteStore};

/// CORS from the configured origin list.
pub fn configure_cors(config: &AppConfig) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(config.allowed_origins.clone())
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
}

/// Create and configure the application router.
pub fn create_app(state: AppState) -> Router {
    let cors = configure_cors(&state.config);
    tracing::info!("CORS configured");

    let media = ServeDir::new(&state.config.media_root);
    let body_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/", get(routes::page::home))
        .route("/api/page", get(routes::page::home))
        .route("/api/contact-submit", post(routes::contact::contact_submit))
        .route(
            "/api/newsletter-submit",
            post(routes::newsletter::newsletter_submit),
        )
        .route(
            "/api/formsubmit-webhook",
            post(routes::webhook::formsubmit_webhook),
        )
        .route(
            "/api/download-ebook/{id}",
            post(routes::ebook::download_ebook),
        )
        .route("/health", get(routes::health::health_ping))
        .route("/health/detailed", get(routes::health::health_detailed))
        .route("/health/database", get(routes::health::health_database))
        .route("/health/ready", get(routes::health::health_ready))
        .nest("/api/admin", routes::admin::router(&state))
        .nest_service(&state.config.media_url, media)
        .layer(logging::middleware::propagate_request_id_layer())
        .layer(middleware::from_fn(logging::middleware::log_request))
        .layer(logging::middleware::request_id_layer())
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        // JSON bodies stay under axum's 2 MB default; this caps uploads
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(cors)
        .with_state(state)
}

async fn open_store(config: &AppConfig) -> Result<Arc<dyn SiteStore>, sqlx::Error> {
    let Some(db_config) = &config.database else {
        tracing::warn!("DATABASE_URL not set. Using the in-memory store; data is lost on restart.");
        return Ok(Arc::new(MemoryStore::new()));
    };
    let pool = db::init_pool(db_config).await?;
    db::run_migrations(&pool).await?;
    Ok(Arc::new(PgStore::new(pool)))
}

/// Run the server (used by main).
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // Dropping the guards stops the background log writers.
    let _log_guards = logging::init(&logging::LoggingConfig::from_env());

    routes::health::init_start_time();

    let mut config = AppConfig::from_env();
    config.validate()?;
    let addr = config.bind_addr()?;

    let store = open_store(&config).await?;
    let app = create_app(AppState::new(config, store));

    tracing::info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}
