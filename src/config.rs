/**
 * Application Configuration
 * Everything read from the environment at startup
 */
use axum::http::HeaderValue;
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::db::DbConfig;

pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid bind address '{0}'")]
    BindAddress(String),

    #[error("ADMIN_TOKEN_HASH must be 64 hex characters (run hash-admin-token)")]
    AdminTokenHash,

    #[error("MEDIA_URL must name a path below the site root, got '{0}'")]
    MediaUrl(String),
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: String,
    pub host: String,
    pub port: u16,
    /// `None` runs on the in-memory store.
    pub database: Option<DbConfig>,
    /// Lowercase sha256 hex of the admin bearer secret.
    pub admin_token_hash: Option<String>,
    pub media_root: PathBuf,
    pub media_url: String,
    pub max_upload_bytes: usize,
    pub allowed_origins: Vec<HeaderValue>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            host: "127.0.0.1".to_string(),
            port: 3001,
            database: None,
            admin_token_hash: None,
            media_root: PathBuf::from("media"),
            media_url: "/media".to_string(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            allowed_origins: default_origins(),
        }
    }
}

fn default_origins() -> Vec<HeaderValue> {
    vec![
        HeaderValue::from_static("http://localhost:3000"),
        HeaderValue::from_static("http://127.0.0.1:3000"),
    ]
}

/// ALLOWED_ORIGINS (comma-separated), then FRONTEND_ORIGIN, then localhost.
fn origins_from_env() -> Vec<HeaderValue> {
    std::env::var("ALLOWED_ORIGINS")
        .ok()
        .map(|s| parse_origins(&s))
        .filter(|origins| !origins.is_empty())
        .or_else(|| {
            std::env::var("FRONTEND_ORIGIN")
                .ok()
                .and_then(|s| s.trim().parse().ok())
                .map(|origin| vec![origin])
        })
        .unwrap_or_else(default_origins)
}

fn parse_origins(raw: &str) -> Vec<HeaderValue> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .filter_map(|origin| origin.parse().ok())
        .collect()
}

fn is_sha256_hex(value: &str) -> bool {
    value.len() == 64 && value.chars().all(|c| c.is_ascii_hexdigit())
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let media_url = std::env::var("MEDIA_URL").unwrap_or(defaults.media_url);

        Self {
            environment: std::env::var("ENVIRONMENT").unwrap_or(defaults.environment),
            host: std::env::var("HOST").unwrap_or(defaults.host),
            port: std::env::var("PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.port),
            database: std::env::var("DATABASE_URL")
                .ok()
                .filter(|url| !url.trim().is_empty())
                .map(|_| DbConfig::default()),
            admin_token_hash: std::env::var("ADMIN_TOKEN_HASH")
                .ok()
                .map(|s| s.trim().to_ascii_lowercase())
                .filter(|s| !s.is_empty()),
            media_root: std::env::var("MEDIA_ROOT")
                .map(PathBuf::from)
                .unwrap_or(defaults.media_root),
            media_url: format!("/{}", media_url.trim_matches('/')),
            max_upload_bytes: std::env::var("MAX_UPLOAD_BYTES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_upload_bytes),
            allowed_origins: origins_from_env(),
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        let raw = format!("{}:{}", self.host, self.port);
        raw.parse().map_err(|_| ConfigError::BindAddress(raw))
    }

    /// Startup checks. A malformed admin hash is fatal in production and
    /// disables the admin routes elsewhere.
    pub fn validate(&mut self) -> Result<(), ConfigError> {
        // Mounted with nest_service, which rejects the root path.
        if self.media_url.trim_matches('/').is_empty() {
            return Err(ConfigError::MediaUrl(self.media_url.clone()));
        }
        match self.admin_token_hash.as_deref() {
            Some(hash) if !is_sha256_hex(hash) => {
                if self.is_production() {
                    return Err(ConfigError::AdminTokenHash);
                }
                tracing::warn!(
                    "ADMIN_TOKEN_HASH is not a sha256 hex digest. Admin routes are disabled."
                );
                self.admin_token_hash = None;
            }
            Some(_) => {}
            None => {
                tracing::warn!("ADMIN_TOKEN_HASH not set. Admin routes are disabled.");
            }
        }
        Ok(())
    }

    /// Public URL of a stored upload.
    pub fn media_href(&self, folder: &str, file_name: &str) -> String {
        format!("{}/{}/{}", self.media_url, folder, file_name)
    }
}
