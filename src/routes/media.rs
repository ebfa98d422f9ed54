/**
 * Media Uploads
 * Admin file uploads stored under MEDIA_ROOT and served at MEDIA_URL
 */
use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use crate::audit::ClientInfo;
use crate::error::{ApiError, ResponseStatus};
use crate::state::AppState;

const SOURCE: &str = "media_upload";
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "gif"];
const DOCUMENT_EXTENSIONS: &[&str] = &["pdf"];

/// Upload destinations. Each folder takes either images or PDF documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaFolder {
    Site,
    Hero,
    About,
    Gallery,
    Testimonials,
    Newsletter,
    NewsletterPdfs,
    Ebooks,
    EbookCovers,
}

impl MediaFolder {
    pub fn as_str(self) -> &'static str {
        match self {
            MediaFolder::Site => "site",
            MediaFolder::Hero => "hero",
            MediaFolder::About => "about",
            MediaFolder::Gallery => "gallery",
            MediaFolder::Testimonials => "testimonials",
            MediaFolder::Newsletter => "newsletter",
            MediaFolder::NewsletterPdfs => "newsletter_pdfs",
            MediaFolder::Ebooks => "ebooks",
            MediaFolder::EbookCovers => "ebook_covers",
        }
    }

    fn holds_documents(self) -> bool {
        matches!(self, MediaFolder::NewsletterPdfs | MediaFolder::Ebooks)
    }

    fn allowed_extensions(self) -> &'static [&'static str] {
        if self.holds_documents() {
            DOCUMENT_EXTENSIONS
        } else {
            IMAGE_EXTENSIONS
        }
    }
}

impl FromStr for MediaFolder {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "site" => MediaFolder::Site,
            "hero" => MediaFolder::Hero,
            "about" => MediaFolder::About,
            "gallery" => MediaFolder::Gallery,
            "testimonials" => MediaFolder::Testimonials,
            "newsletter" => MediaFolder::Newsletter,
            "newsletter_pdfs" => MediaFolder::NewsletterPdfs,
            "ebooks" => MediaFolder::Ebooks,
            "ebook_covers" => MediaFolder::EbookCovers,
            _ => return Err(ApiError::NotFound(format!("Unknown media folder '{}'", s))),
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub status: ResponseStatus,
    pub url: String,
    pub filename: String,
    pub size: usize,
    pub content_type: String,
}

/// Sniff the real file type; returns (mime, canonical extension).
fn sniff(bytes: &[u8]) -> Option<(&'static str, &'static str)> {
    match bytes {
        [0xFF, 0xD8, 0xFF, ..] => Some(("image/jpeg", "jpg")),
        [0x89, 0x50, 0x4E, 0x47, ..] => Some(("image/png", "png")),
        [0x47, 0x49, 0x46, 0x38, ..] => Some(("image/gif", "gif")),
        [0x52, 0x49, 0x46, 0x46, _, _, _, _, 0x57, 0x45, 0x42, 0x50, ..] => {
            Some(("image/webp", "webp"))
        }
        [0x25, 0x50, 0x44, 0x46, ..] => Some(("application/pdf", "pdf")),
        _ => None,
    }
}

fn extension_of(file_name: &str) -> Option<String> {
    let (_, ext) = file_name.rsplit_once('.')?;
    Some(ext.to_ascii_lowercase())
}

/// Check a file against a folder's rules; returns (mime, extension to store).
fn validate_upload(
    folder: MediaFolder,
    file_name: &str,
    bytes: &[u8],
    max_bytes: usize,
) -> Result<(&'static str, &'static str), ApiError> {
    let allowed = folder.allowed_extensions();
    let ext = extension_of(file_name).unwrap_or_default();
    if !allowed.contains(&ext.as_str()) {
        return Err(ApiError::Validation(format!(
            "Unsupported file type. Allowed: {}.",
            allowed.join(", ")
        )));
    }
    if bytes.is_empty() {
        return Err(ApiError::Validation("Empty file".to_string()));
    }
    if bytes.len() > max_bytes {
        return Err(ApiError::Validation(format!(
            "File too large. Maximum size is {} MB.",
            max_bytes / (1024 * 1024)
        )));
    }
    match sniff(bytes) {
        Some((mime, stored_ext)) if allowed.contains(&stored_ext) => Ok((mime, stored_ext)),
        _ => Err(ApiError::Validation(
            "File content does not match an allowed type.".to_string(),
        )),
    }
}

/// POST /api/admin/media/{folder} - multipart, first file field is stored
pub async fn upload_media(
    State(state): State<AppState>,
    client: ClientInfo,
    Path(folder): Path<String>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let folder: MediaFolder = folder.parse()?;

    let mut upload = None;
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                tracing::warn!(error = %e, "invalid multipart body");
                return Err(ApiError::Validation("Invalid multipart data".to_string()));
            }
        };
        let Some(file_name) = field.file_name().map(str::to_string) else {
            continue;
        };
        let bytes = field.bytes().await.map_err(|e| {
            tracing::warn!(error = %e, "failed to read upload");
            ApiError::Validation("Failed to read file data".to_string())
        })?;
        upload = Some((file_name, bytes));
        break;
    }
    let Some((file_name, bytes)) = upload else {
        return Err(ApiError::Validation("No file provided".to_string()));
    };

    let (mime, ext) = validate_upload(folder, &file_name, &bytes, state.config.max_upload_bytes)?;

    let dir = state.config.media_root.join(folder.as_str());
    let filename = format!("{}.{}", Uuid::new_v4(), ext);
    let written = match tokio::fs::create_dir_all(&dir).await {
        Ok(()) => tokio::fs::write(dir.join(&filename), &bytes).await,
        Err(e) => Err(e),
    };
    if let Err(e) = written {
        state
            .audit
            .error(format!("Media upload error: {}", e), SOURCE, &client)
            .await;
        return Err(ApiError::internal());
    }

    let url = state.config.media_href(folder.as_str(), &filename);
    state
        .audit
        .info(
            format!("Uploaded {} to {} ({} bytes)", file_name, url, bytes.len()),
            SOURCE,
            &client,
        )
        .await;

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            status: ResponseStatus::Success,
            url,
            filename,
            size: bytes.len(),
            content_type: mime.to_string(),
        }),
    ))
}
