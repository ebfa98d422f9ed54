/**
 * Contact Route
 * Booking request form
 */
use axum::{extract::State, response::IntoResponse, Json};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::audit::ClientInfo;
use crate::db::models::{choices, EventType, NewContactSubmission};
use crate::error::{ApiError, ResponseStatus};
use crate::routes::{store_failure, JsonBody};
use crate::state::AppState;

const SOURCE: &str = "contact_form";

lazy_static::lazy_static! {
    static ref EMAIL_REGEX: Regex =
        Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for POST /api/contact-submit. Every field is required; they
/// are optional here so a missing one gets its own message.
#[derive(Debug, Default, Deserialize)]
pub struct ContactRequest {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub organization: Option<String>,
    pub event_type: Option<String>,
    pub event_details: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ContactResponse {
    pub status: ResponseStatus,
    pub message: String,
    pub submission_id: i64,
}

// ============================================================================
// Validation
// ============================================================================

/// "full_name" -> "Full Name"
fn field_label(field: &str) -> String {
    field
        .split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn required(value: Option<String>, field: &str) -> Result<String, ApiError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::Validation(format!("{} is required.", field_label(field))))
}

impl ContactRequest {
    /// Check fields in form order and build the record to store.
    pub fn validate(self) -> Result<NewContactSubmission, ApiError> {
        let full_name = required(self.full_name, "full_name")?;
        let email = required(self.email, "email")?.to_lowercase();
        let organization = required(self.organization, "organization")?;
        let event_type = required(self.event_type, "event_type")?;
        let event_details = required(self.event_details, "event_details")?;

        if !EMAIL_REGEX.is_match(&email) {
            return Err(ApiError::Validation(
                "Please enter a valid email address.".to_string(),
            ));
        }
        let event_type: EventType = event_type.to_lowercase().parse().map_err(|_| {
            ApiError::Validation(format!(
                "Event Type must be one of: {}.",
                choices(EventType::ALL)
            ))
        })?;

        Ok(NewContactSubmission {
            full_name,
            email,
            organization,
            event_type,
            event_details,
        })
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/contact-submit
pub async fn contact_submit(
    State(state): State<AppState>,
    client: ClientInfo,
    JsonBody(payload): JsonBody<ContactRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let new = payload.validate()?;

    let submission = match state.store.insert_contact(new).await {
        Ok(submission) => submission,
        Err(e) => {
            return Err(
                store_failure(&state, SOURCE, &client, "Contact submission error", e).await,
            )
        }
    };

    state
        .audit
        .success(
            format!(
                "New contact submission from {} ({})",
                submission.full_name, submission.organization
            ),
            SOURCE,
            &client,
        )
        .await;

    Ok(Json(ContactResponse {
        status: ResponseStatus::Success,
        message: "Thank you for your booking request! Pamela will review your details and get back to you within 24 hours.".to_string(),
        submission_id: submission.id,
    }))
}
