/**
 * Admin Contact Routes
 * Booking request review and status lifecycle
 */
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;

use super::SOURCE;
use crate::audit::ClientInfo;
use crate::db::models::{choices, ContactStatus, ContactSubmission};
use crate::error::{ApiError, ResponseStatus, StoreError};
use crate::routes::{plural, store_failure, ActionRequest, ActionResponse, DataResponse, JsonBody};
use crate::state::AppState;
use crate::store::{SiteStore, StoreResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactAction {
    MarkContacted,
    MarkBooked,
    MarkCancelled,
}

impl ContactAction {
    fn target(self) -> ContactStatus {
        match self {
            ContactAction::MarkContacted => ContactStatus::Contacted,
            ContactAction::MarkBooked => ContactStatus::Booked,
            ContactAction::MarkCancelled => ContactStatus::Cancelled,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ContactListQuery {
    pub status: Option<String>,
}

/// PATCH body: either field may be omitted.
#[derive(Debug, Default, Deserialize)]
pub struct ContactUpdate {
    pub status: Option<ContactStatus>,
    pub notes: Option<String>,
}

fn parse_status(raw: &str) -> Result<ContactStatus, ApiError> {
    raw.parse().map_err(|_| {
        ApiError::Validation(format!(
            "Status must be one of: {}.",
            choices(ContactStatus::ALL)
        ))
    })
}

/// GET /api/admin/contacts?status=
pub async fn list_contacts(
    State(state): State<AppState>,
    client: ClientInfo,
    Query(query): Query<ContactListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let status = match query.status.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(parse_status(raw)?),
    };
    match state.store.list_contacts(status).await {
        Ok(contacts) => Ok(Json(DataResponse::success(
            plural(contacts.len() as u64, "submission", "submissions"),
            contacts,
        ))),
        Err(e) => Err(store_failure(&state, SOURCE, &client, "Contact list error", e).await),
    }
}

/// GET /api/admin/contacts/{id}
pub async fn get_contact(
    State(state): State<AppState>,
    client: ClientInfo,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    match state.store.get_contact(id).await {
        Ok(Some(contact)) => Ok(Json(DataResponse::success("Contact submission", contact))),
        Ok(None) => Err(ApiError::NotFound("Contact submission not found".to_string())),
        Err(e) => Err(store_failure(&state, SOURCE, &client, "Contact read error", e).await),
    }
}

/// PATCH /api/admin/contacts/{id}
///
/// A status the lifecycle does not allow from the current one is a 400 and
/// leaves the record untouched. A row that moved underneath the request is a 409.
pub async fn update_contact(
    State(state): State<AppState>,
    client: ClientInfo,
    Path(id): Path<i64>,
    JsonBody(update): JsonBody<ContactUpdate>,
) -> Result<impl IntoResponse, ApiError> {
    let current = match state.store.get_contact(id).await {
        Ok(Some(contact)) => contact,
        Ok(None) => return Err(ApiError::NotFound("Contact submission not found".to_string())),
        Err(e) => return Err(store_failure(&state, SOURCE, &client, "Contact update error", e).await),
    };

    if let Some(next) = update.status {
        if next != current.status && !current.status.can_transition_to(next) {
            return Err(ApiError::Validation(format!(
                "Cannot change status from {} to {}.",
                current.status, next
            )));
        }
    }

    match apply_update(state.store.as_ref(), &current, &update).await {
        Ok(Some(contact)) => {
            state
                .audit
                .info(
                    format!("Updated contact submission #{} ({})", id, contact.status),
                    SOURCE,
                    &client,
                )
                .await;
            Ok(Json(DataResponse::success("Contact submission updated.", contact)))
        }
        Ok(None) => Err(ApiError::NotFound("Contact submission not found".to_string())),
        Err(e) => Err(store_failure(&state, SOURCE, &client, "Contact update error", e).await),
    }
}

/// Write a checked PATCH. The status goes first, guarded by the lifecycle in
/// the store, so a row that moved since `current` was read is a conflict and
/// the notes stay unwritten.
async fn apply_update(
    store: &dyn SiteStore,
    current: &ContactSubmission,
    update: &ContactUpdate,
) -> StoreResult<Option<ContactSubmission>> {
    if let Some(next) = update.status.filter(|next| *next != current.status) {
        if store.set_contact_status(&[current.id], next).await? != 1 {
            return Err(StoreError::Conflict(
                "Contact submission changed while saving. Reload and try again.".to_string(),
            ));
        }
    }
    if let Some(notes) = &update.notes {
        store.set_contact_notes(current.id, notes).await?;
    }
    store.get_contact(current.id).await
}

/// POST /api/admin/contacts/actions
///
/// Rows the lifecycle forbids (terminal, or already in the target state) are
/// skipped; `affected` counts the rows that changed.
pub async fn bulk_action(
    State(state): State<AppState>,
    client: ClientInfo,
    JsonBody(request): JsonBody<ActionRequest<ContactAction>>,
) -> Result<impl IntoResponse, ApiError> {
    if request.ids.is_empty() {
        return Err(ApiError::Validation("No items selected.".to_string()));
    }
    let target = request.action.target();
    let changed = match state.store.set_contact_status(&request.ids, target).await {
        Ok(changed) => changed,
        Err(e) => return Err(store_failure(&state, SOURCE, &client, "Contact action error", e).await),
    };

    let message = format!(
        "{} marked as {}",
        plural(changed, "submission", "submissions"),
        target
    );
    state.audit.info(message.clone(), SOURCE, &client).await;

    let skipped = request.ids.len() as u64 - changed.min(request.ids.len() as u64);
    let (status, message) = if skipped > 0 {
        (
            ResponseStatus::Info,
            format!("{} ({} unchanged)", message, skipped),
        )
    } else {
        (ResponseStatus::Success, message)
    };
    Ok(Json(ActionResponse::new(status, message, changed)))
}
