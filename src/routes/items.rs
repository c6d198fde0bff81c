//! Record collection routes over the local store.
//!
//! Widget slots live in the same collection under the `widget:` prefix.
//! These routes neither show nor touch them.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;

use super::ApiError;
use crate::error::UtilityError;
use crate::services::slot::{SLOT_PREFIX, is_slot_id};
use crate::state::AppState;
use crate::store::{Record, StoredRecord};

/// Refuse ids owned by a widget slot.
fn writable_id(id: &str) -> Result<(), ApiError> {
    if is_slot_id(id) {
        return Err(UtilityError::validation(format!("record id {id} is reserved for widgets")).into());
    }
    Ok(())
}

/// `GET /api/items` — every record outside the widget slots.
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<StoredRecord>>, ApiError> {
    let records = state.store.all().await?;
    Ok(Json(records.into_iter().filter(|r| !is_slot_id(&r.id)).collect()))
}

/// `POST /api/items` — create or replace a record; the id is generated when
/// absent.
pub async fn put(
    State(state): State<AppState>,
    Json(record): Json<Record>,
) -> Result<(StatusCode, Json<StoredRecord>), ApiError> {
    if let Some(id) = &record.id {
        writable_id(id)?;
    }
    let stored = state.store.put(record).await?;
    Ok((StatusCode::CREATED, Json(stored)))
}

/// `GET /api/items/:id` — point lookup.
pub async fn get(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<StoredRecord>, ApiError> {
    let found = if is_slot_id(&id) { None } else { state.store.get(&id).await? };
    found
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("no record with id {id}")))
}

/// `PUT /api/items/:id` — fully replace the record at `id`.
pub async fn replace(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(mut record): Json<Record>,
) -> Result<Json<StoredRecord>, ApiError> {
    writable_id(&id)?;
    record.id = Some(id);
    Ok(Json(state.store.put(record).await?))
}

/// `DELETE /api/items/:id` — remove a record; missing ids succeed.
pub async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> Result<StatusCode, ApiError> {
    writable_id(&id)?;
    state.store.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `DELETE /api/items` — remove every record; widget slots survive.
pub async fn clear(State(state): State<AppState>) -> Result<StatusCode, ApiError> {
    state.store.clear_except(SLOT_PREFIX).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
#[path = "items_test.rs"]
mod tests;
