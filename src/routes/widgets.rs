//! Widget endpoints. Each action returns the widget's new state.

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Json};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::ApiError;
use crate::error::UtilityError;
use crate::services::currency::Conversion;
use crate::services::notes::Note;
use crate::services::passwords::{DEFAULT_PASSWORD_LENGTH, PasswordEntry};
use crate::services::pdf::{self, ImageDataUrl, PDF_FILENAME};
use crate::services::qr::{self, QrImage};
use crate::services::todo::Task;
use crate::services::units::{self, LengthUnit, UnitConversion};
use crate::state::AppState;

/// A numeric form field sent either as a JSON number or as raw text.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum NumberInput {
    Number(f64),
    Text(String),
}

impl NumberInput {
    fn as_text(&self) -> String {
        match self {
            Self::Number(n) => n.to_string(),
            Self::Text(s) => s.clone(),
        }
    }
}

// =============================================================================
// TO-DO
// =============================================================================

#[derive(Deserialize)]
pub struct AddTaskBody {
    pub text: String,
}

/// `GET /api/todo`
pub async fn list_tasks(State(state): State<AppState>) -> Result<Json<Vec<Task>>, ApiError> {
    Ok(Json(state.todo.list().await?))
}

/// `POST /api/todo`
pub async fn add_task(
    State(state): State<AppState>,
    Json(body): Json<AddTaskBody>,
) -> Result<Json<Vec<Task>>, ApiError> {
    Ok(Json(state.todo.add(&body.text).await?))
}

/// `POST /api/todo/:index/toggle`
pub async fn toggle_task(State(state): State<AppState>, Path(index): Path<usize>) -> Result<Json<Vec<Task>>, ApiError> {
    Ok(Json(state.todo.toggle(index).await?))
}

/// `DELETE /api/todo/:index`
pub async fn delete_task(State(state): State<AppState>, Path(index): Path<usize>) -> Result<Json<Vec<Task>>, ApiError> {
    Ok(Json(state.todo.delete(index).await?))
}

// =============================================================================
// NOTES
// =============================================================================

#[derive(Deserialize)]
pub struct AddNoteBody {
    pub text: String,
    pub color: Option<String>,
}

/// `GET /api/notes`
pub async fn list_notes(State(state): State<AppState>) -> Result<Json<Vec<Note>>, ApiError> {
    Ok(Json(state.notes.list().await?))
}

/// `POST /api/notes`
pub async fn add_note(
    State(state): State<AppState>,
    Json(body): Json<AddNoteBody>,
) -> Result<Json<Vec<Note>>, ApiError> {
    Ok(Json(state.notes.add(&body.text, body.color.as_deref()).await?))
}

/// `DELETE /api/notes/:index`
pub async fn delete_note(State(state): State<AppState>, Path(index): Path<usize>) -> Result<Json<Vec<Note>>, ApiError> {
    Ok(Json(state.notes.delete(index).await?))
}

// =============================================================================
// PASSWORDS
// =============================================================================

#[derive(Deserialize, Default)]
pub struct GenerateBody {
    pub length: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct GeneratedPassword {
    pub password: String,
}

#[derive(Deserialize)]
pub struct SavePasswordBody {
    pub name: String,
    pub password: String,
}

/// `GET /api/passwords`
pub async fn list_passwords(State(state): State<AppState>) -> Result<Json<Vec<PasswordEntry>>, ApiError> {
    Ok(Json(state.passwords.list().await?))
}

/// `POST /api/passwords/generate` — body optional, length defaults to 12.
pub async fn generate_password(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<GeneratedPassword>, ApiError> {
    let request: GenerateBody = if body.is_empty() {
        GenerateBody::default()
    } else {
        serde_json::from_slice(&body).map_err(|e| UtilityError::validation(format!("invalid request body: {e}")))?
    };
    let length = request.length.unwrap_or(DEFAULT_PASSWORD_LENGTH);
    let password = state.passwords.generate(length)?;
    Ok(Json(GeneratedPassword { password }))
}

/// `POST /api/passwords`
pub async fn save_password(
    State(state): State<AppState>,
    Json(body): Json<SavePasswordBody>,
) -> Result<Json<Vec<PasswordEntry>>, ApiError> {
    Ok(Json(state.passwords.save(&body.name, &body.password).await?))
}

/// `DELETE /api/passwords/:index`
pub async fn delete_password(
    State(state): State<AppState>,
    Path(index): Path<usize>,
) -> Result<Json<Vec<PasswordEntry>>, ApiError> {
    Ok(Json(state.passwords.delete(index).await?))
}

// =============================================================================
// CURRENCY & UNITS
// =============================================================================

#[derive(Debug, Serialize)]
pub struct RatesResponse {
    pub base: String,
    pub currencies: Vec<String>,
    pub rates: IndexMap<String, f64>,
}

#[derive(Deserialize)]
pub struct ConvertCurrencyBody {
    pub amount: NumberInput,
    pub from: String,
    pub to: String,
}

#[derive(Deserialize)]
pub struct ConvertUnitsBody {
    pub value: NumberInput,
    pub from: LengthUnit,
    pub to: LengthUnit,
}

#[derive(Serialize)]
pub struct UnitOption {
    pub symbol: &'static str,
    pub label: &'static str,
}

/// `GET /api/units` — selectable length units.
pub async fn list_units() -> Json<Vec<UnitOption>> {
    Json(LengthUnit::ALL.into_iter().map(|u| UnitOption { symbol: u.symbol(), label: u.label() }).collect())
}

/// `GET /api/currency/rates` — base, selectable codes and the full table.
pub async fn currency_rates(State(state): State<AppState>) -> Result<Json<RatesResponse>, ApiError> {
    let table = state.currency.rates().await?;
    let currencies = state.currency.currencies().await?;
    Ok(Json(RatesResponse { base: table.base, currencies, rates: table.rates }))
}

/// `POST /api/currency/convert`
pub async fn convert_currency(
    State(state): State<AppState>,
    Json(body): Json<ConvertCurrencyBody>,
) -> Result<Json<Conversion>, ApiError> {
    Ok(Json(state.currency.convert(&body.amount.as_text(), &body.from, &body.to).await?))
}

/// `POST /api/units/convert`
pub async fn convert_units(Json(body): Json<ConvertUnitsBody>) -> Result<Json<UnitConversion>, ApiError> {
    Ok(Json(units::convert(&body.value.as_text(), body.from, body.to)?))
}

// =============================================================================
// IMAGE → PDF & QR
// =============================================================================

#[derive(Deserialize)]
pub struct QrBody {
    pub text: String,
}

/// `POST /api/pdf` — raw image body in, `converted.pdf` out.
pub async fn image_to_pdf(headers: HeaderMap, body: Bytes) -> Result<impl IntoResponse, ApiError> {
    let mime = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .unwrap_or_default();
    let image = ImageDataUrl::from_upload(mime, &body)?;

    let rendered = run_blocking(move || pdf::render_pdf(&image)).await?;

    tracing::info!(bytes = rendered.len(), "pdf rendered");
    Ok((
        [
            (CONTENT_TYPE, "application/pdf".to_string()),
            (CONTENT_DISPOSITION, format!("attachment; filename=\"{PDF_FILENAME}\"")),
        ],
        rendered,
    ))
}

/// Run CPU-bound work off the async runtime. A task that panics or is
/// cancelled is a server-side failure.
async fn run_blocking<T, F>(work: F) -> Result<T, UtilityError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, UtilityError> + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| UtilityError::Internal(format!("background task failed: {e}")))?
}

/// `POST /api/qr`
pub async fn generate_qr(Json(body): Json<QrBody>) -> Result<Json<QrImage>, ApiError> {
    Ok(Json(qr::generate_qr(&body.text)?))
}

#[cfg(test)]
#[path = "widgets_test.rs"]
mod tests;
