//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! Binds the record API, the widget endpoints and `/healthz` under one Axum
//! router. Every other path falls through to the offline shell, which serves
//! the static app cache-first.

pub mod assets;
pub mod items;
pub mod widgets;

use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{delete, get, post};
use serde::Serialize;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::error::{ErrorCode, UtilityError};
use crate::shell::ShellError;
use crate::state::AppState;
use crate::store::StoreError;

/// Full application router.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/items", get(items::list).post(items::put).delete(items::clear))
        .route("/api/items/{id}", get(items::get).put(items::replace).delete(items::delete))
        .route("/api/todo", get(widgets::list_tasks).post(widgets::add_task))
        .route("/api/todo/{index}/toggle", post(widgets::toggle_task))
        .route("/api/todo/{index}", delete(widgets::delete_task))
        .route("/api/notes", get(widgets::list_notes).post(widgets::add_note))
        .route("/api/notes/{index}", delete(widgets::delete_note))
        .route("/api/passwords", get(widgets::list_passwords).post(widgets::save_password))
        .route("/api/passwords/generate", post(widgets::generate_password))
        .route("/api/passwords/{index}", delete(widgets::delete_password))
        .route("/api/currency/rates", get(widgets::currency_rates))
        .route("/api/currency/convert", post(widgets::convert_currency))
        .route("/api/units", get(widgets::list_units))
        .route("/api/units/convert", post(widgets::convert_units))
        .route("/api/pdf", post(widgets::image_to_pdf))
        .route("/api/qr", post(widgets::generate_qr))
        .route("/healthz", get(healthz))
        .fallback(assets::serve)
        .layer(CompressionLayer::new())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// `GET /healthz` — 503 once the store has been closed.
async fn healthz(State(state): State<AppState>) -> StatusCode {
    if state.store.is_closed() { StatusCode::SERVICE_UNAVAILABLE } else { StatusCode::OK }
}

// =============================================================================
// ERROR RESPONSES
// =============================================================================

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
    retryable: bool,
}

/// Error rendered as `{code, message, retryable}` with an HTTP status.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorBody,
}

impl ApiError {
    fn from_code<E: ErrorCode>(status: StatusCode, err: &E) -> Self {
        Self {
            status,
            body: ErrorBody { code: err.error_code(), message: err.to_string(), retryable: err.retryable() },
        }
    }

    pub(crate) fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            body: ErrorBody { code: "E_NOT_FOUND", message: message.into(), retryable: false },
        }
    }

    #[cfg(test)]
    pub(crate) fn status(&self) -> StatusCode {
        self.status
    }

    #[cfg(test)]
    pub(crate) fn code(&self) -> &'static str {
        self.body.code
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::warn!(code = self.body.code, message = %self.body.message, "request failed");
        }
        (self.status, Json(self.body)).into_response()
    }
}

impl From<UtilityError> for ApiError {
    fn from(err: UtilityError) -> Self {
        Self::from_code(utility_error_to_status(&err), &err)
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        Self::from_code(store_error_to_status(&err), &err)
    }
}

impl From<ShellError> for ApiError {
    fn from(err: ShellError) -> Self {
        Self::from_code(shell_error_to_status(&err), &err)
    }
}

pub(crate) fn utility_error_to_status(err: &UtilityError) -> StatusCode {
    match err {
        UtilityError::Validation(_) => StatusCode::BAD_REQUEST,
        UtilityError::Network(_) => StatusCode::BAD_GATEWAY,
        UtilityError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        UtilityError::Store(e) => store_error_to_status(e),
    }
}

pub(crate) fn store_error_to_status(err: &StoreError) -> StatusCode {
    match err {
        StoreError::StorageUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        StoreError::TransactionFailed(_) | StoreError::CorruptRecord { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub(crate) fn shell_error_to_status(err: &ShellError) -> StatusCode {
    match err {
        ShellError::NotFound(_) => StatusCode::NOT_FOUND,
        ShellError::Fetch { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
