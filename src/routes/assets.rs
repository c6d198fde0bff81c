//! Fallback route: static app assets through the offline shell.

use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::http::{Method, Uri};
use axum::response::{IntoResponse, Response};

use super::ApiError;
use crate::state::AppState;

/// Serve any unrouted `GET`/`HEAD` path cache-first.
pub async fn serve(State(state): State<AppState>, method: Method, uri: Uri) -> Result<Response, ApiError> {
    if method != Method::GET && method != Method::HEAD {
        return Err(ApiError::not_found(format!("no route for {method} {}", uri.path())));
    }
    let asset = state.shell.fetch(uri.path()).await?;
    Ok(([(CONTENT_TYPE, asset.content_type)], asset.body).into_response())
}
