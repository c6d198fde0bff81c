//! Offline shell — versioned, cache-first static asset serving.
//!
//! DESIGN
//! ======
//! `CacheStorage` holds named caches of assets and is shared by every shell
//! version. A shell knows its own cache name (the version tag), a fixed list
//! of asset paths and an `AssetSource` standing in for the network.
//!
//! - install: fetch every listed asset, then create the named cache. If any
//!   fetch fails nothing is cached.
//! - activate: delete every cache whose name is not the current one.
//! - fetch: first match across caches (current cache first), else the source.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::http::header::CONTENT_TYPE;
use axum::http::{Request, StatusCode};
use tokio::sync::RwLock;
use tower::ServiceExt;
use tower_http::services::ServeDir;
use tracing::{debug, info};

pub const DEFAULT_CACHE_NAME: &str = "seven-utility-cache-v1";
pub const DEFAULT_ASSETS: &[&str] = &["/", "/index.html", "/logo.svg", "/main.js", "/app.css"];

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ShellError {
    #[error("asset not found: {0}")]
    NotFound(String),
    #[error("asset fetch failed for {path}: {reason}")]
    Fetch { path: String, reason: String },
}

impl crate::error::ErrorCode for ShellError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "E_ASSET_NOT_FOUND",
            Self::Fetch { .. } => "E_ASSET_FETCH",
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::Fetch { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    pub content_type: String,
    pub body: Bytes,
}

/// Where assets come from when they are not cached.
#[async_trait::async_trait]
pub trait AssetSource: Send + Sync {
    /// # Errors
    ///
    /// Returns `NotFound` for unknown paths and `Fetch` for other failures.
    async fn fetch(&self, path: &str) -> Result<Asset, ShellError>;
}

// =============================================================================
// CACHE STORAGE
// =============================================================================

/// Named caches shared by all shell versions.
#[derive(Clone, Default)]
pub struct CacheStorage {
    caches: Arc<RwLock<HashMap<String, HashMap<String, Asset>>>>,
}

impl CacheStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache names, sorted.
    pub async fn keys(&self) -> Vec<String> {
        let mut names: Vec<String> = self.caches.read().await.keys().cloned().collect();
        names.sort();
        names
    }

    /// Add entries to the named cache, creating it when missing.
    pub async fn add_all(&self, name: &str, entries: Vec<(String, Asset)>) {
        let mut caches = self.caches.write().await;
        caches.entry(name.to_string()).or_default().extend(entries);
    }

    /// Remove a cache. Returns whether it existed.
    pub async fn delete(&self, name: &str) -> bool {
        self.caches.write().await.remove(name).is_some()
    }

    /// Find `path` in `preferred` first, then in any other cache.
    pub async fn match_path(&self, path: &str, preferred: &str) -> Option<Asset> {
        let caches = self.caches.read().await;
        if let Some(asset) = caches.get(preferred).and_then(|cache| cache.get(path)) {
            return Some(asset.clone());
        }
        caches
            .iter()
            .filter(|(name, _)| name.as_str() != preferred)
            .find_map(|(_, cache)| cache.get(path).cloned())
    }
}

// =============================================================================
// SHELL
// =============================================================================

pub struct OfflineShell {
    cache_name: String,
    assets: Vec<String>,
    source: Arc<dyn AssetSource>,
    storage: CacheStorage,
}

impl OfflineShell {
    #[must_use]
    pub fn new(cache_name: impl Into<String>, assets: Vec<String>, source: Arc<dyn AssetSource>, storage: CacheStorage) -> Self {
        Self { cache_name: cache_name.into(), assets, source, storage }
    }

    #[must_use]
    pub fn cache_name(&self) -> &str {
        &self.cache_name
    }

    #[cfg(test)]
    pub(crate) fn storage(&self) -> &CacheStorage {
        &self.storage
    }

    /// Populate this version's cache with every listed asset.
    ///
    /// # Errors
    ///
    /// Returns the first fetch error; the cache is left untouched.
    pub async fn install(&self) -> Result<usize, ShellError> {
        let mut entries = Vec::with_capacity(self.assets.len());
        for path in &self.assets {
            let key = normalize_path(path);
            let asset = self.source.fetch(&key).await?;
            entries.push((key, asset));
        }

        let count = entries.len();
        self.storage.add_all(&self.cache_name, entries).await;
        info!(cache = %self.cache_name, assets = count, "offline shell installed");
        Ok(count)
    }

    /// Delete every cache except this version's. Returns the deleted names.
    pub async fn activate(&self) -> Vec<String> {
        let mut deleted = Vec::new();
        for name in self.storage.keys().await {
            if name != self.cache_name && self.storage.delete(&name).await {
                info!(cache = %name, "stale cache deleted");
                deleted.push(name);
            }
        }
        deleted
    }

    /// Serve `path` from cache, falling back to the asset source.
    ///
    /// # Errors
    ///
    /// Returns the source's error on a cache miss.
    pub async fn fetch(&self, path: &str) -> Result<Asset, ShellError> {
        let key = normalize_path(path);
        if let Some(asset) = self.storage.match_path(&key, &self.cache_name).await {
            debug!(path = %key, "cache hit");
            return Ok(asset);
        }
        debug!(path = %key, "cache miss");
        self.source.fetch(&key).await
    }
}

/// Cache key for a request path: query and fragment dropped, leading `/` kept.
fn normalize_path(path: &str) -> String {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    if path.starts_with('/') { path.to_string() } else { format!("/{path}") }
}

// =============================================================================
// DIRECTORY SOURCE
// =============================================================================

const OCTET_STREAM: &str = "application/octet-stream";

/// Serves assets from a directory on disk through `ServeDir`.
pub struct DirAssetSource {
    files: ServeDir,
}

impl DirAssetSource {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { files: ServeDir::new(root.into()).append_index_html_on_directories(true) }
    }
}

#[async_trait::async_trait]
impl AssetSource for DirAssetSource {
    async fn fetch(&self, path: &str) -> Result<Asset, ShellError> {
        let failed = |reason: String| ShellError::Fetch { path: path.to_string(), reason };

        let request = Request::get(path).body(Body::empty()).map_err(|e| failed(e.to_string()))?;
        let response = self.files.clone().oneshot(request).await.unwrap_or_else(|never| match never {});

        match response.status() {
            StatusCode::NOT_FOUND => return Err(ShellError::NotFound(path.to_string())),
            status if !status.is_success() => return Err(failed(format!("status {status}"))),
            _ => {}
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or(OCTET_STREAM)
            .to_string();
        let body = axum::body::to_bytes(Body::new(response.into_body()), usize::MAX)
            .await
            .map_err(|e| failed(e.to_string()))?;
        Ok(Asset { content_type, body })
    }
}

#[cfg(test)]
#[path = "shell_test.rs"]
mod tests;
