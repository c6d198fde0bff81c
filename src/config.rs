//! Service configuration parsed from environment variables.

use std::path::PathBuf;
use std::str::FromStr;

use crate::services::currency::{DEFAULT_RATES_URL, HttpTimeouts};
use crate::shell::{DEFAULT_ASSETS, DEFAULT_CACHE_NAME};

pub const DEFAULT_DATABASE_URL: &str = "sqlite://seven-utility.db";
pub const DEFAULT_DB_MAX_CONNECTIONS: u32 = 5;
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_RATES_REQUEST_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_RATES_CONNECT_TIMEOUT_SECS: u64 = 5;
pub const DEFAULT_ASSET_DIR: &str = "public";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub database_url: String,
    pub db_max_connections: u32,
    pub port: u16,
    pub rates_url: String,
    pub rates_timeouts: HttpTimeouts,
    pub asset_dir: PathBuf,
    pub cache_name: String,
    pub assets: Vec<String>,
}

impl AppConfig {
    /// Build typed config from environment variables.
    ///
    /// Optional:
    /// - `DATABASE_URL`: default `sqlite://seven-utility.db`
    /// - `DB_MAX_CONNECTIONS`: default 5
    /// - `PORT`: default 3000
    /// - `RATES_URL`: exchange-rate endpoint
    /// - `RATES_REQUEST_TIMEOUT_SECS`: default 10
    /// - `RATES_CONNECT_TIMEOUT_SECS`: default 5
    /// - `ASSET_DIR`: default `public`
    /// - `CACHE_NAME`: offline shell version tag
    /// - `SHELL_ASSETS`: comma-separated asset paths
    ///
    /// # Errors
    ///
    /// Returns `Invalid` if `PORT` is set but is not a valid port number.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`AppConfig::from_env`] over an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns `Invalid` if `PORT` is set but is not a valid port number.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let port = match lookup("PORT") {
            Some(raw) => raw.trim().parse::<u16>().map_err(|_| ConfigError::Invalid { key: "PORT", value: raw })?,
            None => DEFAULT_PORT,
        };

        let assets = lookup("SHELL_ASSETS")
            .map(|raw| parse_asset_list(&raw))
            .filter(|list| !list.is_empty())
            .unwrap_or_else(|| DEFAULT_ASSETS.iter().map(|p| (*p).to_string()).collect());

        Ok(Self {
            database_url: lookup("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            db_max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", DEFAULT_DB_MAX_CONNECTIONS).max(1),
            port,
            rates_url: lookup("RATES_URL").unwrap_or_else(|| DEFAULT_RATES_URL.to_string()),
            rates_timeouts: HttpTimeouts {
                request_secs: parse_or(&lookup, "RATES_REQUEST_TIMEOUT_SECS", DEFAULT_RATES_REQUEST_TIMEOUT_SECS),
                connect_secs: parse_or(&lookup, "RATES_CONNECT_TIMEOUT_SECS", DEFAULT_RATES_CONNECT_TIMEOUT_SECS),
            },
            asset_dir: lookup("ASSET_DIR").map_or_else(|| PathBuf::from(DEFAULT_ASSET_DIR), PathBuf::from),
            cache_name: lookup("CACHE_NAME").unwrap_or_else(|| DEFAULT_CACHE_NAME.to_string()),
            assets,
        })
    }
}

/// Parse a variable, falling back to `default` when missing or malformed.
fn parse_or<T: FromStr + Copy>(lookup: impl Fn(&str) -> Option<String>, key: &str, default: T) -> T {
    lookup(key)
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}

fn parse_asset_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|p| if p.starts_with('/') { p.to_string() } else { format!("/{p}") })
        .collect()
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
