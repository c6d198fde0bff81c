//! Currency converter — exchange rates from a public endpoint.
//!
//! DESIGN
//! ======
//! Rates are fetched once with a single GET against a fixed base currency
//! and kept in memory after the first success. A failed fetch is not cached,
//! so the next request tries again. `RateSource` is the seam tests mock.
//!
//! Conversion goes through the base: `amount / rate[from] * rate[to]`.

use std::sync::Arc;
use std::time::Duration;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::error::UtilityError;

pub const DEFAULT_RATES_URL: &str = "https://api.exchangerate-api.com/v4/latest/USD";
pub const BASE_CURRENCY: &str = "USD";
pub const CURRENCY_LIST_LIMIT: usize = 25;

// =============================================================================
// TYPES
// =============================================================================

/// Rates relative to `base`, keyed by currency code in response order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateTable {
    pub base: String,
    pub rates: IndexMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Conversion {
    pub amount: f64,
    pub from: String,
    pub to: String,
    pub result: f64,
    /// `result` rounded to two decimals, as shown to the user.
    pub formatted: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpTimeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

/// Provider of the latest rate table. Enables mocking in tests.
#[async_trait::async_trait]
pub trait RateSource: Send + Sync {
    /// Fetch the latest rate table.
    ///
    /// # Errors
    ///
    /// Returns `Network` if the request or response parsing fails.
    async fn latest(&self) -> Result<RateTable, UtilityError>;
}

// =============================================================================
// HTTP CLIENT
// =============================================================================

pub struct ExchangeRateClient {
    http: reqwest::Client,
    url: String,
}

impl ExchangeRateClient {
    /// # Errors
    ///
    /// Returns `Network` if the HTTP client cannot be built.
    pub fn new(url: impl Into<String>, timeouts: HttpTimeouts) -> Result<Self, UtilityError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeouts.request_secs))
            .connect_timeout(Duration::from_secs(timeouts.connect_secs))
            .build()
            .map_err(|e| UtilityError::Network(format!("http client build failed: {e}")))?;
        Ok(Self { http, url: url.into() })
    }
}

#[async_trait::async_trait]
impl RateSource for ExchangeRateClient {
    async fn latest(&self) -> Result<RateTable, UtilityError> {
        let response = self
            .http
            .get(&self.url)
            .send()
            .await
            .map_err(|e| UtilityError::Network(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| UtilityError::Network(e.to_string()))?;

        if !status.is_success() {
            return Err(UtilityError::Network(format!("exchange-rate service returned {status}")));
        }

        parse_rates(&text)
    }
}

#[derive(Deserialize)]
struct ApiResponse {
    #[serde(default)]
    base: Option<String>,
    rates: IndexMap<String, f64>,
}

pub(crate) fn parse_rates(json: &str) -> Result<RateTable, UtilityError> {
    let api: ApiResponse =
        serde_json::from_str(json).map_err(|e| UtilityError::Network(format!("malformed rate response: {e}")))?;
    Ok(RateTable { base: api.base.unwrap_or_else(|| BASE_CURRENCY.to_string()), rates: api.rates })
}

// =============================================================================
// CONVERSION
// =============================================================================

/// Convert `amount` (as typed by the user) from one currency to another.
///
/// # Errors
///
/// Returns `Validation("Invalid amount")` for empty or non-numeric input and
/// `Validation("Unavailable currency")` when either code has no usable rate.
pub fn convert_amount(table: &RateTable, amount: &str, from: &str, to: &str) -> Result<Conversion, UtilityError> {
    let value = amount
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| UtilityError::validation("Invalid amount"))?;

    let (Some(from_rate), Some(to_rate)) = (usable_rate(table, from), usable_rate(table, to)) else {
        return Err(UtilityError::validation("Unavailable currency"));
    };

    let result = value / from_rate * to_rate;
    Ok(Conversion {
        amount: value,
        from: from.to_string(),
        to: to.to_string(),
        result,
        formatted: format!("{result:.2}"),
    })
}

fn usable_rate(table: &RateTable, code: &str) -> Option<f64> {
    table
        .rates
        .get(code)
        .copied()
        .filter(|rate| rate.is_finite() && *rate > 0.0)
}

// =============================================================================
// SERVICE
// =============================================================================

pub struct CurrencyService {
    source: Arc<dyn RateSource>,
    cached: RwLock<Option<RateTable>>,
}

impl CurrencyService {
    #[must_use]
    pub fn new(source: Arc<dyn RateSource>) -> Self {
        Self { source, cached: RwLock::new(None) }
    }

    /// The rate table, fetched on first use.
    ///
    /// # Errors
    ///
    /// Returns `Network` if the table has not been loaded yet and the fetch fails.
    pub async fn rates(&self) -> Result<RateTable, UtilityError> {
        if let Some(table) = self.cached.read().await.as_ref() {
            return Ok(table.clone());
        }

        let mut cached = self.cached.write().await;
        if let Some(table) = cached.as_ref() {
            return Ok(table.clone());
        }

        match self.source.latest().await {
            Ok(table) => {
                info!(base = %table.base, currencies = table.rates.len(), "exchange rates loaded");
                *cached = Some(table.clone());
                Ok(table)
            }
            Err(e) => {
                warn!(error = %e, "failed to load exchange rates");
                Err(e)
            }
        }
    }

    /// The first [`CURRENCY_LIST_LIMIT`] currency codes offered for selection,
    /// in the order the rate service listed them.
    ///
    /// # Errors
    ///
    /// Returns `Network` if the rates cannot be loaded.
    pub async fn currencies(&self) -> Result<Vec<String>, UtilityError> {
        let table = self.rates().await?;
        Ok(table.rates.into_keys().take(CURRENCY_LIST_LIMIT).collect())
    }

    /// # Errors
    ///
    /// Returns `Network` if the rates cannot be loaded, or `Validation` for
    /// bad input.
    pub async fn convert(&self, amount: &str, from: &str, to: &str) -> Result<Conversion, UtilityError> {
        let table = self.rates().await?;
        convert_amount(&table, amount, from, to)
    }
}

#[cfg(test)]
#[path = "currency_test.rs"]
mod tests;
