use super::*;
use std::sync::atomic::{AtomicUsize, Ordering};

use indexmap::IndexMap;

fn table() -> RateTable {
    let mut rates = IndexMap::new();
    rates.insert("USD".to_string(), 1.0);
    rates.insert("EUR".to_string(), 0.5);
    rates.insert("JPY".to_string(), 150.0);
    rates.insert("ZZZ".to_string(), 0.0);
    RateTable { base: "USD".into(), rates }
}

// =========================================================================
// MockRates
// =========================================================================

struct MockRates {
    calls: AtomicUsize,
    fail_first: bool,
}

impl MockRates {
    fn new(fail_first: bool) -> Self {
        Self { calls: AtomicUsize::new(0), fail_first }
    }
}

#[async_trait::async_trait]
impl RateSource for MockRates {
    async fn latest(&self) -> Result<RateTable, UtilityError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_first && call == 0 {
            return Err(UtilityError::Network("connection refused".into()));
        }
        Ok(table())
    }
}

// =========================================================================
// parse_rates
// =========================================================================

#[test]
fn parse_rates_reads_base_and_rates() {
    let json = r#"{"provider":"x","base":"USD","date":"2025-01-01","rates":{"USD":1,"EUR":0.92,"GBP":0.79}}"#;
    let table = parse_rates(json).unwrap();
    assert_eq!(table.base, "USD");
    assert_eq!(table.rates.len(), 3);
    assert!((table.rates["EUR"] - 0.92).abs() < f64::EPSILON);
}

#[test]
fn parse_rates_keeps_response_order() {
    let mut json = String::from(r#"{"base":"USD","rates":{"USD":1"#);
    for code in ["AED", "AFN", "ALL", "AMD", "ANG", "AOA", "ARS", "AUD", "AWG", "AZN", "BAM", "BBD", "BDT"] {
        json.push_str(&format!(r#","{code}":2"#));
    }
    for code in ["BGN", "BHD", "BIF", "BMD", "BND", "BOB", "BRL", "BSD", "BTN", "BWP", "BYN", "BZD", "CAD", "EUR"] {
        json.push_str(&format!(r#","{code}":3"#));
    }
    json.push_str("}}");

    let table = parse_rates(&json).unwrap();
    let codes: Vec<&str> = table.rates.keys().map(String::as_str).collect();
    assert_eq!(codes[0], "USD");
    assert_eq!(codes[1], "AED");
    assert_eq!(codes.last(), Some(&"EUR"));
}

#[tokio::test]
async fn currency_list_starts_with_base() {
    struct OrderedRates;

    #[async_trait::async_trait]
    impl RateSource for OrderedRates {
        async fn latest(&self) -> Result<RateTable, UtilityError> {
            let rates = ["USD", "ZAR", "AED", "EUR"].into_iter().map(|c| (c.to_string(), 1.0)).collect();
            Ok(RateTable { base: "USD".into(), rates })
        }
    }

    let list = CurrencyService::new(Arc::new(OrderedRates)).currencies().await.unwrap();
    assert_eq!(list, vec!["USD", "ZAR", "AED", "EUR"]);
}

#[test]
fn parse_rates_defaults_base() {
    let table = parse_rates(r#"{"rates":{"EUR":0.9}}"#).unwrap();
    assert_eq!(table.base, BASE_CURRENCY);
}

#[test]
fn parse_rates_rejects_non_json() {
    let err = parse_rates("<html>rate limited</html>").unwrap_err();
    assert!(matches!(err, UtilityError::Network(_)));
}

#[test]
fn parse_rates_rejects_missing_rates() {
    assert!(matches!(parse_rates(r#"{"base":"USD"}"#), Err(UtilityError::Network(_))));
}

// =========================================================================
// convert_amount
// =========================================================================

#[test]
fn convert_goes_through_base() {
    let conversion = convert_amount(&table(), "10", "EUR", "JPY").unwrap();
    assert!((conversion.result - 3000.0).abs() < 1e-9);
    assert_eq!(conversion.formatted, "3000.00");
}

#[test]
fn convert_rounds_to_two_decimals() {
    let conversion = convert_amount(&table(), " 1 ", "JPY", "USD").unwrap();
    assert_eq!(conversion.formatted, "0.01");
    assert!((conversion.amount - 1.0).abs() < f64::EPSILON);
}

#[test]
fn convert_rejects_bad_amounts() {
    for amount in ["", "  ", "abc", "NaN", "inf"] {
        let err = convert_amount(&table(), amount, "USD", "EUR").unwrap_err();
        assert_eq!(err.to_string(), "Invalid amount", "amount {amount:?}");
    }
}

#[test]
fn convert_rejects_unknown_or_zero_rate() {
    let err = convert_amount(&table(), "5", "USD", "XXX").unwrap_err();
    assert_eq!(err.to_string(), "Unavailable currency");
    let err = convert_amount(&table(), "5", "ZZZ", "USD").unwrap_err();
    assert_eq!(err.to_string(), "Unavailable currency");
}

// =========================================================================
// CurrencyService
// =========================================================================

#[tokio::test]
async fn rates_are_fetched_once() {
    let source = Arc::new(MockRates::new(false));
    let service = CurrencyService::new(source.clone());

    service.rates().await.unwrap();
    service.convert("1", "USD", "EUR").await.unwrap();
    service.currencies().await.unwrap();

    assert_eq!(source.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn failed_fetch_is_not_cached() {
    let source = Arc::new(MockRates::new(true));
    let service = CurrencyService::new(source.clone());

    assert!(matches!(service.rates().await, Err(UtilityError::Network(_))));
    assert!(service.rates().await.is_ok());
    assert_eq!(source.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn currencies_are_limited() {
    struct ManyRates;

    #[async_trait::async_trait]
    impl RateSource for ManyRates {
        async fn latest(&self) -> Result<RateTable, UtilityError> {
            let rates = (0..40).map(|i| (format!("C{i:02}"), 1.0)).collect();
            Ok(RateTable { base: "USD".into(), rates })
        }
    }

    let service = CurrencyService::new(Arc::new(ManyRates));
    let list = service.currencies().await.unwrap();
    assert_eq!(list.len(), CURRENCY_LIST_LIMIT);
    assert_eq!(list[0], "C00");
}

#[tokio::test]
async fn unreachable_endpoint_is_network_error() {
    let client = ExchangeRateClient::new(
        "http://127.0.0.1:9/latest/USD",
        HttpTimeouts { request_secs: 2, connect_secs: 1 },
    )
    .unwrap();
    assert!(matches!(client.latest().await, Err(UtilityError::Network(_))));
}
