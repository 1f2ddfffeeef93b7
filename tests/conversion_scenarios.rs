//! End-to-end conversion scenarios against an on-disk cache
//!
//! Each test wires a RateStore to a FileStore in a temporary directory, a
//! manual clock, and a scripted provider that counts its calls.

use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

use xchange::cache::{FileStore, KeyValueStore, RateCache};
use xchange::clock::{Clock, ManualClock};
use xchange::data::{CurrencyCode, ProviderError, RateProvider, RateSource, RateTable};
use xchange::{ConversionError, ConversionRequest, Converter, RateStore, ValidationError};

/// Provider that returns a fixed table, or fails like a dropped connection
struct ScriptedProvider {
    rates: Option<RateTable>,
    calls: AtomicUsize,
}

impl ScriptedProvider {
    fn new(rates: Option<RateTable>) -> Arc<Self> {
        Arc::new(Self {
            rates,
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RateProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn fetch_rates(&self, _base: &CurrencyCode) -> Result<RateTable, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.rates
            .clone()
            .ok_or_else(|| ProviderError::Unsuccessful("API Error".to_string()))
    }
}

struct Scenario {
    converter: Converter,
    provider: Arc<ScriptedProvider>,
    files: Arc<FileStore>,
    clock: Arc<ManualClock>,
    _temp_dir: TempDir,
}

fn scenario(rates: Option<RateTable>) -> Scenario {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let files = Arc::new(FileStore::with_dir(temp_dir.path().to_path_buf()));
    let clock = Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2024, 11, 4, 15, 0, 0).unwrap(),
    ));
    let provider = ScriptedProvider::new(rates);
    let store = RateStore::new(provider.clone(), files.clone()).with_clock(clock.clone());

    Scenario {
        converter: Converter::new(Arc::new(store)),
        provider,
        files,
        clock,
        _temp_dir: temp_dir,
    }
}

fn usd() -> CurrencyCode {
    "USD".parse().unwrap()
}

fn eur() -> CurrencyCode {
    "EUR".parse().unwrap()
}

fn rates(entries: &[(&str, f64)]) -> RateTable {
    entries.iter().copied().collect()
}

fn seed_cache(s: &Scenario, table: &RateTable) {
    RateCache::new(s.files.clone(), Duration::hours(12)).write(&usd(), table, s.clock.now());
}

#[tokio::test]
async fn fresh_cache_converts_without_fetching() {
    let s = scenario(Some(rates(&[("USD", 1.0), ("EUR", 0.5)])));
    seed_cache(&s, &rates(&[("USD", 1.0), ("EUR", 0.92)]));

    let conversion = s
        .converter
        .convert(&ConversionRequest::new("100", usd(), eur()))
        .await
        .unwrap();

    assert_eq!(conversion.display_amount(), "92.00");
    assert_eq!(conversion.rate_line(), "1 USD = 0.9200 EUR");
    assert_eq!(conversion.source, RateSource::Cache);
    assert_eq!(s.provider.calls(), 0);
}

#[tokio::test]
async fn empty_cache_fetches_and_persists() {
    let fetched = rates(&[("USD", 1.0), ("EUR", 0.92)]);
    let s = scenario(Some(fetched.clone()));

    let conversion = s
        .converter
        .convert(&ConversionRequest::new("100", usd(), eur()))
        .await
        .unwrap();

    assert_eq!(conversion.display_amount(), "92.00");
    assert_eq!(s.provider.calls(), 1);

    let stored: RateTable =
        serde_json::from_str(&s.files.get("rates_USD").unwrap().unwrap()).unwrap();
    assert_eq!(stored, fetched);
    assert_eq!(
        s.files.get("rates_timestamp_USD").unwrap(),
        Some(s.clock.now().timestamp_millis().to_string())
    );
}

#[tokio::test]
async fn stale_cache_wins_over_fallback_when_fetch_fails() {
    let s = scenario(None);
    seed_cache(&s, &rates(&[("USD", 1.0), ("EUR", 0.90)]));
    s.clock.advance(Duration::hours(12) + Duration::seconds(1));

    let conversion = s
        .converter
        .convert(&ConversionRequest::new("100", usd(), eur()))
        .await
        .unwrap();

    assert_eq!(conversion.display_amount(), "90.00");
    assert_eq!(conversion.source, RateSource::StaleCache);
    assert_eq!(s.provider.calls(), 1);
}

#[tokio::test]
async fn stale_cache_is_replaced_after_successful_fetch() {
    let s = scenario(Some(rates(&[("USD", 1.0), ("EUR", 0.95)])));
    seed_cache(&s, &rates(&[("USD", 1.0), ("EUR", 0.90)]));
    s.clock.advance(Duration::days(2));

    let first = s
        .converter
        .convert(&ConversionRequest::new("100", usd(), eur()))
        .await
        .unwrap();
    let second = s
        .converter
        .convert(&ConversionRequest::new("100", usd(), eur()))
        .await
        .unwrap();

    assert_eq!(first.display_amount(), "95.00");
    assert_eq!(first.source, RateSource::Live);
    assert_eq!(second.source, RateSource::Cache);
    assert_eq!(s.provider.calls(), 1);
}

#[tokio::test]
async fn invalid_amount_never_reaches_the_store() {
    let s = scenario(Some(rates(&[("USD", 1.0), ("EUR", 0.92)])));

    let err = s
        .converter
        .convert(&ConversionRequest::new("abc", usd(), eur()))
        .await
        .unwrap_err();

    assert_eq!(err, ConversionError::Invalid(ValidationError::NotANumber));
    assert_eq!(s.provider.calls(), 0);
    assert!(s.files.get("rates_USD").unwrap().is_none());
}

#[tokio::test]
async fn same_currency_ignores_store_state() {
    let s = scenario(None);

    let conversion = s
        .converter
        .convert(&ConversionRequest::new("0.01", eur(), eur()))
        .await
        .unwrap();

    assert_eq!(conversion.rate, 1.0);
    assert_eq!(conversion.converted, 0.01);
    assert_eq!(s.provider.calls(), 0);
}

#[tokio::test]
async fn total_failure_is_rates_unavailable() {
    let s = scenario(None);
    let chf: CurrencyCode = "CHF".parse().unwrap();

    let err = s
        .converter
        .convert(&ConversionRequest::new("5", chf.clone(), usd()))
        .await
        .unwrap_err();

    assert_eq!(err, ConversionError::RatesUnavailable { base: chf });
}
