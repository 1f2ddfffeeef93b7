//! Rate tables persisted in a key-value store
//!
//! Each base currency uses two keys: `rates_{BASE}` holds the table as a flat
//! JSON object and `rates_timestamp_{BASE}` holds the time it was cached in
//! milliseconds since the Unix epoch.

use chrono::{DateTime, Duration, Utc};
use log::{debug, warn};
use std::sync::Arc;

use super::store::KeyValueStore;
use crate::data::{CurrencyCode, RateTable};

/// Key prefix for serialized rate tables
pub const RATES_CACHE_PREFIX: &str = "rates_";

/// Key prefix for cache timestamps
pub const RATES_TIMESTAMP_PREFIX: &str = "rates_timestamp_";

/// Result of reading rates from cache, including freshness metadata
#[derive(Debug, Clone, PartialEq)]
pub struct CachedRates {
    /// The cached rate table
    pub rates: RateTable,
    /// When the table was cached
    pub cached_at: DateTime<Utc>,
    /// Whether the entry is older than the TTL
    pub is_expired: bool,
}

/// Reads and writes rate tables with expiry checks
///
/// Expired entries are still returned (with `is_expired = true`) so callers can
/// fall back to them when the provider is unavailable. Store failures are
/// logged and reported as a miss.
#[derive(Clone)]
pub struct RateCache {
    store: Arc<dyn KeyValueStore>,
    ttl: Duration,
}

impl RateCache {
    pub fn new(store: Arc<dyn KeyValueStore>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn rates_key(base: &CurrencyCode) -> String {
        format!("{}{}", RATES_CACHE_PREFIX, base)
    }

    fn timestamp_key(base: &CurrencyCode) -> String {
        format!("{}{}", RATES_TIMESTAMP_PREFIX, base)
    }

    /// Reads the entry for `base` as seen at time `now`
    ///
    /// Returns `None` if either key is missing, either value cannot be parsed,
    /// or the store fails.
    pub fn read(&self, base: &CurrencyCode, now: DateTime<Utc>) -> Option<CachedRates> {
        let raw_rates = self.get(&Self::rates_key(base))?;
        let raw_timestamp = self.get(&Self::timestamp_key(base))?;

        let rates = match serde_json::from_str::<RateTable>(&raw_rates) {
            Ok(rates) => rates.sanitized(base)?,
            Err(e) => {
                debug!("Ignoring unparseable cached rates for {}: {}", base, e);
                return None;
            }
        };

        let cached_at = match raw_timestamp
            .trim()
            .parse::<i64>()
            .ok()
            .and_then(DateTime::<Utc>::from_timestamp_millis)
        {
            Some(cached_at) => cached_at,
            None => {
                debug!("Ignoring cached rates for {} with bad timestamp {:?}", base, raw_timestamp);
                return None;
            }
        };

        // Entries from the future count as fresh
        let is_expired = now.signed_duration_since(cached_at) > self.ttl;

        Some(CachedRates {
            rates,
            cached_at,
            is_expired,
        })
    }

    /// Stores `rates` for `base` with timestamp `now`, replacing any previous entry
    ///
    /// Returns whether both keys were written.
    pub fn write(&self, base: &CurrencyCode, rates: &RateTable, now: DateTime<Utc>) -> bool {
        let json = match serde_json::to_string(rates) {
            Ok(json) => json,
            Err(e) => {
                warn!("Could not serialize rates for {}: {}", base, e);
                return false;
            }
        };

        self.set(&Self::rates_key(base), &json)
            && self.set(&Self::timestamp_key(base), &now.timestamp_millis().to_string())
    }

    fn get(&self, key: &str) -> Option<String> {
        match self.store.get(key) {
            Ok(value) => value,
            Err(e) => {
                warn!("Cache read failed for {}: {}", key, e);
                None
            }
        }
    }

    fn set(&self, key: &str, value: &str) -> bool {
        match self.store.set(key, value) {
            Ok(()) => true,
            Err(e) => {
                warn!("Cache write failed for {}: {}", key, e);
                false
            }
        }
    }
}
