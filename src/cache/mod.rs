//! Cache module for storing exchange rates
//!
//! This module provides the key-value stores rates are persisted in, and a
//! rate cache layered on top that records when each table was stored. Expired
//! entries are still returned with an `is_expired` flag so the application can
//! use stale rates when the provider is unavailable.

mod rates;
mod store;

pub use rates::{CachedRates, RateCache, RATES_CACHE_PREFIX, RATES_TIMESTAMP_PREFIX};
pub use store::{CacheError, FileStore, KeyValueStore, MemoryStore};
