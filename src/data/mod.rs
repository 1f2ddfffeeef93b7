//! Core data models for xchange
//!
//! This module contains the currency and rate-table types shared by the rate
//! store, the provider clients and the converter.

pub mod fallback;
pub mod provider;

pub use fallback::{fallback_rates, supported_currencies};
pub use provider::{HttpRateProvider, OfflineProvider, ProviderError, RateProvider};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error returned when a string is not a usable currency code
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid currency code: '{0}' (expected three letters, e.g. USD)")]
pub struct CurrencyCodeError(pub String);

/// An ISO-4217-style currency code: three ASCII uppercase letters
///
/// Parsing trims surrounding whitespace and uppercases the input, so `" usd"`
/// parses to `USD`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CurrencyCode(String);

impl CurrencyCode {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for CurrencyCode {
    type Err = CurrencyCodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_ascii_uppercase();
        if code.len() == 3 && code.chars().all(|c| c.is_ascii_uppercase()) {
            Ok(Self(code))
        } else {
            Err(CurrencyCodeError(s.to_string()))
        }
    }
}

impl TryFrom<String> for CurrencyCode {
    type Error = CurrencyCodeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CurrencyCode> for String {
    fn from(code: CurrencyCode) -> Self {
        code.0
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Exchange rates relative to a single base currency
///
/// Each entry means "1 unit of the base currency equals `rate` units of this
/// currency". Serializes as a flat `{"EUR": 0.92, ...}` object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RateTable(BTreeMap<String, f64>);

impl RateTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rate for the given currency code, if present
    pub fn get(&self, code: &str) -> Option<f64> {
        self.0.get(code).copied()
    }

    pub fn insert(&mut self, code: impl Into<String>, rate: f64) {
        self.0.insert(code.into(), rate);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over `(code, rate)` pairs in code order
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(code, rate)| (code.as_str(), *rate))
    }

    /// Normalizes a table received from a provider or read back from the cache
    ///
    /// Drops entries whose rate is not a positive finite number and pins the
    /// base currency to 1.0. Returns `None` when no usable rate remains.
    pub fn sanitized(self, base: &CurrencyCode) -> Option<RateTable> {
        let mut rates: BTreeMap<String, f64> = self
            .0
            .into_iter()
            .filter(|(_, rate)| rate.is_finite() && *rate > 0.0)
            .collect();

        if rates.is_empty() {
            return None;
        }

        rates.insert(base.as_str().to_string(), 1.0);
        Some(RateTable(rates))
    }
}

impl<S: Into<String>> FromIterator<(S, f64)> for RateTable {
    fn from_iter<I: IntoIterator<Item = (S, f64)>>(iter: I) -> Self {
        RateTable(iter.into_iter().map(|(code, rate)| (code.into(), rate)).collect())
    }
}

/// Where the rates used for a lookup came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateSource {
    /// Cache entry younger than the TTL
    Cache,
    /// Fresh response from the rate provider
    Live,
    /// Expired cache entry, used because the provider failed
    StaleCache,
    /// Built-in fallback table
    Fallback,
    /// Source and target currency are the same
    Identity,
}

impl fmt::Display for RateSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RateSource::Cache => "cache",
            RateSource::Live => "live",
            RateSource::StaleCache => "stale cache",
            RateSource::Fallback => "built-in fallback",
            RateSource::Identity => "identity",
        };
        f.write_str(label)
    }
}
