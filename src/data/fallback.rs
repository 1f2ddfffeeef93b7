//! Built-in fallback exchange rates
//!
//! A static table of cross rates between the major currencies, used only when
//! neither the cache nor the rate provider can supply rates for a base.

use super::{CurrencyCode, RateTable};

/// Static fallback rates as `(base, [(currency, rate); N])`
///
/// Each row lists how many units of each currency one unit of the base buys.
pub static FALLBACK_RATES: [(&str, [(&str, f64); 5]); 5] = [
    (
        "USD",
        [("USD", 1.0), ("EUR", 0.92), ("GBP", 0.79), ("JPY", 150.25), ("AUD", 1.52)],
    ),
    (
        "EUR",
        [("USD", 1.09), ("EUR", 1.0), ("GBP", 0.86), ("JPY", 163.50), ("AUD", 1.66)],
    ),
    (
        "GBP",
        [("USD", 1.27), ("EUR", 1.16), ("GBP", 1.0), ("JPY", 190.50), ("AUD", 1.93)],
    ),
    (
        "JPY",
        [("USD", 0.0067), ("EUR", 0.0061), ("GBP", 0.0052), ("JPY", 1.0), ("AUD", 0.0101)],
    ),
    (
        "AUD",
        [("USD", 0.66), ("EUR", 0.60), ("GBP", 0.52), ("JPY", 99.01), ("AUD", 1.0)],
    ),
];

/// Get the fallback rate table for a base currency
///
/// Returns `None` if the base currency has no built-in rates.
pub fn fallback_rates(base: &CurrencyCode) -> Option<RateTable> {
    FALLBACK_RATES
        .iter()
        .find(|(code, _)| *code == base.as_str())
        .map(|(_, rates)| rates.iter().copied().collect())
}

/// Currencies with built-in fallback rates, in table order
pub fn supported_currencies() -> Vec<CurrencyCode> {
    FALLBACK_RATES
        .iter()
        .filter_map(|(code, _)| code.parse().ok())
        .collect()
}
