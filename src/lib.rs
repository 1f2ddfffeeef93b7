//! xchange library
//!
//! Currency conversion backed by a rate store that prefers fresh cached rates,
//! then the live provider, then stale cached rates, then a built-in table.

pub mod app;
pub mod cache;
pub mod cli;
pub mod clock;
pub mod converter;
pub mod data;
pub mod format;
pub mod rate_store;

pub use converter::{
    is_valid_amount, validate_amount, Conversion, ConversionError, ConversionRequest, Converter,
    ErrorSink, ValidationError,
};
pub use rate_store::{RateLookup, RateStore, RateStoreConfig};
