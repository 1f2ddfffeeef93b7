//! Amount validation and currency conversion
//!
//! `Converter` validates the user-supplied amount, resolves the rate through a
//! shared `RateStore`, and returns either a `Conversion` or a typed
//! `ConversionError`. Failures are also forwarded, as a human-readable message,
//! to an injected `ErrorSink`.

use log::{trace, warn};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use crate::data::{CurrencyCode, RateSource};
use crate::format::{format_amount, format_rate};
use crate::rate_store::RateStore;

/// Largest amount accepted for conversion
pub const MAX_AMOUNT: f64 = 1_000_000_000.0;

/// Reasons a raw amount is rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please enter an amount")]
    EmptyInput,

    #[error("Please enter a valid number")]
    NotANumber,

    #[error("Amount must be greater than zero")]
    NonPositive,

    #[error("Amount must not exceed 1,000,000,000")]
    TooLarge,
}

/// Errors returned by `Converter::convert`
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConversionError {
    /// The amount failed validation
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    /// No rate table could be obtained for the source currency
    #[error("Exchange rates for {base} are unavailable. Please try again later.")]
    RatesUnavailable { base: CurrencyCode },

    /// The rate table has no entry for the target currency
    #[error("No exchange rate from {from} to {to}. Please try again later.")]
    UnknownCurrencyPair { from: CurrencyCode, to: CurrencyCode },

    /// The converted amount is not a finite number
    #[error("Converting this amount from {from} to {to} gives a result too large to show")]
    Overflow { from: CurrencyCode, to: CurrencyCode },
}

impl ConversionError {
    /// The conversion phase during which this error occurred
    pub fn phase(&self) -> ConversionPhase {
        match self {
            ConversionError::Invalid(_) => ConversionPhase::Validating,
            ConversionError::RatesUnavailable { .. }
            | ConversionError::UnknownCurrencyPair { .. }
            | ConversionError::Overflow { .. } => ConversionPhase::RateLookup,
        }
    }
}

/// Steps of a single conversion
///
/// `Idle -> Validating -> (Failed | RateLookup) -> (Failed | Computed)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionPhase {
    Idle,
    Validating,
    RateLookup,
    Computed,
    Failed,
}

impl fmt::Display for ConversionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ConversionPhase::Idle => "idle",
            ConversionPhase::Validating => "validating",
            ConversionPhase::RateLookup => "rate lookup",
            ConversionPhase::Computed => "computed",
            ConversionPhase::Failed => "failed",
        };
        f.write_str(label)
    }
}

/// Parses and checks a user-supplied amount
///
/// Surrounding whitespace is ignored. The amount must be a finite number in
/// `(0, MAX_AMOUNT]`.
pub fn validate_amount(raw: &str) -> Result<f64, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyInput);
    }

    let amount: f64 = trimmed
        .parse()
        .ok()
        .filter(|value: &f64| value.is_finite())
        .ok_or(ValidationError::NotANumber)?;

    if amount <= 0.0 {
        Err(ValidationError::NonPositive)
    } else if amount > MAX_AMOUNT {
        Err(ValidationError::TooLarge)
    } else {
        Ok(amount)
    }
}

/// Returns whether `raw` would pass `validate_amount`
pub fn is_valid_amount(raw: &str) -> bool {
    validate_amount(raw).is_ok()
}

/// Receives human-readable failure messages for display
pub trait ErrorSink: Send + Sync {
    fn report_error(&self, message: &str);
}

impl<F> ErrorSink for F
where
    F: Fn(&str) + Send + Sync,
{
    fn report_error(&self, message: &str) {
        self(message)
    }
}

/// Sink that writes failures to the log
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl ErrorSink for LogSink {
    fn report_error(&self, message: &str) {
        warn!("{}", message);
    }
}

/// A request to convert an amount between two currencies
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionRequest {
    /// Amount exactly as entered by the user
    pub amount: String,
    pub from: CurrencyCode,
    pub to: CurrencyCode,
}

impl ConversionRequest {
    pub fn new(amount: impl Into<String>, from: CurrencyCode, to: CurrencyCode) -> Self {
        Self {
            amount: amount.into(),
            from,
            to,
        }
    }

    /// The same request with source and target exchanged
    pub fn swapped(&self) -> Self {
        Self {
            amount: self.amount.clone(),
            from: self.to.clone(),
            to: self.from.clone(),
        }
    }
}

/// A successful conversion
#[derive(Debug, Clone, PartialEq)]
pub struct Conversion {
    pub from: CurrencyCode,
    pub to: CurrencyCode,
    /// Validated input amount, in `from`
    pub amount: f64,
    /// Converted amount, in `to`
    pub converted: f64,
    /// Units of `to` per unit of `from`
    pub rate: f64,
    /// Where the rate came from
    pub source: RateSource,
}

impl Conversion {
    /// Converted amount with two decimals and thousands grouping
    pub fn display_amount(&self) -> String {
        format_amount(self.converted)
    }

    /// Rate description such as `1 USD = 0.9200 EUR`
    pub fn rate_line(&self) -> String {
        format!("1 {} = {} {}", self.from, format_rate(self.rate), self.to)
    }
}

/// Converts amounts using rates from a shared RateStore
///
/// Holds no mutable state; concurrent calls are independent and unordered.
pub struct Converter {
    store: Arc<RateStore>,
    sink: Arc<dyn ErrorSink>,
}

impl Converter {
    /// Creates a Converter that reports failures to the log
    pub fn new(store: Arc<RateStore>) -> Self {
        Self::with_sink(store, Arc::new(LogSink))
    }

    pub fn with_sink(store: Arc<RateStore>, sink: Arc<dyn ErrorSink>) -> Self {
        Self { store, sink }
    }

    /// Validates the request, resolves the rate and computes the converted amount
    ///
    /// Invalid amounts fail before any rate lookup, and equal currencies
    /// convert 1:1 without consulting the store.
    pub async fn convert(&self, request: &ConversionRequest) -> Result<Conversion, ConversionError> {
        let result = self.run(request).await;

        match result {
            Ok(ref conversion) => {
                trace!("{} -> {}", ConversionPhase::Computed, conversion.rate_line());
            }
            Err(ref e) => {
                trace!("{} during {}: {}", ConversionPhase::Failed, e.phase(), e);
                self.sink.report_error(&e.to_string());
            }
        }

        result
    }

    async fn run(&self, request: &ConversionRequest) -> Result<Conversion, ConversionError> {
        trace!("{} -> {}", ConversionPhase::Idle, ConversionPhase::Validating);
        let amount = validate_amount(&request.amount)?;

        if request.from == request.to {
            return Ok(Conversion {
                from: request.from.clone(),
                to: request.to.clone(),
                amount,
                converted: amount,
                rate: 1.0,
                source: RateSource::Identity,
            });
        }

        trace!("{} -> {}", ConversionPhase::Validating, ConversionPhase::RateLookup);
        let lookup = self.store.lookup(&request.from).await.ok_or_else(|| {
            ConversionError::RatesUnavailable {
                base: request.from.clone(),
            }
        })?;

        let rate = lookup
            .rates
            .get(request.to.as_str())
            .ok_or_else(|| ConversionError::UnknownCurrencyPair {
                from: request.from.clone(),
                to: request.to.clone(),
            })?;

        let converted = amount * rate;
        if !converted.is_finite() {
            return Err(ConversionError::Overflow {
                from: request.from.clone(),
                to: request.to.clone(),
            });
        }

        Ok(Conversion {
            from: request.from.clone(),
            to: request.to.clone(),
            amount,
            converted,
            rate,
            source: lookup.source,
        })
    }
}
