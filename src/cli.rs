//! Command-line interface parsing for xchange
//!
//! This module parses CLI arguments using clap and turns them into validated
//! `Settings`: currency codes are checked, `--swap` is applied, and the
//! verbosity count becomes a log level.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::converter::ConversionRequest;
use crate::data::provider::DEFAULT_BASE_URL;
use crate::data::{supported_currencies, CurrencyCode, CurrencyCodeError};

/// Error types for CLI argument validation
#[derive(Debug, Error)]
pub enum CliError {
    /// A currency argument is not a three-letter code
    #[error(transparent)]
    InvalidCurrency(#[from] CurrencyCodeError),
}

/// xchange - convert currencies with cached exchange rates
#[derive(Parser, Debug)]
#[command(name = "xchange")]
#[command(about = "Currency conversion with cached exchange rates and offline fallback")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Directory for cached rates (defaults to the user cache directory)
    #[arg(long, global = true, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Keep cached rates in memory only
    #[arg(long, global = true)]
    pub no_cache: bool,

    /// Never contact the rate provider
    #[arg(long, global = true)]
    pub offline: bool,

    /// Rate provider endpoint
    #[arg(long, global = true, env = "XCHANGE_API_URL", value_name = "URL")]
    pub api_url: Option<String>,

    /// Access key for the rate provider
    #[arg(long, global = true, env = "XCHANGE_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// HTTP timeout for rate requests, in seconds
    #[arg(
        long,
        global = true,
        value_name = "SECS",
        default_value_t = 10,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub timeout: u64,

    /// Increase log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Convert an amount between two currencies
    ///
    /// Examples:
    ///   xchange convert 100 USD EUR
    ///   xchange convert 2500 eur jpy --swap
    Convert {
        /// Amount to convert
        #[arg(allow_hyphen_values = true)]
        amount: String,
        /// Source currency code
        from: String,
        /// Target currency code
        to: String,
        /// Exchange source and target currencies
        #[arg(long)]
        swap: bool,
    },

    /// Show the rate table for a base currency
    Rates {
        /// Base currency code
        base: String,
    },

    /// List currencies with built-in fallback rates
    Currencies,

    /// Prefetch rate tables into the cache
    Warm {
        /// Base currencies to fetch (default: all built-in currencies)
        bases: Vec<String>,
    },
}

/// What the application should do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Convert(ConversionRequest),
    Rates(CurrencyCode),
    Currencies,
    Warm(Vec<CurrencyCode>),
}

/// Where cached rates are kept
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheMode {
    /// On disk, in the given directory or the default one
    Disk(Option<PathBuf>),
    /// In process memory, discarded on exit
    Memory,
}

/// Configuration derived from CLI arguments
#[derive(Debug, Clone)]
pub struct Settings {
    pub action: Action,
    pub cache: CacheMode,
    pub offline: bool,
    pub api_url: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
    pub log_level: log::LevelFilter,
}

/// Parses a currency argument, accepting lowercase input
pub fn parse_currency_arg(s: &str) -> Result<CurrencyCode, CliError> {
    Ok(s.parse()?)
}

impl Settings {
    /// Creates Settings from parsed CLI arguments.
    ///
    /// # Returns
    /// * `Ok(Settings)` with validated currencies
    /// * `Err(CliError)` if a currency argument is invalid
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        let action = match &cli.command {
            Command::Convert {
                amount,
                from,
                to,
                swap,
            } => {
                let request = ConversionRequest::new(
                    amount.clone(),
                    parse_currency_arg(from)?,
                    parse_currency_arg(to)?,
                );
                Action::Convert(if *swap { request.swapped() } else { request })
            }
            Command::Rates { base } => Action::Rates(parse_currency_arg(base)?),
            Command::Currencies => Action::Currencies,
            Command::Warm { bases } if bases.is_empty() => Action::Warm(supported_currencies()),
            Command::Warm { bases } => Action::Warm(
                bases
                    .iter()
                    .map(|base| parse_currency_arg(base))
                    .collect::<Result<_, _>>()?,
            ),
        };

        let cache = if cli.no_cache {
            CacheMode::Memory
        } else {
            CacheMode::Disk(cli.cache_dir.clone())
        };

        Ok(Settings {
            action,
            cache,
            offline: cli.offline,
            api_url: cli
                .api_url
                .clone()
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            api_key: cli.api_key.clone(),
            timeout: Duration::from_secs(cli.timeout),
            log_level: log_level(cli.verbose),
        })
    }
}

fn log_level(verbose: u8) -> log::LevelFilter {
    match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code(s: &str) -> CurrencyCode {
        s.parse().unwrap()
    }

    #[test]
    fn test_parse_currency_arg_normalizes_case() {
        assert_eq!(parse_currency_arg("usd").unwrap(), code("USD"));
        assert_eq!(parse_currency_arg("EUR").unwrap(), code("EUR"));
    }

    #[test]
    fn test_parse_currency_arg_invalid() {
        let err = parse_currency_arg("dollar").unwrap_err();
        assert!(err.to_string().contains("Invalid currency code"));
        assert!(err.to_string().contains("dollar"));
    }

    #[test]
    fn test_cli_parse_convert() {
        let cli = Cli::parse_from(["xchange", "convert", "100", "USD", "EUR"]);
        let settings = Settings::from_cli(&cli).unwrap();

        assert_eq!(
            settings.action,
            Action::Convert(ConversionRequest::new("100", code("USD"), code("EUR")))
        );
        assert_eq!(settings.cache, CacheMode::Disk(None));
        assert!(!settings.offline);
        assert_eq!(settings.timeout, Duration::from_secs(10));
        assert_eq!(settings.log_level, log::LevelFilter::Warn);
    }

    #[test]
    fn test_cli_parse_convert_with_swap() {
        let cli = Cli::parse_from(["xchange", "convert", "5", "usd", "jpy", "--swap"]);
        let settings = Settings::from_cli(&cli).unwrap();

        assert_eq!(
            settings.action,
            Action::Convert(ConversionRequest::new("5", code("JPY"), code("USD")))
        );
    }

    #[test]
    fn test_cli_parse_negative_amount_is_kept_for_validation() {
        let cli = Cli::parse_from(["xchange", "convert", "-10", "USD", "EUR"]);
        let settings = Settings::from_cli(&cli).unwrap();

        match settings.action {
            Action::Convert(request) => assert_eq!(request.amount, "-10"),
            other => panic!("Expected convert action, got {:?}", other),
        }
    }

    #[test]
    fn test_cli_parse_invalid_currency() {
        let cli = Cli::parse_from(["xchange", "convert", "100", "USD", "EURO"]);
        assert!(Settings::from_cli(&cli).is_err());
    }

    #[test]
    fn test_cli_parse_global_options() {
        let cli = Cli::parse_from([
            "xchange",
            "rates",
            "gbp",
            "--offline",
            "--no-cache",
            "--timeout",
            "3",
            "--api-url",
            "http://localhost:8080/latest",
            "-vv",
        ]);
        let settings = Settings::from_cli(&cli).unwrap();

        assert_eq!(settings.action, Action::Rates(code("GBP")));
        assert_eq!(settings.cache, CacheMode::Memory);
        assert!(settings.offline);
        assert_eq!(settings.timeout, Duration::from_secs(3));
        assert_eq!(settings.api_url, "http://localhost:8080/latest");
        assert_eq!(settings.log_level, log::LevelFilter::Debug);
    }

    #[test]
    fn test_cli_parse_cache_dir() {
        let cli = Cli::parse_from(["xchange", "currencies", "--cache-dir", "/tmp/rates"]);
        let settings = Settings::from_cli(&cli).unwrap();

        assert_eq!(settings.action, Action::Currencies);
        assert_eq!(
            settings.cache,
            CacheMode::Disk(Some(PathBuf::from("/tmp/rates")))
        );
    }

    #[test]
    fn test_cli_rejects_zero_timeout() {
        let result = Cli::try_parse_from(["xchange", "currencies", "--timeout", "0"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_warm_defaults_to_builtin_currencies() {
        let cli = Cli::parse_from(["xchange", "warm"]);
        let settings = Settings::from_cli(&cli).unwrap();

        assert_eq!(settings.action, Action::Warm(supported_currencies()));
    }

    #[test]
    fn test_warm_with_explicit_bases() {
        let cli = Cli::parse_from(["xchange", "warm", "usd", "chf"]);
        let settings = Settings::from_cli(&cli).unwrap();

        assert_eq!(settings.action, Action::Warm(vec![code("USD"), code("CHF")]));
    }

    #[test]
    fn test_log_levels() {
        assert_eq!(log_level(0), log::LevelFilter::Warn);
        assert_eq!(log_level(1), log::LevelFilter::Info);
        assert_eq!(log_level(2), log::LevelFilter::Debug);
        assert_eq!(log_level(5), log::LevelFilter::Trace);
    }
}
