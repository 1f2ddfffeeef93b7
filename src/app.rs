//! Application wiring for xchange
//!
//! Builds the rate store and converter from `Settings` and runs a single
//! `Action`, producing the lines to print. Failures are sent to the error sink
//! and mark the report unsuccessful.

use log::warn;
use reqwest::Client;
use std::sync::Arc;
use thiserror::Error;

use crate::cache::{FileStore, KeyValueStore, MemoryStore};
use crate::cli::{Action, CacheMode, Settings};
use crate::converter::{ConversionError, ConversionRequest, Converter, ErrorSink};
use crate::data::{
    supported_currencies, CurrencyCode, HttpRateProvider, OfflineProvider, RateProvider,
};
use crate::format::format_rate;
use crate::rate_store::RateStore;

/// Errors that prevent the application from starting
#[derive(Debug, Error)]
pub enum AppError {
    /// The HTTP client could not be constructed
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Output of running an action
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    /// Lines for standard output
    pub lines: Vec<String>,
    /// False if any part of the action failed
    pub success: bool,
}

/// Main application struct owning the rate store and converter
pub struct App {
    store: Arc<RateStore>,
    converter: Converter,
    sink: Arc<dyn ErrorSink>,
}

impl App {
    /// Builds the provider, cache store and converter described by `settings`
    pub fn from_settings(settings: &Settings, sink: Arc<dyn ErrorSink>) -> Result<Self, AppError> {
        let provider: Arc<dyn RateProvider> = if settings.offline {
            Arc::new(OfflineProvider)
        } else {
            let client = Client::builder().timeout(settings.timeout).build()?;
            let mut provider = HttpRateProvider::with_client(client).with_base_url(&settings.api_url);
            if let Some(ref key) = settings.api_key {
                provider = provider.with_api_key(key);
            }
            Arc::new(provider)
        };

        let store = Arc::new(RateStore::new(provider, build_cache_store(&settings.cache)));
        Ok(Self::with_store(store, sink))
    }

    /// Creates an App around an existing rate store
    pub fn with_store(store: Arc<RateStore>, sink: Arc<dyn ErrorSink>) -> Self {
        Self {
            converter: Converter::with_sink(store.clone(), sink.clone()),
            store,
            sink,
        }
    }

    /// Runs one action
    pub async fn run(&self, action: &Action) -> Report {
        match action {
            Action::Convert(request) => self.convert(request).await,
            Action::Rates(base) => self.rates(base).await,
            Action::Currencies => Report {
                lines: supported_currencies()
                    .into_iter()
                    .map(String::from)
                    .collect(),
                success: true,
            },
            Action::Warm(bases) => self.warm(bases).await,
        }
    }

    async fn convert(&self, request: &ConversionRequest) -> Report {
        match self.converter.convert(request).await {
            Ok(conversion) => Report {
                lines: vec![
                    format!("{} {}", conversion.display_amount(), conversion.to),
                    format!("{} ({})", conversion.rate_line(), conversion.source),
                ],
                success: true,
            },
            // Already reported by the converter
            Err(_) => Report::default(),
        }
    }

    async fn rates(&self, base: &CurrencyCode) -> Report {
        let Some(lookup) = self.store.lookup(base).await else {
            let error = ConversionError::RatesUnavailable { base: base.clone() };
            self.sink.report_error(&error.to_string());
            return Report::default();
        };

        let mut lines = vec![format!("Rates for 1 {} (source: {})", base, lookup.source)];
        lines.extend(
            lookup
                .rates
                .iter()
                .filter(|(code, _)| *code != base.as_str())
                .map(|(code, rate)| format!("{}  {}", code, format_rate(rate))),
        );
        Report {
            lines,
            success: true,
        }
    }

    async fn warm(&self, bases: &[CurrencyCode]) -> Report {
        let results = self.store.warm(bases).await;
        let success = results.iter().all(|(_, source)| source.is_some());

        let lines = results
            .into_iter()
            .map(|(base, source)| match source {
                Some(source) => format!("{}  {}", base, source),
                None => format!("{}  unavailable", base),
            })
            .collect();

        Report { lines, success }
    }
}

/// Opens the cache store, falling back to memory when no directory is usable
fn build_cache_store(mode: &CacheMode) -> Arc<dyn KeyValueStore> {
    match mode {
        CacheMode::Memory => Arc::new(MemoryStore::new()),
        CacheMode::Disk(Some(dir)) => Arc::new(FileStore::with_dir(dir.clone())),
        CacheMode::Disk(None) => match FileStore::new() {
            Some(store) => Arc::new(store),
            None => {
                warn!("No cache directory available, caching rates in memory only");
                Arc::new(MemoryStore::new())
            }
        },
    }
}
