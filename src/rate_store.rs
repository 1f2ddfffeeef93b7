//! Rate acquisition with caching and fallback
//!
//! `RateStore` answers "what are the rates for this base currency?" using, in
//! order of preference:
//!
//! 1. a cache entry younger than the TTL (no network access),
//! 2. a live fetch from the rate provider, which is then cached,
//! 3. the cache entry regardless of age, if the fetch failed,
//! 4. the built-in fallback table.
//!
//! A fresh entry is never re-fetched, and a successful fetch always replaces
//! the cached entry. Provider and cache failures never reach the caller; when
//! every source is exhausted the lookup yields `None`.

use chrono::Duration;
use futures::future::join_all;
use log::{debug, info, warn};
use std::sync::Arc;

use crate::cache::{KeyValueStore, RateCache};
use crate::clock::{Clock, SystemClock};
use crate::data::{fallback_rates, CurrencyCode, RateProvider, RateSource, RateTable};

/// Time-to-live for cached rate tables in hours
pub const DEFAULT_TTL_HOURS: i64 = 12;

/// Tunables for a RateStore
#[derive(Debug, Clone)]
pub struct RateStoreConfig {
    /// Maximum age of a cache entry served without contacting the provider
    pub ttl: Duration,
}

impl Default for RateStoreConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::hours(DEFAULT_TTL_HOURS),
        }
    }
}

/// A rate table together with where it came from
#[derive(Debug, Clone, PartialEq)]
pub struct RateLookup {
    pub rates: RateTable,
    pub source: RateSource,
}

/// Produces the best available rate table for a base currency
pub struct RateStore {
    cache: RateCache,
    provider: Arc<dyn RateProvider>,
    clock: Arc<dyn Clock>,
}

impl RateStore {
    /// Creates a RateStore with the system clock and the default 12 hour TTL
    pub fn new(provider: Arc<dyn RateProvider>, store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_config(provider, store, RateStoreConfig::default())
    }

    pub fn with_config(
        provider: Arc<dyn RateProvider>,
        store: Arc<dyn KeyValueStore>,
        config: RateStoreConfig,
    ) -> Self {
        Self {
            cache: RateCache::new(store, config.ttl),
            provider,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replaces the time source used for freshness checks and cache timestamps
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Returns rates for `base`, or `None` when no source can supply them
    pub async fn get_rates(&self, base: &CurrencyCode) -> Option<RateTable> {
        self.lookup(base).await.map(|lookup| lookup.rates)
    }

    /// Like `get_rates`, but also reports which source supplied the table
    ///
    /// Fetched tables are normalized before they are cached or returned:
    /// rates that are not positive finite numbers are dropped and the base
    /// currency is pinned to 1.0. A table left empty counts as a failed fetch.
    pub async fn lookup(&self, base: &CurrencyCode) -> Option<RateLookup> {
        if let Some(cached) = self.cache.read(base, self.clock.now()) {
            if !cached.is_expired {
                debug!("Cache hit for {} (cached at {})", base, cached.cached_at);
                return Some(RateLookup {
                    rates: cached.rates,
                    source: RateSource::Cache,
                });
            }
            debug!(
                "Cached rates for {} are older than {}h",
                base,
                self.cache.ttl().num_hours()
            );
        } else {
            debug!("Cache miss for {}", base);
        }

        match self.fetch(base).await {
            Some(rates) => {
                if !self.cache.write(base, &rates, self.clock.now()) {
                    debug!("Fetched rates for {} were not cached", base);
                }
                Some(RateLookup {
                    rates,
                    source: RateSource::Live,
                })
            }
            None => self.degraded(base),
        }
    }

    /// Looks up several bases concurrently, e.g. to prefetch the cache
    ///
    /// Each base is resolved independently; the result lists the source used
    /// for each, or `None` if the base could not be resolved.
    pub async fn warm(&self, bases: &[CurrencyCode]) -> Vec<(CurrencyCode, Option<RateSource>)> {
        let lookups = bases.iter().map(|base| self.lookup(base));
        let results = join_all(lookups).await;

        bases
            .iter()
            .cloned()
            .zip(results.into_iter().map(|lookup| lookup.map(|l| l.source)))
            .collect()
    }

    /// Fetches from the provider, logging and discarding any failure
    async fn fetch(&self, base: &CurrencyCode) -> Option<RateTable> {
        debug!("Fetching rates for {} from {} provider", base, self.provider.name());
        match self.provider.fetch_rates(base).await {
            Ok(rates) => {
                let sanitized = rates.sanitized(base);
                if sanitized.is_none() {
                    warn!("Provider {} returned no usable rates for {}", self.provider.name(), base);
                }
                sanitized
            }
            Err(e) => {
                warn!("Provider {} failed for {}: {}", self.provider.name(), base, e);
                None
            }
        }
    }

    /// Resolves `base` after a failed fetch: any cache entry, then the fallback table
    fn degraded(&self, base: &CurrencyCode) -> Option<RateLookup> {
        // Re-read so an entry written by a concurrent lookup is picked up
        if let Some(cached) = self.cache.read(base, self.clock.now()) {
            let source = if cached.is_expired {
                info!("Using expired cached rates for {} from {}", base, cached.cached_at);
                RateSource::StaleCache
            } else {
                RateSource::Cache
            };
            return Some(RateLookup {
                rates: cached.rates,
                source,
            });
        }

        match fallback_rates(base) {
            Some(rates) => {
                info!("Using built-in fallback rates for {}", base);
                Some(RateLookup {
                    rates,
                    source: RateSource::Fallback,
                })
            }
            None => {
                warn!("No rates available for {}", base);
                None
            }
        }
    }
}
