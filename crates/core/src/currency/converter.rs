//! Cached, failure-tolerant currency conversion.

use std::sync::Arc;

use chrono::Duration;
use rust_decimal::Decimal;
use subtally_shared::types::Currency;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::cache::{Clock, RateCache, SystemClock};
use super::conversion::{ConversionError, convert_with_table};
use super::provider::RateProvider;
use super::rates::RateTable;

/// Converts amounts between supported currencies.
///
/// Owns its rate cache. A refresh happens when the cache is empty or stale;
/// the cache lock is held for the duration of the fetch so concurrent callers
/// share one request. When the provider fails the fallback table is used for
/// that call and nothing is cached, so the next call retries the fetch.
pub struct CurrencyConverter {
    provider: Arc<dyn RateProvider>,
    clock: Arc<dyn Clock>,
    cache: Mutex<RateCache>,
    fallback: RateTable,
}

impl std::fmt::Debug for CurrencyConverter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CurrencyConverter")
            .field("fallback", &self.fallback)
            .finish_non_exhaustive()
    }
}

impl CurrencyConverter {
    /// Creates a converter with the system clock, a one hour window and the
    /// built-in fallback table.
    #[must_use]
    pub fn new(provider: Arc<dyn RateProvider>) -> Self {
        Self::with_parts(
            provider,
            Arc::new(SystemClock),
            RateCache::default(),
            RateTable::fallback(),
        )
    }

    /// Creates a converter from explicit parts.
    #[must_use]
    pub fn with_parts(
        provider: Arc<dyn RateProvider>,
        clock: Arc<dyn Clock>,
        cache: RateCache,
        fallback: RateTable,
    ) -> Self {
        Self {
            provider,
            clock,
            cache: Mutex::new(cache),
            fallback,
        }
    }

    /// Creates a converter with a custom freshness window and fallback table.
    #[must_use]
    pub fn with_freshness(
        provider: Arc<dyn RateProvider>,
        clock: Arc<dyn Clock>,
        freshness: Duration,
        fallback: RateTable,
    ) -> Self {
        Self::with_parts(provider, clock, RateCache::new(freshness), fallback)
    }

    /// Converts `amount` from `from` to `to`, rounded to cents.
    ///
    /// Same-currency conversions return `amount` unchanged without touching
    /// the cache or the provider. Rate problems degrade to the fallback
    /// table; only an amount too large to represent in `to` fails.
    pub async fn convert(
        &self,
        amount: Decimal,
        from: Currency,
        to: Currency,
    ) -> Result<Decimal, ConversionError> {
        if from == to {
            return Ok(amount);
        }

        let table = self.current_rates().await;
        convert_with_table(amount, from, to, &table)
    }

    /// Returns the table conversions would use right now, refreshing if needed.
    pub async fn current_rates(&self) -> RateTable {
        let mut cache = self.cache.lock().await;
        let now = self.clock.now();

        if let Some(table) = cache.get(now) {
            debug!("Using cached exchange rates");
            return table;
        }

        match self.provider.fetch().await {
            Ok(table) => {
                info!(fetched_at = %now, "Refreshed exchange rates");
                cache.put(table.clone(), now);
                table
            }
            Err(e) => {
                warn!(error = %e, "Failed to fetch exchange rates, using fallback table");
                self.fallback.clone()
            }
        }
    }

    /// Drops the cached table so the next conversion refetches.
    pub async fn invalidate(&self) {
        self.cache.lock().await.clear();
    }
}
