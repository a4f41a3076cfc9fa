//! Time-based caching of the exchange rate table.
//!
//! The cache holds at most one table. It is fresh while its age is strictly
//! less than the freshness window; time is supplied by the caller so tests can
//! drive expiry with a [`ManualClock`].

use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};

use super::rates::RateTable;

/// Default freshness window (1 hour).
pub const DEFAULT_FRESHNESS_SECS: i64 = 3600;

/// Source of the current time.
pub trait Clock: Send + Sync {
    /// Returns the current instant.
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    /// Creates a clock frozen at `start`.
    #[must_use]
    pub const fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    /// Moves the clock forward.
    pub fn advance(&self, by: Duration) {
        if let Ok(mut now) = self.now.lock() {
            *now += by;
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.now
            .lock()
            .map_or_else(|poisoned| *poisoned.into_inner(), |now| *now)
    }
}

/// A cached table with the instant it was stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedRates {
    /// The cached table.
    pub table: RateTable,
    /// When the table was fetched.
    pub fetched_at: DateTime<Utc>,
}

/// Single-entry cache for the rate table.
#[derive(Debug, Clone)]
pub struct RateCache {
    freshness: Duration,
    entry: Option<CachedRates>,
}

impl RateCache {
    /// Creates an empty cache with the given freshness window.
    #[must_use]
    pub const fn new(freshness: Duration) -> Self {
        Self {
            freshness,
            entry: None,
        }
    }

    /// Returns the cached table if it is younger than the freshness window.
    #[must_use]
    pub fn get(&self, now: DateTime<Utc>) -> Option<RateTable> {
        self.entry
            .as_ref()
            .filter(|cached| now - cached.fetched_at < self.freshness)
            .map(|cached| cached.table.clone())
    }

    /// Replaces the cached table, recording `now` as its fetch time.
    pub fn put(&mut self, table: RateTable, now: DateTime<Utc>) {
        self.entry = Some(CachedRates {
            table,
            fetched_at: now,
        });
    }

    /// Returns the cached entry regardless of age.
    #[must_use]
    pub const fn entry(&self) -> Option<&CachedRates> {
        self.entry.as_ref()
    }

    /// Drops the cached entry.
    pub fn clear(&mut self) {
        self.entry = None;
    }
}

impl Default for RateCache {
    fn default() -> Self {
        Self::new(Duration::seconds(DEFAULT_FRESHNESS_SECS))
    }
}
