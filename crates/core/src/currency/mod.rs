//! Multi-currency handling and exchange rates.

pub mod cache;
pub mod conversion;
pub mod converter;
pub mod provider;
pub mod rates;

pub use cache::{CachedRates, Clock, ManualClock, RateCache, SystemClock};
pub use conversion::{ConversionError, convert_with_table};
pub use converter::CurrencyConverter;
pub use provider::{HttpRateProvider, RateProvider, parse_rates_response};
pub use rates::{RateError, RateTable};

#[cfg(test)]
pub use provider::MockRateProvider;
