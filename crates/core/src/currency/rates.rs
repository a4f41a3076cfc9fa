//! USD-relative exchange rate tables.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::Serialize;
use subtally_shared::types::Currency;
use thiserror::Error;

/// Errors raised while obtaining or validating a rate table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RateError {
    /// The request could not be sent or the body could not be read.
    #[error("rate request failed: {0}")]
    Transport(String),

    /// The rate endpoint answered with a non-success status.
    #[error("rate endpoint returned status {0}")]
    Status(u16),

    /// The body was not the expected JSON shape.
    #[error("malformed rate response: {0}")]
    Malformed(String),

    /// A supported currency has no rate.
    #[error("no rate for {0}")]
    MissingCurrency(Currency),

    /// A rate was zero or negative.
    #[error("invalid rate {rate} for {currency}")]
    InvalidRate {
        /// Offending currency.
        currency: Currency,
        /// Offending rate.
        rate: Decimal,
    },
}

/// Exchange rates relative to USD.
///
/// Every supported currency has a strictly positive rate and USD is exactly 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RateTable {
    rates: HashMap<Currency, Decimal>,
}

impl RateTable {
    /// Builds a table, forcing USD to 1.
    ///
    /// # Errors
    ///
    /// Returns `RateError::MissingCurrency` if a supported currency is absent
    /// and `RateError::InvalidRate` if any rate is not positive.
    pub fn new(mut rates: HashMap<Currency, Decimal>) -> Result<Self, RateError> {
        rates.insert(Currency::Usd, Decimal::ONE);

        for currency in Currency::ALL {
            let rate = rates
                .get(&currency)
                .copied()
                .ok_or(RateError::MissingCurrency(currency))?;
            if rate <= Decimal::ZERO {
                return Err(RateError::InvalidRate { currency, rate });
            }
        }

        Ok(Self { rates })
    }

    /// Approximate rates used when nothing better is available.
    #[must_use]
    pub fn fallback() -> Self {
        Self {
            rates: HashMap::from([
                (Currency::Usd, Decimal::ONE),
                (Currency::Inr, Decimal::from(83)),
            ]),
        }
    }

    /// Returns the units of `currency` per one USD.
    #[must_use]
    pub fn rate(&self, currency: Currency) -> Decimal {
        self.rates.get(&currency).copied().unwrap_or(Decimal::ONE)
    }

    /// Returns the underlying map.
    #[must_use]
    pub const fn rates(&self) -> &HashMap<Currency, Decimal> {
        &self.rates
    }
}
