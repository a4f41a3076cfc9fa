//! Exchange rate sources.
//!
//! The converter only depends on [`RateProvider`]. The HTTP implementation
//! expects a JSON body shaped like `{ "rates": { "INR": 83.12, ... } }` with
//! rates relative to USD.

use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Deserialize;
use subtally_shared::types::Currency;
use tracing::debug;

use super::rates::{RateError, RateTable};

/// Port for fetching a fresh USD-relative rate table.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RateProvider: Send + Sync {
    /// Fetches the latest table.
    async fn fetch(&self) -> Result<RateTable, RateError>;
}

/// Rate provider backed by an HTTP JSON endpoint.
#[derive(Debug, Clone)]
pub struct HttpRateProvider {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpRateProvider {
    /// Creates a provider with a per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns `RateError::Transport` if the HTTP client cannot be built.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, RateError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RateError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    /// Returns the configured endpoint.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl RateProvider for HttpRateProvider {
    async fn fetch(&self) -> Result<RateTable, RateError> {
        debug!(endpoint = %self.endpoint, "Fetching exchange rates");

        let response = self
            .client
            .get(&self.endpoint)
            .send()
            .await
            .map_err(|e| RateError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RateError::Status(status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| RateError::Transport(e.to_string()))?;

        parse_rates_response(&body)
    }
}

#[derive(Debug, Deserialize)]
struct RatesResponse {
    rates: HashMap<String, serde_json::Number>,
}

/// Parses a rate endpoint body into a validated table.
///
/// Codes the system does not support are ignored.
///
/// # Errors
///
/// Returns `RateError::Malformed` for bodies that are not the expected shape,
/// and the `RateTable::new` errors for missing or non-positive rates.
pub fn parse_rates_response(body: &str) -> Result<RateTable, RateError> {
    let response: RatesResponse =
        serde_json::from_str(body).map_err(|e| RateError::Malformed(e.to_string()))?;

    let mut rates = HashMap::new();
    for (code, value) in &response.rates {
        let Ok(currency) = Currency::from_str(code) else {
            continue;
        };
        rates.insert(currency, number_to_decimal(value)?);
    }

    RateTable::new(rates)
}

fn number_to_decimal(value: &serde_json::Number) -> Result<Decimal, RateError> {
    let text = value.to_string();
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .map_err(|e| RateError::Malformed(format!("rate {text}: {e}")))
}
