//! Application configuration management.

use std::collections::HashMap;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::types::money::Currency;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// JWT configuration.
    pub jwt: JwtSettings,
    /// Exchange rate configuration.
    #[serde(default)]
    pub rates: RatesConfig,
    /// Split policy configuration.
    #[serde(default)]
    pub split: SplitConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// JWT configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct JwtSettings {
    /// Secret key for verifying tokens.
    pub secret: String,
    /// Access token expiration in seconds.
    #[serde(default = "default_access_token_expiry")]
    pub access_token_expiry_secs: u64,
}

/// Longest accepted access token lifetime (one year).
const MAX_ACCESS_TOKEN_EXPIRY_SECS: u64 = 365 * 24 * 60 * 60;

fn default_access_token_expiry() -> u64 {
    900 // 15 minutes
}

/// Exchange rate source and caching configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RatesConfig {
    /// Endpoint returning `{ "rates": { CODE: rate } }` relative to USD.
    #[serde(default = "default_rates_endpoint")]
    pub endpoint: String,
    /// Maximum age of a cached rate table.
    #[serde(default = "default_freshness_secs")]
    pub freshness_secs: u64,
    /// Timeout for a single rate fetch.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Approximate USD-relative rates used when fetching fails.
    #[serde(default = "default_fallback")]
    pub fallback: HashMap<String, Decimal>,
}

impl Default for RatesConfig {
    fn default() -> Self {
        Self {
            endpoint: default_rates_endpoint(),
            freshness_secs: default_freshness_secs(),
            timeout_secs: default_timeout_secs(),
            fallback: default_fallback(),
        }
    }
}

impl RatesConfig {
    /// Returns the freshness window, or `None` when it does not fit a
    /// `chrono::Duration`.
    #[must_use]
    pub fn freshness(&self) -> Option<chrono::Duration> {
        i64::try_from(self.freshness_secs)
            .ok()
            .and_then(chrono::Duration::try_seconds)
    }

    /// Returns the fallback table keyed by currency.
    ///
    /// Unknown codes are skipped. USD is always present and equal to one.
    #[must_use]
    pub fn fallback_rates(&self) -> HashMap<Currency, Decimal> {
        let mut rates: HashMap<Currency, Decimal> = self
            .fallback
            .iter()
            .filter_map(|(code, rate)| Currency::from_str(code).ok().map(|c| (c, *rate)))
            .collect();
        rates.insert(Currency::Usd, Decimal::ONE);
        rates
    }
}

fn default_rates_endpoint() -> String {
    "https://api.exchangerate-api.com/v4/latest/USD".to_string()
}

fn default_freshness_secs() -> u64 {
    3600 // 1 hour
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_fallback() -> HashMap<String, Decimal> {
    HashMap::from([
        ("USD".to_string(), Decimal::ONE),
        ("INR".to_string(), Decimal::from(83)),
    ])
}

/// Split policy configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SplitConfig {
    /// Portion of the subscription divided among participants.
    #[serde(default = "default_split_fraction")]
    pub fraction: Decimal,
    /// Maximum number of participants in one split.
    #[serde(default = "default_max_participants")]
    pub max_participants: usize,
    /// Country code for phone numbers typed without a leading `+`.
    #[serde(default = "default_country_code")]
    pub country_code: String,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            fraction: default_split_fraction(),
            max_participants: default_max_participants(),
            country_code: default_country_code(),
        }
    }
}

fn default_split_fraction() -> Decimal {
    Decimal::new(5, 1)
}

fn default_max_participants() -> usize {
    5
}

fn default_country_code() -> String {
    "+91".to_string()
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded or is out of range.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("SUBTALLY").separator("__"))
            .build()?;

        let app: Self = config.try_deserialize()?;
        app.validate()?;
        Ok(app)
    }

    /// Checks value ranges that serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Message` describing the first invalid value.
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        if self.split.fraction <= Decimal::ZERO || self.split.fraction > Decimal::ONE {
            return Err(config::ConfigError::Message(format!(
                "split.fraction must be in (0, 1], got {}",
                self.split.fraction
            )));
        }
        let country_digits = self.split.country_code.strip_prefix('+').unwrap_or_default();
        if country_digits.is_empty() || !country_digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(config::ConfigError::Message(format!(
                "split.country_code must look like +91, got {}",
                self.split.country_code
            )));
        }
        if self.split.max_participants == 0 {
            return Err(config::ConfigError::Message(
                "split.max_participants must be at least 1".to_string(),
            ));
        }
        if self.rates.freshness_secs == 0 {
            return Err(config::ConfigError::Message(
                "rates.freshness_secs must be positive".to_string(),
            ));
        }
        if self.rates.freshness().is_none() {
            return Err(config::ConfigError::Message(format!(
                "rates.freshness_secs is out of range, got {}",
                self.rates.freshness_secs
            )));
        }
        if self.jwt.access_token_expiry_secs > MAX_ACCESS_TOKEN_EXPIRY_SECS {
            return Err(config::ConfigError::Message(format!(
                "jwt.access_token_expiry_secs must be at most {MAX_ACCESS_TOKEN_EXPIRY_SECS}"
            )));
        }
        if self.rates.fallback_rates().values().any(|r| *r <= Decimal::ZERO) {
            return Err(config::ConfigError::Message(
                "rates.fallback values must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
