//! Subscription data types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use subtally_shared::AppError;
use subtally_shared::types::{Currency, SubscriptionId, UserId};
use thiserror::Error;

/// Largest amount a subscription may carry.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(1_000_000_000, 0, 0, false, 0);

/// How often a subscription is charged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecurrenceKind {
    /// Charged every month.
    Monthly,
    /// Charged every year.
    Yearly,
    /// Charged once.
    #[serde(rename = "onetime", alias = "one-time")]
    OneTime,
}

impl RecurrenceKind {
    /// Every kind, in display order.
    pub const ALL: [Self; 3] = [Self::Monthly, Self::Yearly, Self::OneTime];

    /// Returns the wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
            Self::OneTime => "onetime",
        }
    }
}

impl std::fmt::Display for RecurrenceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RecurrenceKind {
    type Err = SubscriptionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "monthly" => Ok(Self::Monthly),
            "yearly" => Ok(Self::Yearly),
            "onetime" | "one-time" => Ok(Self::OneTime),
            _ => Err(SubscriptionError::UnknownKind(s.to_string())),
        }
    }
}

/// A tracked subscription expense.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    /// Subscription ID.
    pub id: SubscriptionId,
    /// Owner.
    pub user_id: UserId,
    /// Display name.
    pub name: String,
    /// Charge amount in `currency`.
    pub amount: Decimal,
    /// Currency of `amount`.
    pub currency: Currency,
    /// Recurrence.
    #[serde(rename = "type")]
    pub kind: RecurrenceKind,
    /// When the subscription was started.
    pub start_date: DateTime<Utc>,
    /// Optional website.
    pub website_url: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a subscription.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewSubscription {
    /// Display name.
    pub name: String,
    /// Charge amount.
    pub amount: Decimal,
    /// Currency of `amount`.
    pub currency: Currency,
    /// Recurrence.
    #[serde(rename = "type")]
    pub kind: RecurrenceKind,
    /// Optional website.
    #[serde(default)]
    pub website_url: Option<String>,
}

impl NewSubscription {
    /// Checks name, amount and website.
    ///
    /// # Errors
    ///
    /// Returns the first rule the input breaks.
    pub fn validate(&self) -> Result<(), SubscriptionError> {
        validate_name(&self.name)?;
        validate_amount(self.amount)?;
        if let Some(url) = &self.website_url {
            validate_url(url)?;
        }
        Ok(())
    }

    /// Builds the record, trimming the name and dropping a blank website.
    #[must_use]
    pub fn into_subscription(self, user_id: UserId, now: DateTime<Utc>) -> Subscription {
        Subscription {
            id: SubscriptionId::new(),
            user_id,
            name: self.name.trim().to_string(),
            amount: self.amount,
            currency: self.currency,
            kind: self.kind,
            start_date: now,
            website_url: normalize_url(self.website_url),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update of a subscription. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct UpdateSubscription {
    /// New name.
    pub name: Option<String>,
    /// New amount.
    pub amount: Option<Decimal>,
    /// New currency.
    pub currency: Option<Currency>,
    /// New recurrence.
    #[serde(rename = "type")]
    pub kind: Option<RecurrenceKind>,
    /// New website; an empty string clears it.
    pub website_url: Option<String>,
}

impl UpdateSubscription {
    /// Checks every field that is present.
    ///
    /// # Errors
    ///
    /// Returns the first rule a present field breaks.
    pub fn validate(&self) -> Result<(), SubscriptionError> {
        if let Some(name) = &self.name {
            validate_name(name)?;
        }
        if let Some(amount) = self.amount {
            validate_amount(amount)?;
        }
        if let Some(url) = &self.website_url
            && !url.trim().is_empty()
        {
            validate_url(url)?;
        }
        Ok(())
    }

    /// Applies the present fields to `subscription`.
    pub fn apply(self, subscription: &mut Subscription, now: DateTime<Utc>) {
        if let Some(name) = self.name {
            subscription.name = name.trim().to_string();
        }
        if let Some(amount) = self.amount {
            subscription.amount = amount;
        }
        if let Some(currency) = self.currency {
            subscription.currency = currency;
        }
        if let Some(kind) = self.kind {
            subscription.kind = kind;
        }
        if self.website_url.is_some() {
            subscription.website_url = normalize_url(self.website_url);
        }
        subscription.updated_at = now;
    }
}

/// Subscription input errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubscriptionError {
    /// Name is blank.
    #[error("Subscription name is required")]
    EmptyName,

    /// Amount below zero.
    #[error("Amount must not be negative")]
    NegativeAmount,

    /// Amount above [`MAX_AMOUNT`].
    #[error("Amount must not exceed {MAX_AMOUNT}")]
    AmountTooLarge,

    /// Website is not an http(s) URL.
    #[error("Website must start with http:// or https://: {0}")]
    InvalidUrl(String),

    /// Unknown recurrence name.
    #[error("Unknown subscription type: {0}")]
    UnknownKind(String),
}

impl From<SubscriptionError> for AppError {
    fn from(err: SubscriptionError) -> Self {
        Self::Validation(err.to_string())
    }
}

fn validate_name(name: &str) -> Result<(), SubscriptionError> {
    if name.trim().is_empty() {
        return Err(SubscriptionError::EmptyName);
    }
    Ok(())
}

fn validate_amount(amount: Decimal) -> Result<(), SubscriptionError> {
    if amount < Decimal::ZERO {
        return Err(SubscriptionError::NegativeAmount);
    }
    if amount > MAX_AMOUNT {
        return Err(SubscriptionError::AmountTooLarge);
    }
    Ok(())
}

fn validate_url(url: &str) -> Result<(), SubscriptionError> {
    let url = url.trim();
    if url.is_empty() || url.starts_with("http://") || url.starts_with("https://") {
        return Ok(());
    }
    Err(SubscriptionError::InvalidUrl(url.to_string()))
}

fn normalize_url(url: Option<String>) -> Option<String> {
    url.map(|u| u.trim().to_string()).filter(|u| !u.is_empty())
}
