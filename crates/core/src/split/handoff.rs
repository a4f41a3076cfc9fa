//! Hand-off of share requests to an outbound messaging channel.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Serialize;
use subtally_shared::types::Currency;
use thiserror::Error;

/// One friend's payment request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShareRequest {
    /// Recipient phone number as entered.
    pub phone_number: String,
    /// Amount the recipient owes.
    pub amount: Decimal,
    /// Currency of `amount`.
    pub currency: Currency,
    /// Message body to send.
    pub message: String,
}

/// Errors reported by a messaging channel.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HandoffError {
    /// The channel could not be reached.
    #[error("messaging channel unavailable: {0}")]
    Unavailable(String),

    /// The channel rejected the recipient.
    #[error("invalid recipient: {0}")]
    InvalidRecipient(String),
}

/// Port for delivering share requests (for example by opening a chat link).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessagingHandoff: Send + Sync {
    /// Hands one request to the channel.
    async fn hand_off(&self, request: &ShareRequest) -> Result<(), HandoffError>;
}

/// A request the channel did not accept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedHandoff {
    /// Recipient phone number.
    pub phone_number: String,
    /// Channel error text.
    pub reason: String,
}

/// Outcome of handing every request of a split to the channel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DispatchReport {
    /// Phone numbers whose request was accepted.
    pub delivered: Vec<String>,
    /// Requests that failed.
    pub failed: Vec<FailedHandoff>,
}

impl DispatchReport {
    /// Returns true when no request failed.
    #[must_use]
    pub fn all_delivered(&self) -> bool {
        self.failed.is_empty()
    }
}
