//! Click-to-chat links: the default messaging hand-off.
//!
//! Each share request becomes a `https://wa.me/<digits>?text=<message>` link.
//! The server cannot open a chat itself, so the adapter logs the link and the
//! client opens it.

use async_trait::async_trait;
use tracing::info;

use super::handoff::{HandoffError, MessagingHandoff, ShareRequest};

/// Country code assumed for numbers typed without a leading `+`.
pub const DEFAULT_COUNTRY_CODE: &str = "+91";

const CHAT_BASE_URL: &str = "https://wa.me";

/// Builds chat links for share requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkHandoff {
    country_code: String,
}

impl Default for LinkHandoff {
    fn default() -> Self {
        Self::new(DEFAULT_COUNTRY_CODE)
    }
}

impl LinkHandoff {
    /// Creates an adapter prefixing local numbers with `country_code`.
    #[must_use]
    pub fn new(country_code: impl Into<String>) -> Self {
        Self {
            country_code: country_code.into(),
        }
    }

    /// Normalizes a typed phone number to `+<digits>`.
    ///
    /// Everything but digits and `+` is dropped, numbers without a leading
    /// `+` get the country code, and later `+` signs are removed.
    ///
    /// # Errors
    ///
    /// Returns `HandoffError::InvalidRecipient` when no digits remain.
    pub fn normalize_phone(&self, phone: &str) -> Result<String, HandoffError> {
        let cleaned: String = phone
            .chars()
            .filter(|c| c.is_ascii_digit() || *c == '+')
            .collect();
        if !cleaned.chars().any(|c| c.is_ascii_digit()) {
            return Err(HandoffError::InvalidRecipient(phone.to_string()));
        }

        let prefixed = if cleaned.starts_with('+') {
            cleaned
        } else {
            format!("{}{cleaned}", self.country_code)
        };
        let digits: String = prefixed.chars().filter(char::is_ascii_digit).collect();
        Ok(format!("+{digits}"))
    }

    /// Returns the chat link for `request`.
    ///
    /// # Errors
    ///
    /// Returns `HandoffError::InvalidRecipient` for numbers without digits.
    pub fn link(&self, request: &ShareRequest) -> Result<String, HandoffError> {
        let phone = self.normalize_phone(&request.phone_number)?;
        Ok(format!(
            "{CHAT_BASE_URL}/{}?text={}",
            phone.trim_start_matches('+'),
            urlencoding::encode(&request.message)
        ))
    }
}

#[async_trait]
impl MessagingHandoff for LinkHandoff {
    async fn hand_off(&self, request: &ShareRequest) -> Result<(), HandoffError> {
        let link = self.link(request)?;
        info!(phone = %request.phone_number, link = %link, "Chat link ready");
        Ok(())
    }
}
