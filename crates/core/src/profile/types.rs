//! Profile data types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use subtally_shared::AppError;
use subtally_shared::types::UserId;
use thiserror::Error;

/// Longest accepted username.
pub const MAX_USERNAME_LEN: usize = 32;
/// Longest accepted bio.
pub const MAX_BIO_LEN: usize = 500;
/// Longest accepted full name, website or location.
pub const MAX_FIELD_LEN: usize = 100;

/// Per-user profile details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// Owner.
    pub user_id: UserId,
    /// Public handle, possibly empty.
    pub username: String,
    /// Display name.
    pub full_name: String,
    /// Free text about the user.
    pub bio: String,
    /// Personal website, empty or an http(s) URL.
    pub website: String,
    /// Where the user lives.
    pub location: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    /// A blank profile, as created on first access.
    #[must_use]
    pub fn empty(user_id: UserId, now: DateTime<Utc>) -> Self {
        Self {
            user_id,
            username: String::new(),
            full_name: String::new(),
            bio: String::new(),
            website: String::new(),
            location: String::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial profile update. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct UpdateProfile {
    /// New username.
    #[serde(default)]
    pub username: Option<String>,
    /// New display name.
    #[serde(default)]
    pub full_name: Option<String>,
    /// New bio.
    #[serde(default)]
    pub bio: Option<String>,
    /// New website; empty clears it.
    #[serde(default)]
    pub website: Option<String>,
    /// New location.
    #[serde(default)]
    pub location: Option<String>,
}

impl UpdateProfile {
    /// Checks every present field.
    ///
    /// # Errors
    ///
    /// Returns the first [`ProfileError`] found.
    pub fn validate(&self) -> Result<(), ProfileError> {
        if let Some(username) = &self.username {
            validate_username(username.trim())?;
        }
        if let Some(bio) = &self.bio {
            check_len("bio", bio.trim(), MAX_BIO_LEN)?;
        }
        if let Some(full_name) = &self.full_name {
            check_len("full_name", full_name.trim(), MAX_FIELD_LEN)?;
        }
        if let Some(location) = &self.location {
            check_len("location", location.trim(), MAX_FIELD_LEN)?;
        }
        if let Some(website) = &self.website {
            validate_website(website.trim())?;
        }
        Ok(())
    }

    /// Applies the present fields, trimmed, and stamps `updated_at`.
    pub fn apply(self, profile: &mut Profile, now: DateTime<Utc>) {
        let fields = [
            (self.username, &mut profile.username),
            (self.full_name, &mut profile.full_name),
            (self.bio, &mut profile.bio),
            (self.website, &mut profile.website),
            (self.location, &mut profile.location),
        ];
        for (value, slot) in fields {
            if let Some(value) = value {
                *slot = value.trim().to_string();
            }
        }
        profile.updated_at = now;
    }
}

/// Profile input errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProfileError {
    /// Username uses characters outside letters, digits, `_`, `-` and `.`.
    #[error("Username may only contain letters, digits, '_', '-' and '.': {0}")]
    InvalidUsername(String),

    /// A field exceeds its length limit.
    #[error("{field} must be at most {max} characters")]
    TooLong {
        /// Field name.
        field: &'static str,
        /// Limit in characters.
        max: usize,
    },

    /// Website is not an http(s) URL.
    #[error("Website must start with http:// or https://: {0}")]
    InvalidWebsite(String),
}

impl From<ProfileError> for AppError {
    fn from(err: ProfileError) -> Self {
        Self::Validation(err.to_string())
    }
}

fn check_len(field: &'static str, value: &str, max: usize) -> Result<(), ProfileError> {
    if value.chars().count() > max {
        return Err(ProfileError::TooLong { field, max });
    }
    Ok(())
}

fn validate_username(username: &str) -> Result<(), ProfileError> {
    check_len("username", username, MAX_USERNAME_LEN)?;
    if username
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'))
    {
        return Ok(());
    }
    Err(ProfileError::InvalidUsername(username.to_string()))
}

fn validate_website(website: &str) -> Result<(), ProfileError> {
    check_len("website", website, MAX_FIELD_LEN)?;
    if website.is_empty() || website.starts_with("http://") || website.starts_with("https://") {
        return Ok(());
    }
    Err(ProfileError::InvalidWebsite(website.to_string()))
}
