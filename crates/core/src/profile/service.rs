//! Profile service: lazy creation, updates and account deletion.

use std::sync::Arc;

use serde::Serialize;
use subtally_shared::AppResult;
use subtally_shared::types::UserId;
use tracing::{error, info};

use super::store::ProfileStore;
use super::types::{Profile, UpdateProfile};
use crate::currency::{Clock, SystemClock};
use crate::subscription::{StorageError, SubscriptionStore};

/// What an account deletion removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AccountDeletion {
    /// Number of subscriptions deleted.
    pub subscriptions_removed: usize,
    /// Whether a stored profile existed.
    pub profile_removed: bool,
}

/// Application service over a [`ProfileStore`].
pub struct ProfileService {
    profiles: Arc<dyn ProfileStore>,
    subscriptions: Arc<dyn SubscriptionStore>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for ProfileService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProfileService").finish_non_exhaustive()
    }
}

fn log_storage_error(operation: &'static str) -> impl Fn(StorageError) -> StorageError {
    move |e| {
        error!(operation, error = %e, "Profile storage failed");
        e
    }
}

impl ProfileService {
    /// Creates a service using the system clock.
    #[must_use]
    pub fn new(profiles: Arc<dyn ProfileStore>, subscriptions: Arc<dyn SubscriptionStore>) -> Self {
        Self::with_clock(profiles, subscriptions, Arc::new(SystemClock))
    }

    /// Creates a service with an explicit clock.
    #[must_use]
    pub fn with_clock(
        profiles: Arc<dyn ProfileStore>,
        subscriptions: Arc<dyn SubscriptionStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            profiles,
            subscriptions,
            clock,
        }
    }

    /// Returns the user's profile, creating a blank one on first access.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Storage` if the store fails.
    pub async fn get_or_create(&self, user_id: UserId) -> AppResult<Profile> {
        let existing = self
            .profiles
            .get(user_id)
            .await
            .map_err(log_storage_error("get_profile"))?;
        if let Some(profile) = existing {
            return Ok(profile);
        }

        let profile = self
            .profiles
            .save(Profile::empty(user_id, self.clock.now()))
            .await
            .map_err(log_storage_error("create_profile"))?;
        info!(user_id = %user_id, "Profile created");
        Ok(profile)
    }

    /// Applies a partial update.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` for bad input, checked before any
    /// storage access, or `AppError::Storage` if the store fails.
    pub async fn update(&self, user_id: UserId, update: UpdateProfile) -> AppResult<Profile> {
        update.validate()?;

        let mut profile = self.get_or_create(user_id).await?;
        update.apply(&mut profile, self.clock.now());
        let saved = self
            .profiles
            .save(profile)
            .await
            .map_err(log_storage_error("update_profile"))?;

        info!(user_id = %user_id, "Profile updated");
        Ok(saved)
    }

    /// Deletes the user's subscriptions and profile.
    ///
    /// Subscriptions are removed before the profile.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Storage` if either store fails.
    pub async fn delete_account(&self, user_id: UserId) -> AppResult<AccountDeletion> {
        let subscriptions_removed = self
            .subscriptions
            .delete_all(user_id)
            .await
            .map_err(log_storage_error("delete_subscriptions"))?;
        let profile_removed = self
            .profiles
            .delete(user_id)
            .await
            .map_err(log_storage_error("delete_profile"))?;

        info!(
            user_id = %user_id,
            subscriptions_removed,
            profile_removed,
            "Account deleted"
        );
        Ok(AccountDeletion {
            subscriptions_removed,
            profile_removed,
        })
    }
}
