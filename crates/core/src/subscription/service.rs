//! Subscription service: validation, storage, conversion and analytics.

use std::sync::Arc;

use subtally_shared::AppResult;
use subtally_shared::types::{Currency, PageRequest, PageResponse, SubscriptionId, UserId};
use tracing::{error, info};

use super::listing::{ListedSubscription, ListingFilters, paginate};
use super::store::{StorageError, SubscriptionStore};
use super::types::{NewSubscription, Subscription, UpdateSubscription};
use crate::analytics::SubscriptionAnalytics;
use crate::currency::{Clock, CurrencyConverter, SystemClock};
use crate::split::{SplitParticipant, SplitPolicy, SplitSession};

/// Application service over a [`SubscriptionStore`].
///
/// Every operation is scoped to one user.
pub struct SubscriptionService {
    store: Arc<dyn SubscriptionStore>,
    converter: Arc<CurrencyConverter>,
    clock: Arc<dyn Clock>,
    policy: SplitPolicy,
}

impl std::fmt::Debug for SubscriptionService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionService")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

fn log_storage_error(operation: &'static str) -> impl Fn(StorageError) -> StorageError {
    move |e| {
        if matches!(e, StorageError::Backend(_)) {
            error!(operation, error = %e, "Subscription storage failed");
        }
        e
    }
}

impl SubscriptionService {
    /// Creates a service using the system clock.
    #[must_use]
    pub fn new(
        store: Arc<dyn SubscriptionStore>,
        converter: Arc<CurrencyConverter>,
        policy: SplitPolicy,
    ) -> Self {
        Self::with_clock(store, converter, policy, Arc::new(SystemClock))
    }

    /// Creates a service with an explicit clock.
    #[must_use]
    pub fn with_clock(
        store: Arc<dyn SubscriptionStore>,
        converter: Arc<CurrencyConverter>,
        policy: SplitPolicy,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            converter,
            clock,
            policy,
        }
    }

    /// Returns the shared converter.
    #[must_use]
    pub fn converter(&self) -> &Arc<CurrencyConverter> {
        &self.converter
    }

    /// Returns the split policy.
    #[must_use]
    pub const fn policy(&self) -> SplitPolicy {
        self.policy
    }

    /// Lists one page of subscriptions with amounts in `display_currency`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Storage` if the store fails, or
    /// `AppError::Validation` if an amount overflows on conversion.
    pub async fn list(
        &self,
        user_id: UserId,
        filters: &ListingFilters,
        page: PageRequest,
        display_currency: Currency,
    ) -> AppResult<PageResponse<ListedSubscription>> {
        let subscriptions = self
            .store
            .list(user_id)
            .await
            .map_err(log_storage_error("list"))?;

        let mut listed = Vec::with_capacity(subscriptions.len());
        for subscription in subscriptions {
            let converted_amount = self
                .converter
                .convert(subscription.amount, subscription.currency, display_currency)
                .await?;
            listed.push(ListedSubscription {
                subscription,
                converted_amount,
                display_currency,
            });
        }

        Ok(paginate(listed, filters, page))
    }

    /// Aggregates the user's spend in `currency`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Storage` if the store fails, or
    /// `AppError::Validation` if an amount overflows on conversion.
    pub async fn analytics(
        &self,
        user_id: UserId,
        currency: Currency,
    ) -> AppResult<SubscriptionAnalytics> {
        let subscriptions = self
            .store
            .list(user_id)
            .await
            .map_err(log_storage_error("analytics"))?;

        Ok(SubscriptionAnalytics::compute(&subscriptions, &self.converter, currency).await?)
    }

    /// Fetches one subscription.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` for missing or foreign ids.
    pub async fn get(&self, user_id: UserId, id: SubscriptionId) -> AppResult<Subscription> {
        Ok(self
            .store
            .get(user_id, id)
            .await
            .map_err(log_storage_error("get"))?)
    }

    /// Validates and stores a new subscription, stamping its start date.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` for bad input and `AppError::Storage`
    /// if the store fails.
    pub async fn create(
        &self,
        user_id: UserId,
        input: NewSubscription,
    ) -> AppResult<Subscription> {
        input.validate()?;

        let subscription = input.into_subscription(user_id, self.clock.now());
        let created = self
            .store
            .create(subscription)
            .await
            .map_err(log_storage_error("create"))?;

        info!(
            subscription_id = %created.id,
            user_id = %user_id,
            kind = %created.kind,
            "Subscription created"
        );

        Ok(created)
    }

    /// Applies a partial update.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` for bad input and `AppError::NotFound`
    /// for missing or foreign ids.
    pub async fn update(
        &self,
        user_id: UserId,
        id: SubscriptionId,
        changes: UpdateSubscription,
    ) -> AppResult<Subscription> {
        changes.validate()?;

        let mut subscription = self.get(user_id, id).await?;
        changes.apply(&mut subscription, self.clock.now());

        let updated = self
            .store
            .update(subscription)
            .await
            .map_err(log_storage_error("update"))?;

        info!(subscription_id = %id, user_id = %user_id, "Subscription updated");

        Ok(updated)
    }

    /// Deletes a subscription.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` for missing or foreign ids.
    pub async fn delete(&self, user_id: UserId, id: SubscriptionId) -> AppResult<()> {
        self.store
            .delete(user_id, id)
            .await
            .map_err(log_storage_error("delete"))?;

        info!(subscription_id = %id, user_id = %user_id, "Subscription deleted");

        Ok(())
    }

    /// Opens a split session for one of the user's subscriptions.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` for missing or foreign ids.
    pub async fn split_session(
        &self,
        user_id: UserId,
        id: SubscriptionId,
    ) -> AppResult<SplitSession> {
        let subscription = self.get(user_id, id).await?;
        Ok(SplitSession::new(subscription, self.policy))
    }

    /// Opens a split session with the given participants.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` for missing or foreign ids and
    /// `AppError::Validation` for an empty or oversized participant list.
    pub async fn split_session_with(
        &self,
        user_id: UserId,
        id: SubscriptionId,
        participants: Vec<SplitParticipant>,
    ) -> AppResult<SplitSession> {
        let subscription = self.get(user_id, id).await?;
        Ok(SplitSession::with_participants(
            subscription,
            self.policy,
            participants,
        )?)
    }
}
