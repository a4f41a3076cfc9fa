//! Storage port for subscriptions and the in-memory adapter.

use std::collections::HashMap;

use async_trait::async_trait;
use subtally_shared::AppError;
use subtally_shared::types::{SubscriptionId, UserId};
use thiserror::Error;
use tokio::sync::RwLock;

use super::types::Subscription;

/// Storage errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    /// No subscription with this id for this owner.
    #[error("Subscription not found: {0}")]
    NotFound(SubscriptionId),

    /// A record with this id already exists.
    #[error("Subscription already exists: {0}")]
    Duplicate(SubscriptionId),

    /// The backing store failed.
    #[error("Storage backend failure: {0}")]
    Backend(String),
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(_) => Self::NotFound(err.to_string()),
            StorageError::Duplicate(_) => Self::Validation(err.to_string()),
            StorageError::Backend(msg) => Self::Storage(msg),
        }
    }
}

/// Persistence for subscriptions. Every call is scoped to one owner; records
/// of other users behave as missing.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    /// Lists the owner's subscriptions in insertion order.
    async fn list(&self, user_id: UserId) -> Result<Vec<Subscription>, StorageError>;

    /// Fetches one subscription.
    async fn get(
        &self,
        user_id: UserId,
        id: SubscriptionId,
    ) -> Result<Subscription, StorageError>;

    /// Inserts a new subscription.
    async fn create(&self, subscription: Subscription) -> Result<Subscription, StorageError>;

    /// Replaces an existing subscription.
    async fn update(&self, subscription: Subscription) -> Result<Subscription, StorageError>;

    /// Deletes a subscription.
    async fn delete(&self, user_id: UserId, id: SubscriptionId) -> Result<(), StorageError>;

    /// Deletes every subscription of the owner, returning how many were removed.
    async fn delete_all(&self, user_id: UserId) -> Result<usize, StorageError>;
}

/// In-memory implementation of [`SubscriptionStore`].
///
/// Data lives for the lifetime of the process.
#[derive(Debug, Default)]
pub struct InMemorySubscriptionStore {
    records: RwLock<HashMap<UserId, Vec<Subscription>>>,
}

impl InMemorySubscriptionStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored subscriptions across all users.
    pub async fn len(&self) -> usize {
        self.records.read().await.values().map(Vec::len).sum()
    }

    /// Returns true if nothing is stored.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl SubscriptionStore for InMemorySubscriptionStore {
    async fn list(&self, user_id: UserId) -> Result<Vec<Subscription>, StorageError> {
        Ok(self
            .records
            .read()
            .await
            .get(&user_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn get(
        &self,
        user_id: UserId,
        id: SubscriptionId,
    ) -> Result<Subscription, StorageError> {
        self.records
            .read()
            .await
            .get(&user_id)
            .and_then(|subs| subs.iter().find(|s| s.id == id))
            .cloned()
            .ok_or(StorageError::NotFound(id))
    }

    async fn create(&self, subscription: Subscription) -> Result<Subscription, StorageError> {
        let mut records = self.records.write().await;
        if records
            .values()
            .flatten()
            .any(|existing| existing.id == subscription.id)
        {
            return Err(StorageError::Duplicate(subscription.id));
        }

        records
            .entry(subscription.user_id)
            .or_default()
            .push(subscription.clone());
        Ok(subscription)
    }

    async fn update(&self, subscription: Subscription) -> Result<Subscription, StorageError> {
        let mut records = self.records.write().await;
        let existing = records
            .get_mut(&subscription.user_id)
            .and_then(|subs| subs.iter_mut().find(|s| s.id == subscription.id))
            .ok_or(StorageError::NotFound(subscription.id))?;

        *existing = subscription.clone();
        Ok(subscription)
    }

    async fn delete(&self, user_id: UserId, id: SubscriptionId) -> Result<(), StorageError> {
        let mut records = self.records.write().await;
        let subs = records
            .get_mut(&user_id)
            .ok_or(StorageError::NotFound(id))?;
        let position = subs
            .iter()
            .position(|s| s.id == id)
            .ok_or(StorageError::NotFound(id))?;

        subs.remove(position);
        Ok(())
    }

    async fn delete_all(&self, user_id: UserId) -> Result<usize, StorageError> {
        Ok(self
            .records
            .write()
            .await
            .remove(&user_id)
            .map_or(0, |subs| subs.len()))
    }
}
