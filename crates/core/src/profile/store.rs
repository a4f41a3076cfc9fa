//! Storage port for profiles and the in-memory adapter.

use std::collections::HashMap;

use async_trait::async_trait;
use subtally_shared::types::UserId;
use tokio::sync::RwLock;

use super::types::Profile;
use crate::subscription::StorageError;

/// Persistence for profiles, one per user.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Fetches the user's profile, if one was saved.
    async fn get(&self, user_id: UserId) -> Result<Option<Profile>, StorageError>;

    /// Inserts or replaces the profile of `profile.user_id`.
    async fn save(&self, profile: Profile) -> Result<Profile, StorageError>;

    /// Deletes the user's profile, returning whether one existed.
    async fn delete(&self, user_id: UserId) -> Result<bool, StorageError>;
}

/// In-memory implementation of [`ProfileStore`].
#[derive(Debug, Default)]
pub struct InMemoryProfileStore {
    records: RwLock<HashMap<UserId, Profile>>,
}

impl InMemoryProfileStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProfileStore for InMemoryProfileStore {
    async fn get(&self, user_id: UserId) -> Result<Option<Profile>, StorageError> {
        Ok(self.records.read().await.get(&user_id).cloned())
    }

    async fn save(&self, profile: Profile) -> Result<Profile, StorageError> {
        self.records
            .write()
            .await
            .insert(profile.user_id, profile.clone());
        Ok(profile)
    }

    async fn delete(&self, user_id: UserId) -> Result<bool, StorageError> {
        Ok(self.records.write().await.remove(&user_id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[tokio::test]
    async fn test_save_get_delete() {
        let store = InMemoryProfileStore::new();
        let user = UserId::new();
        assert_eq!(store.get(user).await, Ok(None));

        let mut profile = Profile::empty(user, Utc::now());
        store.save(profile.clone()).await.unwrap();
        profile.username = "jane".to_string();
        store.save(profile.clone()).await.unwrap();

        assert_eq!(store.get(user).await, Ok(Some(profile)));
        assert_eq!(store.get(UserId::new()).await, Ok(None));

        assert_eq!(store.delete(user).await, Ok(true));
        assert_eq!(store.delete(user).await, Ok(false));
        assert_eq!(store.get(user).await, Ok(None));
    }
}
