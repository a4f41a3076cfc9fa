//! Subscription records, storage, listing and the application service.

pub mod listing;
pub mod service;
pub mod store;
pub mod types;

#[cfg(test)]
mod tests;

pub use listing::{ListedSubscription, ListingFilters, SortField, SortOrder, paginate, sort_listed};
pub use service::SubscriptionService;
pub use store::{InMemorySubscriptionStore, StorageError, SubscriptionStore};
pub use types::{
    MAX_AMOUNT, NewSubscription, RecurrenceKind, Subscription, SubscriptionError,
    UpdateSubscription,
};

#[cfg(test)]
pub use store::MockSubscriptionStore;
