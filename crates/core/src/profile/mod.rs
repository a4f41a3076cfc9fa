//! User profiles and account deletion.

pub mod service;
pub mod store;
pub mod types;


pub use service::{AccountDeletion, ProfileService};
pub use store::{InMemoryProfileStore, ProfileStore};
pub use types::{
    MAX_BIO_LEN, MAX_FIELD_LEN, MAX_USERNAME_LEN, Profile, ProfileError, UpdateProfile,
};

#[cfg(test)]
pub use store::MockProfileStore;
