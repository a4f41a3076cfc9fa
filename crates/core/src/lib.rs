//! Core business logic for Subtally.
//!
//! This crate contains the subscription-tracking domain with ZERO web
//! framework or database dependencies. Collaborators (storage, rate source,
//! messaging) are reached through traits so they can be swapped or faked.
//!
//! # Modules
//!
//! - `split` - Even-split allocation, split sessions and messaging hand-off
//! - `currency` - Exchange rate tables, caching and conversion
//! - `subscription` - Subscription model, storage port, listing and service
//! - `analytics` - Monthly and yearly spend aggregation
//! - `profile` - User profiles and account deletion

pub mod analytics;
pub mod currency;
pub mod profile;
pub mod split;
pub mod subscription;
