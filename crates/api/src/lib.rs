//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - REST API routes under `/api/v1`
//! - JWT authentication middleware and the `AuthUser` extractor
//! - The JSON error envelope shared by every handler

pub mod error;
pub mod middleware;
pub mod routes;

#[cfg(test)]
mod test_support;

use axum::Router;
use std::sync::Arc;
use subtally_core::currency::CurrencyConverter;
use subtally_core::profile::ProfileService;
use subtally_core::split::MessagingHandoff;
use subtally_core::subscription::SubscriptionService;
use subtally_shared::JwtService;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use error::ApiError;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Subscription service (storage, listing, analytics, splits).
    pub service: Arc<SubscriptionService>,
    /// Profile service (profile details and account deletion).
    pub profiles: Arc<ProfileService>,
    /// Cached currency converter, shared with the service.
    pub converter: Arc<CurrencyConverter>,
    /// Channel that split requests are handed to.
    pub handoff: Arc<dyn MessagingHandoff>,
    /// JWT service for token verification.
    pub jwt_service: Arc<JwtService>,
}

impl AppState {
    /// Builds the state, sharing the service's converter.
    #[must_use]
    pub fn new(
        service: Arc<SubscriptionService>,
        profiles: Arc<ProfileService>,
        handoff: Arc<dyn MessagingHandoff>,
        jwt_service: Arc<JwtService>,
    ) -> Self {
        let converter = Arc::clone(service.converter());
        Self {
            service,
            profiles,
            converter,
            handoff,
            jwt_service,
        }
    }
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes_with_state(state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
