//! API route definitions.

use axum::{Router, middleware};
use subtally_shared::types::Currency;

use crate::{ApiError, AppState, middleware::auth::auth_middleware};

pub mod analytics;
pub mod currencies;
pub mod health;
pub mod profile;
pub mod splits;
pub mod subscriptions;

/// Creates the API router with protected routes that need state for middleware.
#[allow(clippy::needless_pass_by_value)]
pub fn api_routes_with_state(state: AppState) -> Router<AppState> {
    // Protected routes that require authentication
    let protected_routes = Router::new()
        .merge(currencies::routes())
        .merge(subscriptions::routes())
        .merge(analytics::routes())
        .merge(splits::routes())
        .merge(profile::routes())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .merge(health::routes())
        .merge(protected_routes)
}

/// Parses an optional currency query parameter, defaulting to USD.
pub(crate) fn parse_currency(value: Option<&str>) -> Result<Currency, ApiError> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(Currency::Usd),
        Some(code) => code
            .parse()
            .map_err(|_| ApiError::validation(format!("Unsupported currency: {code}"))),
    }
}
