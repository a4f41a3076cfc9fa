//! Spend analytics route.

use axum::{
    Json, Router,
    extract::{Query, State, rejection::QueryRejection},
    routing::get,
};
use serde::Deserialize;
use subtally_core::analytics::SubscriptionAnalytics;

use crate::error::ApiResult;
use crate::routes::parse_currency;
use crate::{ApiError, AppState, middleware::AuthUser};

/// Creates the analytics route (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new().route("/analytics", get(get_analytics))
}

/// Query for `/analytics`.
#[derive(Debug, Default, Deserialize)]
pub struct AnalyticsQuery {
    /// Display currency, USD by default.
    pub currency: Option<String>,
}

/// GET `/analytics` - Monthly and yearly spend with per-kind counts.
async fn get_analytics(
    State(state): State<AppState>,
    auth: AuthUser,
    query: Result<Query<AnalyticsQuery>, QueryRejection>,
) -> ApiResult<Json<SubscriptionAnalytics>> {
    let Query(query) = query.map_err(|e| ApiError::validation(e.body_text()))?;
    let currency = parse_currency(query.currency.as_deref())?;
    Ok(Json(
        state.service.analytics(auth.user_id(), currency).await?,
    ))
}
