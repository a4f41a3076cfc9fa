//! Profile and account routes.

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    routing::get,
};
use subtally_core::profile::{AccountDeletion, Profile, UpdateProfile};

use crate::error::ApiResult;
use crate::{ApiError, AppState, middleware::AuthUser};

/// Creates the profile routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new().route(
        "/profile",
        get(get_profile).put(update_profile).delete(delete_account),
    )
}

/// GET `/profile` - The caller's profile, created blank on first access.
async fn get_profile(State(state): State<AppState>, auth: AuthUser) -> ApiResult<Json<Profile>> {
    Ok(Json(state.profiles.get_or_create(auth.user_id()).await?))
}

/// PUT `/profile` - Update profile fields.
async fn update_profile(
    State(state): State<AppState>,
    auth: AuthUser,
    changes: Result<Json<UpdateProfile>, JsonRejection>,
) -> ApiResult<Json<Profile>> {
    let Json(changes) = changes.map_err(|e| ApiError::validation(e.body_text()))?;
    Ok(Json(state.profiles.update(auth.user_id(), changes).await?))
}

/// DELETE `/profile` - Delete the caller's profile and every subscription.
async fn delete_account(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<AccountDeletion>> {
    Ok(Json(state.profiles.delete_account(auth.user_id()).await?))
}
