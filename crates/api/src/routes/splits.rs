//! Split allocation, balance check and share request routes.

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use subtally_core::split::{
    DispatchReport, SessionError, ShareRequest, SplitAllocation, SplitParticipant, SplitSession,
};
use subtally_shared::types::{SubscriptionId, UserId};
use tracing::info;

use crate::error::ApiResult;
use crate::{ApiError, AppState, middleware::AuthUser};

/// Creates the split routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/splits/allocate", post(allocate))
        .route("/splits/validate", post(validate))
        .route("/splits/requests", post(share_requests))
        .route("/splits/send", post(send_requests))
}

/// Request body for `/splits/allocate`.
#[derive(Debug, Deserialize)]
pub struct AllocateRequest {
    /// Subscription total.
    pub total: Decimal,
    /// Number of friends.
    pub participants: usize,
}

/// Request body for `/splits/validate`.
#[derive(Debug, Deserialize)]
pub struct ValidateRequest {
    /// Subscription total.
    pub total: Decimal,
    /// Possibly hand-edited shares.
    pub shares: Vec<Decimal>,
}

/// Response for `/splits/validate`.
#[derive(Debug, Serialize)]
pub struct ValidateResponse {
    /// Whether the shares cover the split portion of the total.
    pub balanced: bool,
}

/// Request body for `/splits/requests` and `/splits/send`.
#[derive(Debug, Deserialize)]
pub struct ShareRequestsRequest {
    /// Subscription being split.
    pub subscription_id: SubscriptionId,
    /// Friends, in order.
    pub participants: Vec<SplitParticipant>,
    /// Hand-edited shares; allocated evenly when absent.
    #[serde(default)]
    pub shares: Option<Vec<Decimal>>,
    /// Custom message; the default reminder when absent or blank.
    #[serde(default)]
    pub message: Option<String>,
}

/// Response for `/splits/requests`.
#[derive(Debug, Serialize)]
pub struct ShareRequestsResponse {
    /// One request per friend.
    pub requests: Vec<ShareRequest>,
    /// Plain-text split details.
    pub summary: String,
}

/// POST `/splits/allocate` - Even split of the configured fraction.
///
/// Counts above the participant limit are rejected before any shares are built.
async fn allocate(
    State(state): State<AppState>,
    _auth: AuthUser,
    body: Result<Json<AllocateRequest>, JsonRejection>,
) -> ApiResult<Json<SplitAllocation>> {
    let Json(body) = body.map_err(|e| ApiError::validation(e.body_text()))?;
    let policy = state.service.policy();
    Ok(Json(policy.allocate(body.total, body.participants)))
}

/// POST `/splits/validate` - Balance check for hand-edited shares.
async fn validate(
    State(state): State<AppState>,
    _auth: AuthUser,
    body: Result<Json<ValidateRequest>, JsonRejection>,
) -> ApiResult<Json<ValidateResponse>> {
    let Json(body) = body.map_err(|e| ApiError::validation(e.body_text()))?;
    let policy = state.service.policy();
    Ok(Json(ValidateResponse {
        balanced: policy.allocator.is_balanced(body.total, &body.shares),
    }))
}

fn session_error_response(err: SessionError) -> Response {
    match err {
        SessionError::Invalid(errors) => (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "VALIDATION_ERROR",
                "message": "Split is not ready to send",
                "errors": errors,
            })),
        )
            .into_response(),
        other => ApiError::validation(other.to_string()).into_response(),
    }
}

/// Opens the session described by `body`, applying hand-edited shares.
async fn open_session(
    state: &AppState,
    user: UserId,
    body: ShareRequestsRequest,
) -> Result<(SplitSession, Option<String>), Response> {
    let mut session = state
        .service
        .split_session_with(user, body.subscription_id, body.participants)
        .await
        .map_err(|e| ApiError::from(e).into_response())?;

    if let Some(shares) = body.shares {
        session.set_shares(shares).map_err(session_error_response)?;
    }

    Ok((session, body.message))
}

/// POST `/splits/requests` - Build the per-friend payment requests.
async fn share_requests(
    State(state): State<AppState>,
    auth: AuthUser,
    body: Result<Json<ShareRequestsRequest>, JsonRejection>,
) -> Result<Json<ShareRequestsResponse>, Response> {
    let Json(body) = body.map_err(|e| ApiError::validation(e.body_text()).into_response())?;
    let subscription_id = body.subscription_id;
    let (session, message) = open_session(&state, auth.user_id(), body).await?;

    let requests = session
        .share_requests(message.as_deref())
        .map_err(session_error_response)?;
    info!(
        subscription_id = %subscription_id,
        requests = requests.len(),
        "Split requests prepared"
    );

    Ok(Json(ShareRequestsResponse {
        requests,
        summary: session.summary(),
    }))
}

/// POST `/splits/send` - Hand every request to the messaging channel.
///
/// Failures for single friends are reported in the body, not as an error status.
async fn send_requests(
    State(state): State<AppState>,
    auth: AuthUser,
    body: Result<Json<ShareRequestsRequest>, JsonRejection>,
) -> Result<Json<DispatchReport>, Response> {
    let Json(body) = body.map_err(|e| ApiError::validation(e.body_text()).into_response())?;
    let (session, message) = open_session(&state, auth.user_id(), body).await?;

    let report = session
        .dispatch(state.handoff.as_ref(), message.as_deref())
        .await
        .map_err(session_error_response)?;

    Ok(Json(report))
}
