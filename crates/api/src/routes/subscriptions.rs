//! Subscription CRUD and listing routes.

use axum::{
    Json, Router,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use serde::Deserialize;
use subtally_core::subscription::{
    ListedSubscription, ListingFilters, NewSubscription, RecurrenceKind, SortField, SortOrder,
    Subscription, UpdateSubscription,
};
use subtally_shared::types::{PageRequest, PageResponse, SubscriptionId};

use crate::error::ApiResult;
use crate::routes::parse_currency;
use crate::{ApiError, AppState, middleware::AuthUser};

/// Creates the subscription routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/subscriptions",
            get(list_subscriptions).post(create_subscription),
        )
        .route(
            "/subscriptions/{id}",
            get(get_subscription)
                .put(update_subscription)
                .delete(delete_subscription),
        )
}

/// Query parameters for listing subscriptions.
#[derive(Debug, Default, Deserialize)]
pub struct ListSubscriptionsQuery {
    /// `date`, `amount` or `name`.
    pub sort_by: Option<SortField>,
    /// `asc` or `desc`.
    pub sort_order: Option<SortOrder>,
    /// Recurrence filter.
    pub kind: Option<RecurrenceKind>,
    /// Name search.
    pub search: Option<String>,
    /// Page number (1-indexed).
    pub page: Option<u32>,
    /// Items per page.
    pub per_page: Option<u32>,
    /// Display currency, USD by default.
    pub currency: Option<String>,
}

impl ListSubscriptionsQuery {
    fn filters(&self) -> ListingFilters {
        ListingFilters {
            sort_by: self.sort_by.unwrap_or_default(),
            sort_order: self.sort_order.unwrap_or_default(),
            kind: self.kind,
            search: self.search.clone(),
        }
    }

    fn page(&self) -> PageRequest {
        let defaults = PageRequest::default();
        PageRequest::new(
            self.page.unwrap_or(defaults.page),
            self.per_page.unwrap_or(defaults.per_page),
        )
    }
}

/// GET `/subscriptions` - Sorted, filtered, paginated list.
async fn list_subscriptions(
    State(state): State<AppState>,
    auth: AuthUser,
    query: Result<Query<ListSubscriptionsQuery>, QueryRejection>,
) -> ApiResult<Json<PageResponse<ListedSubscription>>> {
    let Query(query) = query.map_err(|e| ApiError::validation(e.body_text()))?;
    let currency = parse_currency(query.currency.as_deref())?;

    let page = state
        .service
        .list(auth.user_id(), &query.filters(), query.page(), currency)
        .await?;

    Ok(Json(page))
}

/// POST `/subscriptions` - Create a subscription.
async fn create_subscription(
    State(state): State<AppState>,
    auth: AuthUser,
    input: Result<Json<NewSubscription>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(input) = input.map_err(|e| ApiError::validation(e.body_text()))?;
    let created = state.service.create(auth.user_id(), input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// GET `/subscriptions/{id}` - Fetch one subscription.
async fn get_subscription(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<SubscriptionId>,
) -> ApiResult<Json<Subscription>> {
    Ok(Json(state.service.get(auth.user_id(), id).await?))
}

/// PUT `/subscriptions/{id}` - Update a subscription.
async fn update_subscription(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<SubscriptionId>,
    changes: Result<Json<UpdateSubscription>, JsonRejection>,
) -> ApiResult<Json<Subscription>> {
    let Json(changes) = changes.map_err(|e| ApiError::validation(e.body_text()))?;
    Ok(Json(
        state.service.update(auth.user_id(), id, changes).await?,
    ))
}

/// DELETE `/subscriptions/{id}` - Delete a subscription.
async fn delete_subscription(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<SubscriptionId>,
) -> ApiResult<StatusCode> {
    state.service.delete(auth.user_id(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use crate::test_support::TestApp;
    use axum::http::{Method, StatusCode};
    use serde_json::{Value, json};
    use subtally_shared::types::UserId;

    async fn create(app: &TestApp, user: UserId, body: Value) -> Value {
        let (status, created) = app
            .send(Method::POST, "/api/v1/subscriptions", user, Some(body))
            .await;
        assert_eq!(status, StatusCode::CREATED, "{created}");
        created
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let app = TestApp::new();
        let user = UserId::new();
        let created = create(
            &app,
            user,
            json!({
                "name": "Netflix",
                "amount": "15.49",
                "currency": "USD",
                "type": "monthly",
                "website_url": "https://netflix.com",
            }),
        )
        .await;

        assert_eq!(created["name"], "Netflix");
        assert_eq!(created["type"], "monthly");
        assert_eq!(created["amount"], "15.49");
        assert!(created["start_date"].is_string());

        let uri = format!("/api/v1/subscriptions/{}", created["id"].as_str().unwrap());
        let (status, fetched) = app.send(Method::GET, &uri, user, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched, created);

        let (status, _) = app.send(Method::GET, &uri, UserId::new(), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_create_rejects_blank_name() {
        let app = TestApp::new();
        let (status, body) = app
            .send(
                Method::POST,
                "/api/v1/subscriptions",
                UserId::new(),
                Some(json!({
                    "name": "  ",
                    "amount": "1",
                    "currency": "USD",
                    "type": "onetime",
                })),
            )
            .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_create_malformed_body_uses_error_envelope() {
        let app = TestApp::new();
        let (status, body) = app
            .send(
                Method::POST,
                "/api/v1/subscriptions",
                UserId::new(),
                Some(json!({
                    "name": "Netflix",
                    "amount": "15.49",
                    "currency": "USD",
                    "type": "weekly",
                })),
            )
            .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "VALIDATION_ERROR");
        assert!(body["message"].is_string());
    }

    #[tokio::test]
    async fn test_create_rejects_amount_above_limit() {
        let app = TestApp::new();
        let (status, body) = app
            .send(
                Method::POST,
                "/api/v1/subscriptions",
                UserId::new(),
                Some(json!({
                    "name": "Yacht",
                    "amount": "7922816251426433759354395033",
                    "currency": "USD",
                    "type": "monthly",
                })),
            )
            .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_list_sorted_and_converted() {
        let app = TestApp::new();
        let user = UserId::new();
        for (name, amount, currency) in [
            ("Hotstar", "830", "INR"),
            ("Spotify", "11.99", "USD"),
            ("Domain", "12", "USD"),
        ] {
            create(
                &app,
                user,
                json!({ "name": name, "amount": amount, "currency": currency, "type": "monthly" }),
            )
            .await;
        }

        let (status, body) = app
            .send(
                Method::GET,
                "/api/v1/subscriptions?sort_by=amount&sort_order=asc&per_page=2&currency=USD",
                user,
                None,
            )
            .await;

        assert_eq!(status, StatusCode::OK);
        let data = body["data"].as_array().unwrap();
        assert_eq!(data.len(), 2);
        assert_eq!(data[0]["name"], "Hotstar");
        assert_eq!(data[0]["converted_amount"], "10.00");
        assert_eq!(data[0]["display_currency"], "USD");
        assert_eq!(data[1]["name"], "Spotify");
        assert_eq!(body["meta"]["total"], 3);
        assert_eq!(body["meta"]["total_pages"], 2);
    }

    #[tokio::test]
    async fn test_list_filters_by_kind_and_search() {
        let app = TestApp::new();
        let user = UserId::new();
        create(
            &app,
            user,
            json!({ "name": "Netflix", "amount": "10", "currency": "USD", "type": "monthly" }),
        )
        .await;
        create(
            &app,
            user,
            json!({ "name": "Netflix Annual", "amount": "100", "currency": "USD", "type": "yearly" }),
        )
        .await;

        let (_, body) = app
            .send(
                Method::GET,
                "/api/v1/subscriptions?kind=yearly&search=netf",
                user,
                None,
            )
            .await;
        let data = body["data"].as_array().unwrap();
        assert_eq!(data.len(), 1);
        assert_eq!(data[0]["name"], "Netflix Annual");
    }

    #[tokio::test]
    async fn test_list_rejects_bad_sort_field() {
        let app = TestApp::new();
        let (status, body) = app
            .send(
                Method::GET,
                "/api/v1/subscriptions?sort_by=color",
                UserId::new(),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let app = TestApp::new();
        let user = UserId::new();
        let created = create(
            &app,
            user,
            json!({ "name": "Gym", "amount": "40", "currency": "USD", "type": "monthly" }),
        )
        .await;
        let uri = format!("/api/v1/subscriptions/{}", created["id"].as_str().unwrap());

        let (status, updated) = app
            .send(Method::PUT, &uri, user, Some(json!({ "amount": "45.50" })))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["amount"], "45.50");
        assert_eq!(updated["name"], "Gym");

        let (status, _) = app.send(Method::DELETE, &uri, UserId::new(), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = app.send(Method::DELETE, &uri, user, None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(body.is_null());

        let (status, _) = app.send(Method::GET, &uri, user, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
