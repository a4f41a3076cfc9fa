//! Router harness for handler tests.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header::AUTHORIZATION},
};
use http_body_util::BodyExt;
use rust_decimal_macros::dec;
use serde_json::Value;
use subtally_core::currency::{CurrencyConverter, RateError, RateProvider, RateTable};
use subtally_core::profile::{InMemoryProfileStore, ProfileService};
use subtally_core::split::{LinkHandoff, SplitPolicy};
use subtally_core::subscription::{InMemorySubscriptionStore, SubscriptionService};
use subtally_shared::types::{Currency, UserId};
use subtally_shared::{JwtConfig, JwtService};
use tower::ServiceExt;

use crate::{AppState, create_router};

/// Always serves the same table.
pub struct StaticRateProvider(pub RateTable);

#[async_trait]
impl RateProvider for StaticRateProvider {
    async fn fetch(&self) -> Result<RateTable, RateError> {
        Ok(self.0.clone())
    }
}

/// A router over in-memory state with USD:INR at 1:83 and chat-link hand-off.
pub struct TestApp {
    pub state: AppState,
    router: Router,
    jwt_config: JwtConfig,
}

impl TestApp {
    pub fn new() -> Self {
        let table = RateTable::new(HashMap::from([(Currency::Inr, dec!(83))])).unwrap();
        let converter = Arc::new(CurrencyConverter::new(Arc::new(StaticRateProvider(table))));
        let store = Arc::new(InMemorySubscriptionStore::new());
        let service = Arc::new(SubscriptionService::new(
            store.clone(),
            converter,
            SplitPolicy::default(),
        ));
        let profiles = Arc::new(ProfileService::new(
            Arc::new(InMemoryProfileStore::new()),
            store,
        ));
        let jwt_config = JwtConfig {
            secret: "test-secret-key-for-handlers".to_string(),
            ..JwtConfig::default()
        };
        let state = AppState::new(
            service,
            profiles,
            Arc::new(LinkHandoff::default()),
            Arc::new(JwtService::new(jwt_config.clone())),
        );

        Self {
            router: create_router(state.clone()),
            state,
            jwt_config,
        }
    }

    pub fn jwt_config(&self) -> JwtConfig {
        self.jwt_config.clone()
    }

    /// Sends a request with an explicit Authorization header value.
    pub async fn send_with_header(
        &self,
        method: Method,
        uri: &str,
        authorization: Option<String>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(value) = authorization {
            builder = builder.header(AUTHORIZATION, value);
        }
        let request = match body {
            Some(json) => builder
                .header("Content-Type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };
        (status, json)
    }

    /// Sends a request authenticated as `user`.
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        user: UserId,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        self.send_with_header(method, uri, Some(bearer(&self.state, user)), body)
            .await
    }
}

/// Returns an Authorization header value for `user`.
pub fn bearer(state: &AppState, user: UserId) -> String {
    let token = state
        .jwt_service
        .generate_access_token(user.into_inner())
        .unwrap();
    format!("Bearer {token}")
}
