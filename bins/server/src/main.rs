//! Subtally API Server
//!
//! Main entry point for the Subtally backend service.

use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use subtally_api::{AppState, create_router};
use subtally_core::currency::{CurrencyConverter, HttpRateProvider, RateTable, SystemClock};
use subtally_core::profile::{InMemoryProfileStore, ProfileService};
use subtally_core::split::{LinkHandoff, SplitPolicy};
use subtally_core::subscription::{InMemorySubscriptionStore, SubscriptionService};
use subtally_shared::{AppConfig, JwtConfig, JwtService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "subtally=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load()?;

    // Exchange rates
    let provider = HttpRateProvider::new(
        config.rates.endpoint.clone(),
        Duration::from_secs(config.rates.timeout_secs),
    )?;
    let fallback = RateTable::new(config.rates.fallback_rates())?;
    let freshness = config
        .rates
        .freshness()
        .ok_or_else(|| anyhow::anyhow!("rates.freshness_secs is out of range"))?;
    let converter = Arc::new(CurrencyConverter::with_freshness(
        Arc::new(provider),
        Arc::new(SystemClock),
        freshness,
        fallback,
    ));
    info!(
        endpoint = %config.rates.endpoint,
        freshness_secs = config.rates.freshness_secs,
        "Exchange rate provider configured"
    );

    // Subscriptions
    let policy = SplitPolicy::from(&config.split);
    let store = Arc::new(InMemorySubscriptionStore::new());
    let service = Arc::new(SubscriptionService::new(store.clone(), converter, policy));
    let profiles = Arc::new(ProfileService::new(
        Arc::new(InMemoryProfileStore::new()),
        store,
    ));
    info!(
        fraction = %policy.allocator.fraction(),
        max_participants = policy.max_participants,
        "Split policy configured"
    );

    // Create JWT service
    let jwt_config = JwtConfig {
        secret: config.jwt.secret.clone(),
        access_token_expires_minutes: i64::try_from(config.jwt.access_token_expiry_secs / 60)?,
    };
    let jwt_service = Arc::new(JwtService::new(jwt_config));

    let handoff = Arc::new(LinkHandoff::new(config.split.country_code.clone()));

    let app = create_router(AppState::new(service, profiles, handoff, jwt_service));

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
