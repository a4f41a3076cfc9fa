//! Subscription service tests.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use rstest::rstest;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use subtally_shared::AppError;
use subtally_shared::types::{Currency, PageRequest, SubscriptionId, UserId};

use super::*;
use crate::currency::{
    Clock, CurrencyConverter, ManualClock, MockRateProvider, RateCache, RateTable,
};
use crate::split::SplitPolicy;

fn clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap(),
    ))
}

fn converter(clock: Arc<ManualClock>) -> Arc<CurrencyConverter> {
    let mut provider = MockRateProvider::new();
    provider
        .expect_fetch()
        .returning(|| RateTable::new(HashMap::from([(Currency::Inr, dec!(83))])));
    Arc::new(CurrencyConverter::with_parts(
        Arc::new(provider),
        clock,
        RateCache::default(),
        RateTable::fallback(),
    ))
}

fn service_with_clock(clock: Arc<ManualClock>) -> SubscriptionService {
    SubscriptionService::with_clock(
        Arc::new(InMemorySubscriptionStore::new()),
        converter(Arc::clone(&clock)),
        SplitPolicy::default(),
        clock,
    )
}

fn service() -> SubscriptionService {
    service_with_clock(clock())
}

fn new_sub(name: &str, amount: Decimal, currency: Currency, kind: RecurrenceKind) -> NewSubscription {
    NewSubscription {
        name: name.to_string(),
        amount,
        currency,
        kind,
        website_url: None,
    }
}

#[tokio::test]
async fn test_create_stamps_start_date_and_trims_name() {
    let clock = clock();
    let service = service_with_clock(Arc::clone(&clock));
    let user = UserId::new();

    let mut input = new_sub("  Netflix ", dec!(15.49), Currency::Usd, RecurrenceKind::Monthly);
    input.website_url = Some("https://netflix.com".to_string());
    let created = service.create(user, input).await.unwrap();

    assert_eq!(created.name, "Netflix");
    assert_eq!(created.user_id, user);
    assert_eq!(created.start_date, clock.now());
    assert_eq!(created.created_at, created.updated_at);
    assert_eq!(created.website_url.as_deref(), Some("https://netflix.com"));
    assert_eq!(service.get(user, created.id).await.unwrap(), created);
}

#[rstest]
#[case(new_sub("   ", dec!(1), Currency::Usd, RecurrenceKind::Monthly), "name")]
#[case(new_sub("Gym", dec!(-0.01), Currency::Usd, RecurrenceKind::Monthly), "negative")]
#[case(new_sub("Jet", dec!(1000000000.01), Currency::Usd, RecurrenceKind::Monthly), "exceed")]
#[case(new_sub("Jet", Decimal::MAX, Currency::Inr, RecurrenceKind::Yearly), "exceed")]
#[tokio::test]
async fn test_create_rejects_invalid_input(#[case] input: NewSubscription, #[case] needle: &str) {
    let err = service().create(UserId::new(), input).await.unwrap_err();

    assert!(matches!(err, AppError::Validation(_)));
    assert!(err.to_string().contains(needle), "{err}");
}

#[tokio::test]
async fn test_create_rejects_non_http_url() {
    let mut input = new_sub("Gym", dec!(20), Currency::Usd, RecurrenceKind::Monthly);
    input.website_url = Some("ftp://gym.example".to_string());

    let err = service().create(UserId::new(), input).await.unwrap_err();
    assert_eq!(err.status_code(), 400);
}

#[tokio::test]
async fn test_zero_amount_is_allowed() {
    let created = service()
        .create(
            UserId::new(),
            new_sub("Free tier", Decimal::ZERO, Currency::Usd, RecurrenceKind::Monthly),
        )
        .await
        .unwrap();
    assert_eq!(created.amount, Decimal::ZERO);
}

#[tokio::test]
async fn test_list_converts_sorts_and_pages() {
    let clock = clock();
    let service = service_with_clock(Arc::clone(&clock));
    let user = UserId::new();

    service
        .create(user, new_sub("Hotstar", dec!(830), Currency::Inr, RecurrenceKind::Monthly))
        .await
        .unwrap();
    clock.advance(Duration::days(1));
    service
        .create(user, new_sub("Spotify", dec!(11.99), Currency::Usd, RecurrenceKind::Monthly))
        .await
        .unwrap();
    clock.advance(Duration::days(1));
    service
        .create(user, new_sub("Domain", dec!(12), Currency::Usd, RecurrenceKind::Yearly))
        .await
        .unwrap();

    let filters = ListingFilters {
        sort_by: SortField::Amount,
        ..ListingFilters::default()
    };
    let page = service
        .list(user, &filters, PageRequest::new(1, 2), Currency::Usd)
        .await
        .unwrap();

    let rows: Vec<(&str, Decimal)> = page
        .data
        .iter()
        .map(|l| (l.subscription.name.as_str(), l.converted_amount))
        .collect();
    assert_eq!(rows, vec![("Domain", dec!(12)), ("Spotify", dec!(11.99))]);
    assert_eq!(page.meta.total, 3);
    assert_eq!(page.meta.total_pages, 2);

    // Default listing is newest first
    let newest = service
        .list(user, &ListingFilters::default(), PageRequest::default(), Currency::Inr)
        .await
        .unwrap();
    assert_eq!(newest.data[0].subscription.name, "Domain");
    assert_eq!(newest.data[0].converted_amount, dec!(996.00));
    assert_eq!(newest.data[2].converted_amount, dec!(830));
}

#[tokio::test]
async fn test_list_is_scoped_to_user() {
    let service = service();
    service
        .create(UserId::new(), new_sub("Netflix", dec!(10), Currency::Usd, RecurrenceKind::Monthly))
        .await
        .unwrap();

    let page = service
        .list(UserId::new(), &ListingFilters::default(), PageRequest::default(), Currency::Usd)
        .await
        .unwrap();
    assert!(page.data.is_empty());
    assert_eq!(page.meta.total_pages, 1);
}

#[tokio::test]
async fn test_analytics_counts_every_kind() {
    let service = service();
    let user = UserId::new();
    for input in [
        new_sub("Netflix", dec!(10), Currency::Usd, RecurrenceKind::Monthly),
        new_sub("Domain", dec!(996), Currency::Inr, RecurrenceKind::Yearly),
        new_sub("Course", dec!(30), Currency::Usd, RecurrenceKind::OneTime),
    ] {
        service.create(user, input).await.unwrap();
    }

    let analytics = service.analytics(user, Currency::Usd).await.unwrap();
    assert_eq!(analytics.monthly_spend, dec!(11.00));
    assert_eq!(analytics.yearly_spend, dec!(162.00));
    assert_eq!(analytics.by_kind.monthly, 1);
    assert_eq!(analytics.by_kind.yearly, 1);
    assert_eq!(analytics.by_kind.onetime, 1);
}

#[tokio::test]
async fn test_largest_amounts_list_and_aggregate() {
    let service = service();
    let user = UserId::new();
    for _ in 0..3 {
        service
            .create(user, new_sub("Yacht", MAX_AMOUNT, Currency::Usd, RecurrenceKind::Monthly))
            .await
            .unwrap();
    }

    let page = service
        .list(user, &ListingFilters::default(), PageRequest::default(), Currency::Inr)
        .await
        .unwrap();
    assert_eq!(page.data[0].converted_amount, dec!(83000000000.00));

    let analytics = service.analytics(user, Currency::Inr).await.unwrap();
    assert_eq!(analytics.yearly_spend, dec!(2988000000000.00));
}

#[tokio::test]
async fn test_update_applies_present_fields() {
    let clock = clock();
    let service = service_with_clock(Arc::clone(&clock));
    let user = UserId::new();
    let mut input = new_sub("Netflix", dec!(10), Currency::Usd, RecurrenceKind::Monthly);
    input.website_url = Some("https://netflix.com".to_string());
    let created = service.create(user, input).await.unwrap();

    clock.advance(Duration::hours(2));
    let updated = service
        .update(
            user,
            created.id,
            UpdateSubscription {
                amount: Some(dec!(15.49)),
                website_url: Some(String::new()),
                ..UpdateSubscription::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.name, "Netflix");
    assert_eq!(updated.amount, dec!(15.49));
    assert_eq!(updated.website_url, None);
    assert_eq!(updated.start_date, created.start_date);
    assert_eq!(updated.updated_at, created.updated_at + Duration::hours(2));
}

#[tokio::test]
async fn test_update_validates_before_lookup() {
    let err = service()
        .update(
            UserId::new(),
            SubscriptionId::new(),
            UpdateSubscription {
                name: Some(" ".to_string()),
                ..UpdateSubscription::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn test_foreign_records_are_not_found() {
    let service = service();
    let owner = UserId::new();
    let other = UserId::new();
    let created = service
        .create(owner, new_sub("Netflix", dec!(10), Currency::Usd, RecurrenceKind::Monthly))
        .await
        .unwrap();

    assert!(matches!(
        service.get(other, created.id).await,
        Err(AppError::NotFound(_))
    ));
    assert!(matches!(
        service.delete(other, created.id).await,
        Err(AppError::NotFound(_))
    ));
    assert!(matches!(
        service
            .update(other, created.id, UpdateSubscription::default())
            .await,
        Err(AppError::NotFound(_))
    ));

    service.delete(owner, created.id).await.unwrap();
    assert!(matches!(
        service.get(owner, created.id).await,
        Err(AppError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_storage_failure_propagates() {
    let mut store = MockSubscriptionStore::new();
    store
        .expect_list()
        .returning(|_| Err(StorageError::Backend("connection reset".to_string())));
    let clock = clock();
    let service = SubscriptionService::with_clock(
        Arc::new(store),
        converter(Arc::clone(&clock)),
        SplitPolicy::default(),
        clock,
    );

    let err = service
        .analytics(UserId::new(), Currency::Usd)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Storage(_)));
    assert!(!err.is_user_facing());
}

#[tokio::test]
async fn test_split_session_uses_policy() {
    let service = service();
    let user = UserId::new();
    let created = service
        .create(user, new_sub("Netflix", dec!(100), Currency::Usd, RecurrenceKind::Monthly))
        .await
        .unwrap();

    let session = service.split_session(user, created.id).await.unwrap();
    assert_eq!(session.participants().len(), 1);
    assert_eq!(session.shares(), &[dec!(50.00)]);

    assert!(matches!(
        service.split_session(UserId::new(), created.id).await,
        Err(AppError::NotFound(_))
    ));

    let err = service
        .split_session_with(user, created.id, Vec::new())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}
