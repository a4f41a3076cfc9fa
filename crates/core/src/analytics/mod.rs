//! Spend analytics across a user's subscriptions.
//!
//! Amounts are first converted into the display currency, then folded into
//! monthly and yearly equivalents:
//!
//! | kind    | monthly | yearly |
//! |---------|---------|--------|
//! | monthly | `a`     | `12a`  |
//! | yearly  | `a/12`  | `a`    |
//! | onetime | -       | `a`    |
//!
//! Totals are rounded to cents once, after summing.

use rust_decimal::Decimal;
use serde::Serialize;
use subtally_shared::types::{Currency, round_money};

use crate::currency::{ConversionError, CurrencyConverter};
use crate::subscription::{RecurrenceKind, Subscription};

const MONTHS_PER_YEAR: Decimal = Decimal::from_parts(12, 0, 0, false, 0);

/// Number of subscriptions per recurrence kind. Every kind is always present.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct KindCounts {
    /// Monthly subscriptions.
    pub monthly: u64,
    /// Yearly subscriptions.
    pub yearly: u64,
    /// One-time purchases.
    pub onetime: u64,
}

impl KindCounts {
    /// Returns the count for `kind`.
    #[must_use]
    pub const fn get(&self, kind: RecurrenceKind) -> u64 {
        match kind {
            RecurrenceKind::Monthly => self.monthly,
            RecurrenceKind::Yearly => self.yearly,
            RecurrenceKind::OneTime => self.onetime,
        }
    }

    fn increment(&mut self, kind: RecurrenceKind) {
        match kind {
            RecurrenceKind::Monthly => self.monthly += 1,
            RecurrenceKind::Yearly => self.yearly += 1,
            RecurrenceKind::OneTime => self.onetime += 1,
        }
    }

    /// Returns the number of subscriptions counted.
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.monthly + self.yearly + self.onetime
    }
}

/// Aggregated spend in one currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubscriptionAnalytics {
    /// Monthly-equivalent spend.
    pub monthly_spend: Decimal,
    /// Yearly-equivalent spend.
    pub yearly_spend: Decimal,
    /// Currency of both totals.
    pub currency: Currency,
    /// Subscriptions per kind.
    pub by_kind: KindCounts,
}

impl SubscriptionAnalytics {
    /// Folds already converted `(kind, amount)` pairs.
    #[must_use]
    pub fn aggregate<I>(items: I, currency: Currency) -> Self
    where
        I: IntoIterator<Item = (RecurrenceKind, Decimal)>,
    {
        let mut monthly = Decimal::ZERO;
        let mut yearly = Decimal::ZERO;
        let mut by_kind = KindCounts::default();

        for (kind, amount) in items {
            match kind {
                RecurrenceKind::Monthly => {
                    monthly = monthly.saturating_add(amount);
                    yearly = yearly.saturating_add(amount.saturating_mul(MONTHS_PER_YEAR));
                }
                RecurrenceKind::Yearly => {
                    monthly = monthly.saturating_add(amount / MONTHS_PER_YEAR);
                    yearly = yearly.saturating_add(amount);
                }
                RecurrenceKind::OneTime => {
                    yearly = yearly.saturating_add(amount);
                }
            }
            by_kind.increment(kind);
        }

        Self {
            monthly_spend: round_money(monthly),
            yearly_spend: round_money(yearly),
            currency,
            by_kind,
        }
    }

    /// Converts every subscription into `currency` and aggregates.
    ///
    /// # Errors
    ///
    /// Returns [`ConversionError`] when an amount cannot be expressed in
    /// `currency`.
    pub async fn compute(
        subscriptions: &[Subscription],
        converter: &CurrencyConverter,
        currency: Currency,
    ) -> Result<Self, ConversionError> {
        let mut converted = Vec::with_capacity(subscriptions.len());
        for sub in subscriptions {
            let amount = converter.convert(sub.amount, sub.currency, currency).await?;
            converted.push((sub.kind, amount));
        }

        Ok(Self::aggregate(converted, currency))
    }
}
