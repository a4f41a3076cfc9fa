//! Sorting, filtering and pagination of a user's subscription list.

use std::cmp::Ordering;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use subtally_shared::types::{Currency, PageRequest, PageResponse};

use super::types::{RecurrenceKind, Subscription};

/// Field the list is ordered by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortField {
    /// Start date.
    #[default]
    Date,
    /// Amount in the display currency.
    Amount,
    /// Name, case-insensitive.
    Name,
}

/// Sort direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Smallest, oldest or A first.
    Asc,
    /// Largest, newest or Z first.
    #[default]
    Desc,
}

impl SortOrder {
    /// Returns the opposite direction.
    #[must_use]
    pub const fn toggle(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }

    fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            Self::Asc => ordering,
            Self::Desc => ordering.reverse(),
        }
    }
}

/// List view options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ListingFilters {
    /// Sort field.
    #[serde(default)]
    pub sort_by: SortField,
    /// Sort direction.
    #[serde(default)]
    pub sort_order: SortOrder,
    /// Only this recurrence kind.
    #[serde(default)]
    pub kind: Option<RecurrenceKind>,
    /// Case-insensitive name substring.
    #[serde(default)]
    pub search: Option<String>,
}

impl ListingFilters {
    /// Returns true when `subscription` passes the kind and search filters.
    #[must_use]
    pub fn matches(&self, subscription: &Subscription) -> bool {
        if let Some(kind) = self.kind
            && subscription.kind != kind
        {
            return false;
        }

        match self.search.as_deref().map(str::trim) {
            Some(term) if !term.is_empty() => subscription
                .name
                .to_lowercase()
                .contains(&term.to_lowercase()),
            _ => true,
        }
    }
}

/// A subscription with its amount converted for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListedSubscription {
    /// The stored record.
    #[serde(flatten)]
    pub subscription: Subscription,
    /// `amount` in `display_currency`.
    pub converted_amount: Decimal,
    /// Currency the list is shown in.
    pub display_currency: Currency,
}

/// Sorts in place. Equal elements keep their relative order.
pub fn sort_listed(items: &mut [ListedSubscription], field: SortField, order: SortOrder) {
    items.sort_by(|a, b| {
        let ordering = match field {
            SortField::Date => a.subscription.start_date.cmp(&b.subscription.start_date),
            SortField::Amount => a.converted_amount.cmp(&b.converted_amount),
            SortField::Name => a
                .subscription
                .name
                .to_lowercase()
                .cmp(&b.subscription.name.to_lowercase()),
        };
        order.apply(ordering)
    });
}

/// Filters, sorts and slices one page.
#[must_use]
pub fn paginate(
    items: Vec<ListedSubscription>,
    filters: &ListingFilters,
    page: PageRequest,
) -> PageResponse<ListedSubscription> {
    let mut items: Vec<ListedSubscription> = items
        .into_iter()
        .filter(|item| filters.matches(&item.subscription))
        .collect();
    sort_listed(&mut items, filters.sort_by, filters.sort_order);
    PageResponse::from_items(items, page)
}
