//! Even-split allocation of a subscription's cost.
//!
//! The owner has already covered their own portion, so only `fraction` of the
//! total (half by default) is divided among participants. Shares are rounded
//! to cents and any drift is absorbed by the LAST share, which guarantees:
//!
//! `sum(shares) == round(total * fraction, 2)`
//!
//! Invalid input never panics and never returns `Err`; the allocation carries
//! a `valid` flag and a human-readable reason instead.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use subtally_shared::types::round_money;
use thiserror::Error;

/// Maximum distance between a hand-edited share total and the expected total.
pub const BALANCE_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Reasons an allocation can be rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SplitError {
    /// Zero participants.
    #[error("participant count must be positive")]
    NoParticipants,

    /// Zero or negative total.
    #[error("total must be positive")]
    NonPositiveTotal,

    /// More participants than the policy allows.
    #[error("a split can have at most {max} participants")]
    TooManyParticipants {
        /// Configured limit.
        max: usize,
    },

    /// The split portion does not fit in a decimal.
    #[error("total is too large to split")]
    TotalTooLarge,
}

/// Result of an allocation attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SplitAllocation {
    /// One share per participant, in participant order.
    pub shares: Vec<Decimal>,
    /// False when the input was rejected.
    pub valid: bool,
    /// Why the input was rejected.
    #[serde(serialize_with = "serialize_reason")]
    pub error: Option<SplitError>,
}

#[allow(clippy::ref_option)]
fn serialize_reason<S>(error: &Option<SplitError>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    match error {
        Some(e) => serializer.serialize_some(&e.to_string()),
        None => serializer.serialize_none(),
    }
}

impl SplitAllocation {
    pub(crate) const fn rejected(error: SplitError) -> Self {
        Self {
            shares: Vec::new(),
            valid: false,
            error: Some(error),
        }
    }

    /// Returns the rejection reason as user-facing text.
    #[must_use]
    pub fn reason(&self) -> Option<String> {
        self.error.map(|e| e.to_string())
    }

    /// Returns the sum of all shares.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.shares.iter().copied().sum()
    }
}

/// Splits a total evenly among participants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitAllocator {
    fraction: Decimal,
}

impl Default for SplitAllocator {
    fn default() -> Self {
        Self {
            fraction: Decimal::new(5, 1),
        }
    }
}

impl SplitAllocator {
    /// Creates an allocator dividing `fraction` of each total.
    #[must_use]
    pub const fn new(fraction: Decimal) -> Self {
        Self { fraction }
    }

    /// Returns the portion of the total that is divided.
    #[must_use]
    pub const fn fraction(&self) -> Decimal {
        self.fraction
    }

    /// Returns the amount participants owe in total, rounded to cents.
    ///
    /// `None` when `total * fraction` overflows.
    #[must_use]
    pub fn split_total(&self, total: Decimal) -> Option<Decimal> {
        total.checked_mul(self.fraction).map(round_money)
    }

    /// Allocates the split portion of `total` across `participant_count` shares.
    ///
    /// # Example
    ///
    /// ```
    /// use rust_decimal_macros::dec;
    /// use subtally_core::split::SplitAllocator;
    ///
    /// let allocation = SplitAllocator::default().allocate(dec!(100), 3);
    /// assert!(allocation.valid);
    /// assert_eq!(allocation.shares, vec![dec!(16.67), dec!(16.67), dec!(16.66)]);
    /// assert_eq!(allocation.total(), dec!(50));
    /// ```
    #[must_use]
    pub fn allocate(&self, total: Decimal, participant_count: usize) -> SplitAllocation {
        if participant_count == 0 {
            return SplitAllocation::rejected(SplitError::NoParticipants);
        }
        if total <= Decimal::ZERO {
            return SplitAllocation::rejected(SplitError::NonPositiveTotal);
        }

        let count = Decimal::from(participant_count as u64);
        let Some(split_total) = total.checked_mul(self.fraction) else {
            return SplitAllocation::rejected(SplitError::TotalTooLarge);
        };
        let base = round_money(split_total / count);

        // Measured against the rounded target so negative midpoints cannot
        // round away from it.
        let Some(remainder) = base
            .checked_mul(count)
            .and_then(|spread| round_money(split_total).checked_sub(spread))
        else {
            return SplitAllocation::rejected(SplitError::TotalTooLarge);
        };
        let Some(last) = base.checked_add(remainder) else {
            return SplitAllocation::rejected(SplitError::TotalTooLarge);
        };

        let mut shares = vec![base; participant_count];
        if let Some(share) = shares.last_mut() {
            *share = round_money(last);
        }

        SplitAllocation {
            shares,
            valid: true,
            error: None,
        }
    }

    /// Checks that possibly hand-edited shares still cover the split portion.
    ///
    /// Empty share lists are never balanced, nor are shares or totals whose
    /// arithmetic overflows.
    #[must_use]
    pub fn is_balanced(&self, total: Decimal, shares: &[Decimal]) -> bool {
        if shares.is_empty() {
            return false;
        }

        let sum = shares
            .iter()
            .try_fold(Decimal::ZERO, |acc, share| acc.checked_add(*share));
        let expected = total.checked_mul(self.fraction);

        match (sum, expected) {
            (Some(sum), Some(expected)) => sum
                .checked_sub(expected)
                .is_some_and(|drift| drift.abs() < BALANCE_TOLERANCE),
            _ => false,
        }
    }

    /// The "no subscription selected" allocation: no shares, nothing wrong.
    #[must_use]
    pub const fn reset() -> SplitAllocation {
        SplitAllocation {
            shares: Vec::new(),
            valid: true,
            error: None,
        }
    }
}
