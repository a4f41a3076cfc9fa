//! Property-based tests for split allocation.
//!
//! - Sum invariant: shares always add up to the rounded split portion
//! - Shape: one share per participant, all but the last identical
//! - Balance: a fresh allocation is always balanced

use proptest::prelude::*;
use rust_decimal::Decimal;
use subtally_shared::types::round_money;

use super::allocation::SplitAllocator;

/// Strategy to generate positive amounts (0.01 to 1,000,000.00).
fn positive_amount() -> impl Strategy<Value = Decimal> {
    (1i64..100_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy to generate participant counts within the dialog limit.
fn participant_count() -> impl Strategy<Value = usize> {
    1usize..=5
}

/// Strategy to generate split fractions (0.01 to 1.00).
fn fraction() -> impl Strategy<Value = Decimal> {
    (1i64..=100i64).prop_map(|p| Decimal::new(p, 2))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// *For any* positive total and 1-5 participants, the shares sum to
    /// exactly half the total rounded to cents.
    #[test]
    fn prop_sum_equals_rounded_half(
        total in positive_amount(),
        count in participant_count(),
    ) {
        let allocation = SplitAllocator::default().allocate(total, count);
        prop_assert!(allocation.valid);
        prop_assert_eq!(
            allocation.total(),
            round_money(total / Decimal::TWO),
            "total={}, count={}", total, count
        );
    }

    /// *For any* fraction, the sum invariant holds for that fraction.
    #[test]
    fn prop_sum_equals_rounded_fraction(
        total in positive_amount(),
        count in 1usize..=20,
        fraction in fraction(),
    ) {
        let allocation = SplitAllocator::new(fraction).allocate(total, count);
        prop_assert_eq!(allocation.total(), round_money(total * fraction));
    }

    /// *For any* valid input there is one share per participant and only the
    /// last one may differ from the others.
    #[test]
    fn prop_only_last_share_differs(
        total in positive_amount(),
        count in participant_count(),
    ) {
        let allocation = SplitAllocator::default().allocate(total, count);
        prop_assert_eq!(allocation.shares.len(), count);

        let first = allocation.shares[0];
        for share in &allocation.shares[..count - 1] {
            prop_assert_eq!(*share, first);
        }
        // Drift is at most one cent per participant
        let last = allocation.shares[count - 1];
        prop_assert!((last - first).abs() <= Decimal::new(i64::try_from(count).unwrap_or(i64::MAX), 2));
    }

    /// *For any* valid input every share has at most two decimal places.
    #[test]
    fn prop_shares_are_whole_cents(
        total in positive_amount(),
        count in participant_count(),
    ) {
        let allocation = SplitAllocator::default().allocate(total, count);
        for share in allocation.shares {
            prop_assert_eq!(share, share.round_dp(2));
        }
    }

    /// *For any* valid input the fresh allocation passes the balance check.
    #[test]
    fn prop_fresh_allocation_is_balanced(
        total in positive_amount(),
        count in participant_count(),
    ) {
        let allocator = SplitAllocator::default();
        let allocation = allocator.allocate(total, count);
        prop_assert!(allocator.is_balanced(total, &allocation.shares));
    }

    /// *For any* non-positive total the allocation is rejected with a reason.
    #[test]
    fn prop_non_positive_total_rejected(
        cents in -100_000i64..=0,
        count in participant_count(),
    ) {
        let allocation = SplitAllocator::default().allocate(Decimal::new(cents, 2), count);
        prop_assert!(!allocation.valid);
        prop_assert!(allocation.shares.is_empty());
        prop_assert!(allocation.reason().is_some_and(|r| !r.is_empty()));
    }
}
