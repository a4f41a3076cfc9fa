//! Currency conversion logic.
//!
//! CRITICAL: Rounding strategy for conversions:
//! - Convert through USD, the pivot every rate is relative to
//! - Round only the final result, to cents
//! - Use standard rounding (midpoint away from zero)

use rust_decimal::Decimal;
use subtally_shared::AppError;
use subtally_shared::types::{Currency, round_money};
use thiserror::Error;

use super::rates::RateTable;

/// Conversion failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConversionError {
    /// The converted amount does not fit in a decimal.
    #[error("amount is too large to convert from {from} to {to}")]
    Overflow {
        /// Source currency.
        from: Currency,
        /// Target currency.
        to: Currency,
    },
}

impl From<ConversionError> for AppError {
    fn from(err: ConversionError) -> Self {
        Self::Validation(err.to_string())
    }
}

/// Converts `amount` from one currency to another using a USD-relative table.
///
/// Same-currency conversions return the amount untouched, without rounding.
pub fn convert_with_table(
    amount: Decimal,
    from: Currency,
    to: Currency,
    table: &RateTable,
) -> Result<Decimal, ConversionError> {
    if from == to {
        return Ok(amount);
    }

    let usd_amount = if from.is_pivot() {
        Some(amount)
    } else {
        amount.checked_div(table.rate(from))
    };

    let converted = if to.is_pivot() {
        usd_amount
    } else {
        usd_amount.and_then(|usd| usd.checked_mul(table.rate(to)))
    };

    converted
        .map(round_money)
        .ok_or(ConversionError::Overflow { from, to })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;

    fn table(inr: Decimal) -> RateTable {
        RateTable::new(HashMap::from([(Currency::Inr, inr)])).unwrap()
    }

    #[test]
    fn test_usd_to_inr() {
        let result = convert_with_table(dec!(100), Currency::Usd, Currency::Inr, &table(dec!(83))).unwrap();
        assert_eq!(result, dec!(8300.00));
    }

    #[test]
    fn test_inr_to_usd() {
        let result = convert_with_table(dec!(8300), Currency::Inr, Currency::Usd, &table(dec!(83))).unwrap();
        assert_eq!(result, dec!(100.00));
    }

    #[test]
    fn test_same_currency_is_untouched() {
        let result = convert_with_table(
            dec!(12.3456),
            Currency::Inr,
            Currency::Inr,
            &table(dec!(83)),
        )
        .unwrap();
        assert_eq!(result, dec!(12.3456));
        assert_eq!(result.scale(), 4);
    }

    #[test]
    fn test_rounds_to_cents() {
        // 10 INR / 83 = 0.120481... USD
        let result = convert_with_table(dec!(10), Currency::Inr, Currency::Usd, &table(dec!(83))).unwrap();
        assert_eq!(result, dec!(0.12));
        assert_eq!(result.scale(), 2);
    }

    #[test]
    fn test_midpoint_rounds_away_from_zero() {
        // 0.125 USD * 1 = 0.125 -> 0.13 with standard rounding
        let result = convert_with_table(dec!(0.125), Currency::Usd, Currency::Inr, &table(dec!(1))).unwrap();
        assert_eq!(result, dec!(0.13));
    }

    #[test]
    fn test_round_trip_within_a_cent() {
        let rates = table(dec!(83.4712));
        let there = convert_with_table(dec!(19.99), Currency::Usd, Currency::Inr, &rates).unwrap();
        let back = convert_with_table(there, Currency::Inr, Currency::Usd, &rates).unwrap();
        assert!((back - dec!(19.99)).abs() <= dec!(0.01));
    }

    #[test]
    fn test_overflow_is_an_error() {
        let result = convert_with_table(Decimal::MAX, Currency::Usd, Currency::Inr, &table(dec!(83)));
        assert_eq!(
            result,
            Err(ConversionError::Overflow {
                from: Currency::Usd,
                to: Currency::Inr,
            })
        );
    }

    #[test]
    fn test_overflow_on_the_way_to_usd() {
        let result = convert_with_table(Decimal::MAX, Currency::Inr, Currency::Usd, &table(dec!(0.5)));
        assert!(result.is_err());
    }
}
