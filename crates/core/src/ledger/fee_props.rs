//! Property-based tests for fee calculation.

use coinvault_shared::types::Btc;
use proptest::prelude::*;
use rust_decimal::Decimal;

use super::fee::FeeSchedule;
use super::types::TransferKind;

/// Strategy for amounts from one satoshi up to 1,000 BTC.
fn amount_strategy() -> impl Strategy<Value = Btc> {
    (1i64..100_000_000_000i64).prop_map(|sats| Btc::try_from(Decimal::new(sats, 8)).unwrap())
}

/// Strategy for fee rates between 0 and 10%.
fn rate_strategy() -> impl Strategy<Value = FeeSchedule> {
    (0i64..1_000i64).prop_map(|bp| FeeSchedule::new(Decimal::new(bp, 4)).unwrap())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// The recorded profit never exceeds the exact fee and is within one
    /// satoshi below it.
    #[test]
    fn prop_profit_is_truncated_exact_fee(amount in amount_strategy(), fees in rate_strategy()) {
        let exact = amount.as_decimal() * fees.rate();
        let profit = fees.calculate_profit(amount, TransferKind::SentExternal).unwrap();

        prop_assert!(profit.as_decimal() <= exact);
        prop_assert!(exact - profit.as_decimal() < Btc::SATOSHI.as_decimal());
        prop_assert!(profit.as_decimal().scale() <= 8);
    }

    /// The funds check always covers what is actually debited.
    #[test]
    fn prop_required_funds_cover_debit(amount in amount_strategy(), fees in rate_strategy()) {
        let profit = fees.calculate_profit(amount, TransferKind::SentExternal).unwrap();
        let required = fees.required_funds(amount, TransferKind::SentExternal);

        prop_assert!(required >= amount.as_decimal() + profit.as_decimal());
    }

    /// Internal transfers are always free.
    #[test]
    fn prop_internal_is_free(amount in amount_strategy(), fees in rate_strategy()) {
        prop_assert_eq!(
            fees.calculate_profit(amount, TransferKind::SentInternal).unwrap(),
            Btc::ZERO
        );
        prop_assert_eq!(
            fees.required_funds(amount, TransferKind::SentInternal),
            amount.as_decimal()
        );
    }
}
