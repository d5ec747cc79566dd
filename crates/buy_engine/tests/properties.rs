//! Property tests for quoting, flooring and validation
//!
//! Increase cases: PROPTEST_CASES=1000 cargo test -p buy-engine --test properties

use amount_model::{floor_fixed, from_units, parse_or_zero, to_units, Decimal};
use buy_engine::*;
use proptest::prelude::*;

fn typed_amount() -> impl Strategy<Value = String> {
    (0u32..10_000_000, "[0-9]{0,18}").prop_map(|(whole, frac)| {
        if frac.is_empty() {
            whole.to_string()
        } else {
            format!("{}.{}", whole, frac)
        }
    })
}

fn raw_balance() -> impl Strategy<Value = u128> {
    prop_oneof![
        Just(0u128),
        1u128..1_000_000,
        any::<u64>().prop_map(u128::from),
        (0u128..100_000_000_000).prop_map(|wei_e9| wei_e9 * 1_000_000_000),
    ]
}

proptest! {
    #[test]
    fn quoted_side_is_floor4_of_quote(typed in typed_amount(), num in 1u128..5_000, den in 1u128..5_000) {
        let rate = FixedRate::new(num, den);
        let mut engine = AmountEngine::new(rate, Precision::default());
        engine.set_base_amount(&typed).unwrap();

        let units = to_units(parse_or_zero(&typed), 18).unwrap();
        let expected = floor_fixed(from_units(rate.quote(units).unwrap(), 18).unwrap(), 4);
        prop_assert_eq!(engine.pair().quoted_amount(), expected.as_str());
        prop_assert_eq!(engine.pair().base_amount(), typed.as_str());
    }

    #[test]
    fn quoted_side_exact_for_large_quotes(whole in 100_000_000u128..100_000_000_000, num in 1_000u128..5_000) {
        let mut engine = AmountEngine::new(FixedRate::new(num, 3), Precision::default());
        engine.set_base_amount(&whole.to_string()).unwrap();

        let units = whole * 1_000_000_000_000_000_000 * num / 3;
        let expected = format!(
            "{}.{:04}",
            units / 1_000_000_000_000_000_000,
            units % 1_000_000_000_000_000_000 / 100_000_000_000_000
        );
        prop_assert_eq!(engine.pair().quoted_amount(), expected.as_str());
    }

    #[test]
    fn oversized_amount_always_exceeds_balance(digits in "[1-9][0-9]{28,40}", raw in raw_balance()) {
        let held = BalanceSnapshot::new(raw, 18).unwrap();
        let mut engine = AmountEngine::new(FixedRate::new(1, 1), Precision::default());
        prop_assert!(engine.set_base_amount(&digits).is_err());
        prop_assert!(engine.validate(&held).is_insufficient_balance);
    }

    #[test]
    fn max_fill_never_overshoots(raw in raw_balance()) {
        let held = BalanceSnapshot::new(raw, 18).unwrap();
        let mut engine = AmountEngine::new(FixedRate::new(1000, 1), Precision::default());
        engine.set_max(Some(&held)).unwrap();

        let filled = parse_or_zero(engine.pair().base_amount());
        prop_assert!(filled <= held.value_decimal());

        let result = engine.validate(&held);
        prop_assert!(!result.is_insufficient_balance);
        // Anything under one millionth floors to zero and is not buyable
        let buyable = held.value_decimal() >= Decimal::new(1, 6);
        prop_assert_eq!(result.is_amount_valid, buyable);
    }

    #[test]
    fn empty_edit_always_clears(typed in typed_amount()) {
        let mut engine = AmountEngine::new(FixedRate::new(7, 3), Precision::default());
        engine.set_base_amount(&typed).unwrap();
        engine.set_base_amount("").unwrap();
        prop_assert_eq!(engine.pair().quoted_amount(), "");
        prop_assert_eq!(engine.quoted_state(), FieldState::Empty);
    }

    #[test]
    fn validate_is_pure(typed in "[0-9a-z.]{0,12}", raw in raw_balance()) {
        let held = BalanceSnapshot::new(raw, 18).unwrap();
        let mut engine = AmountEngine::new(FixedRate::new(1000, 1), Precision::default());
        let _ = engine.set_base_amount(&typed);

        let before = engine.pair().clone();
        let first = engine.validate(&held);
        let second = engine.validate(&held);
        prop_assert_eq!(first, second);
        prop_assert_eq!(engine.pair(), &before);
    }

    #[test]
    fn last_edit_wins_regardless_of_arrival(amounts in prop::collection::vec(1u64..1_000_000, 2..6)) {
        let rate = FixedRate::new(1000, 1);
        let mut engine = AmountEngine::new(rate, Precision::default());

        let requests: Vec<_> = amounts
            .iter()
            .map(|a| engine.begin_base_amount(&a.to_string()).unwrap().unwrap())
            .collect();

        // Answer newest first, then the rest in issue order
        let latest = *requests.last().unwrap();
        prop_assert!(engine.complete_quote(latest.ticket, rate.quote(latest.base_units)).unwrap());
        for request in &requests[..requests.len() - 1] {
            prop_assert!(!engine.complete_quote(request.ticket, rate.quote(request.base_units)).unwrap());
        }

        let last = amounts.last().unwrap();
        prop_assert_eq!(engine.pair().base_amount(), last.to_string());
        prop_assert_eq!(engine.pair().quoted_amount(), format!("{}.0000", last * 1000));
    }
}
