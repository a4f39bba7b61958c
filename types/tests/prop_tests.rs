use proptest::prelude::*;

use gdao_types::{Timestamp, TokenAmount, BPS_DENOMINATOR};

proptest! {
    /// Display output parses back to the same amount.
    #[test]
    fn amount_display_parses_back(raw in 0u128..u64::MAX as u128 * 1000) {
        let amount = TokenAmount::new(raw);
        let parsed: TokenAmount = amount.to_string().parse().unwrap();
        prop_assert_eq!(parsed, amount);
    }

    /// A basis-point share never exceeds the original amount.
    #[test]
    fn mul_bps_never_exceeds_whole(raw in 0u128..u64::MAX as u128, bps in 0u32..=BPS_DENOMINATOR) {
        let amount = TokenAmount::new(raw);
        let share = amount.checked_mul_bps(bps).unwrap();
        prop_assert!(share <= amount);
    }

    /// checked_sub undoes checked_add.
    #[test]
    fn add_then_sub_is_identity(a in 0u128..u64::MAX as u128, b in 0u128..u64::MAX as u128) {
        let x = TokenAmount::new(a);
        let y = TokenAmount::new(b);
        let sum = x.checked_add(y).unwrap();
        prop_assert_eq!(sum.checked_sub(y).unwrap(), x);
    }

    /// ratio_bps of a part of a whole is within 0..=10_000.
    #[test]
    fn ratio_of_part_is_bounded(whole in 1u128..u64::MAX as u128, pct in 0u128..=100) {
        let part = whole * pct / 100;
        let bps = TokenAmount::ratio_bps(TokenAmount::new(part), TokenAmount::new(whole));
        prop_assert!(bps <= BPS_DENOMINATOR);
    }

    /// Elapsed time is never negative.
    #[test]
    fn elapsed_since_saturates(a in 0u64..u64::MAX, b in 0u64..u64::MAX) {
        let elapsed = Timestamp::new(a).elapsed_since(Timestamp::new(b));
        prop_assert_eq!(elapsed, b.saturating_sub(a));
    }
}
