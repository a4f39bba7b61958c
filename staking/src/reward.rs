//! Reward accrual.

use gdao_types::{TokenAmount, BPS_DENOMINATOR};
use serde::{Deserialize, Serialize};

/// Seconds in a 365-day year.
pub const SECONDS_PER_YEAR: u64 = 365 * 24 * 3600;

/// Where claimed rewards come from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RewardSource {
    /// Credited without a matching debit. Supply grows without a cap.
    #[default]
    Mint,
    /// Paid out of the treasury; claims fail once it runs dry.
    Treasury,
}

/// `principal × apr_bps × elapsed / (10_000 × year)`, truncated.
///
/// `None` on overflow.
pub fn accrued_reward(
    principal: TokenAmount,
    apr_bps: u32,
    elapsed_secs: u64,
) -> Option<TokenAmount> {
    let numerator = principal
        .raw()
        .checked_mul(apr_bps as u128)?
        .checked_mul(elapsed_secs as u128)?;
    let denominator = BPS_DENOMINATOR as u128 * SECONDS_PER_YEAR as u128;
    Some(TokenAmount::new(numerator / denominator))
}
