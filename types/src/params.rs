//! Policy parameters: the token definition and the governance rules.
//!
//! `GovernanceParams` is mutable at runtime only through an executed
//! `parameter_change` proposal.

use crate::amount::{TokenAmount, BPS_DENOMINATOR};
use serde::{Deserialize, Serialize};

const HOUR: u64 = 3600;
const DAY: u64 = 24 * HOUR;

/// Process-wide governance policy.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GovernanceParams {
    /// Minimum proposer balance required to create a proposal.
    pub min_proposal_power: TokenAmount,

    /// Delay between proposal creation and the start of voting, in seconds.
    pub voting_delay_secs: u64,

    /// Length of the voting window, in seconds.
    pub voting_period_secs: u64,

    /// Timelock between the end of voting and earliest execution, in seconds.
    pub execution_delay_secs: u64,

    /// Fraction of total supply that must vote (basis points).
    pub quorum_bps: u32,

    /// Fraction of for + against votes that must be "for" (basis points).
    pub approval_threshold_bps: u32,
}

impl GovernanceParams {
    /// Reference policy: 100k GDT to propose, 24h delay, 3 day vote,
    /// 2 day timelock, 4% quorum, 50% approval.
    pub fn reference() -> Self {
        Self {
            min_proposal_power: TokenAmount::from_tokens(100_000),
            voting_delay_secs: DAY,
            voting_period_secs: 3 * DAY,
            execution_delay_secs: 2 * DAY,
            quorum_bps: 400,
            approval_threshold_bps: 5000,
        }
    }

    /// Same thresholds as the reference policy with minute-scale timelines.
    pub fn testing() -> Self {
        Self {
            voting_delay_secs: 60,
            voting_period_secs: 5 * 60,
            execution_delay_secs: 60,
            ..Self::reference()
        }
    }

    /// Whether both fractions are within `0..=100%`.
    pub fn is_valid(&self) -> bool {
        self.quorum_bps <= BPS_DENOMINATOR && self.approval_threshold_bps <= BPS_DENOMINATOR
    }
}

impl Default for GovernanceParams {
    fn default() -> Self {
        Self::reference()
    }
}

/// Token definition and initial treasury policy.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenParams {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    pub total_supply: TokenAmount,
    /// Share of total supply allocated to the treasury at genesis (basis points).
    pub treasury_bps: u32,
}

impl Default for TokenParams {
    fn default() -> Self {
        Self {
            name: "GitHub DAO Token".to_string(),
            symbol: "GDT".to_string(),
            decimals: crate::amount::TOKEN_DECIMALS as u8,
            total_supply: TokenAmount::from_tokens(1_000_000_000),
            treasury_bps: 1000, // 10%
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_policy_values() {
        let p = GovernanceParams::default();
        assert_eq!(p.min_proposal_power, TokenAmount::from_tokens(100_000));
        assert_eq!(p.voting_delay_secs, 86_400);
        assert_eq!(p.voting_period_secs, 259_200);
        assert_eq!(p.execution_delay_secs, 172_800);
        assert_eq!(p.quorum_bps, 400);
        assert_eq!(p.approval_threshold_bps, 5000);
        assert!(p.is_valid());
    }

    #[test]
    fn out_of_range_fraction_is_invalid() {
        let p = GovernanceParams {
            quorum_bps: 10_001,
            ..GovernanceParams::default()
        };
        assert!(!p.is_valid());
    }
}
