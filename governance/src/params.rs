//! Governable parameters.
//!
//! Every field of [`GovernanceParams`] can be changed by an executed
//! `parameter_change` proposal, including the thresholds that govern
//! proposals themselves.

use crate::error::GovernanceError;
use gdao_types::{GovernanceParams, TokenAmount, BPS_DENOMINATOR};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A field of [`GovernanceParams`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GovernableParam {
    /// Applied in raw token units (10^-9 GDT); payloads carry it in tokens.
    MinProposalPower,
    VotingDelaySecs,
    VotingPeriodSecs,
    ExecutionDelaySecs,
    QuorumBps,
    ApprovalThresholdBps,
}

impl GovernableParam {
    pub const ALL: [GovernableParam; 6] = [
        Self::MinProposalPower,
        Self::VotingDelaySecs,
        Self::VotingPeriodSecs,
        Self::ExecutionDelaySecs,
        Self::QuorumBps,
        Self::ApprovalThresholdBps,
    ];

    /// Wire name of this parameter.
    pub fn name(&self) -> &'static str {
        match self {
            Self::MinProposalPower => "min_proposal_power",
            Self::VotingDelaySecs => "voting_delay_secs",
            Self::VotingPeriodSecs => "voting_period_secs",
            Self::ExecutionDelaySecs => "execution_delay_secs",
            Self::QuorumBps => "quorum_bps",
            Self::ApprovalThresholdBps => "approval_threshold_bps",
        }
    }

    /// Check that `value` is acceptable without changing anything.
    pub fn validate(&self, value: u128) -> Result<(), GovernanceError> {
        let ok = match self {
            Self::MinProposalPower => true,
            Self::VotingDelaySecs | Self::VotingPeriodSecs | Self::ExecutionDelaySecs => {
                u64::try_from(value).is_ok()
            }
            Self::QuorumBps | Self::ApprovalThresholdBps => value <= BPS_DENOMINATOR as u128,
        };
        if ok {
            Ok(())
        } else {
            Err(GovernanceError::InvalidParameterValue {
                parameter: self.name(),
                value,
            })
        }
    }

    /// Write `value` into the matching field of `params`.
    pub fn apply(
        &self,
        params: &mut GovernanceParams,
        value: u128,
    ) -> Result<(), GovernanceError> {
        self.validate(value)?;
        let invalid = || GovernanceError::InvalidParameterValue {
            parameter: self.name(),
            value,
        };
        match self {
            Self::MinProposalPower => params.min_proposal_power = TokenAmount::new(value),
            Self::VotingDelaySecs => {
                params.voting_delay_secs = u64::try_from(value).map_err(|_| invalid())?
            }
            Self::VotingPeriodSecs => {
                params.voting_period_secs = u64::try_from(value).map_err(|_| invalid())?
            }
            Self::ExecutionDelaySecs => {
                params.execution_delay_secs = u64::try_from(value).map_err(|_| invalid())?
            }
            Self::QuorumBps => params.quorum_bps = u32::try_from(value).map_err(|_| invalid())?,
            Self::ApprovalThresholdBps => {
                params.approval_threshold_bps = u32::try_from(value).map_err(|_| invalid())?
            }
        }
        Ok(())
    }
}

impl fmt::Display for GovernableParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for GovernableParam {
    type Err = GovernanceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.name() == s)
            .ok_or_else(|| GovernanceError::InvalidPayload(format!("unknown parameter {s:?}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_parse_back() {
        for param in GovernableParam::ALL {
            assert_eq!(param.name().parse::<GovernableParam>().unwrap(), param);
        }
        assert!("mint_rate".parse::<GovernableParam>().is_err());
    }

    #[test]
    fn apply_updates_the_named_field() {
        let mut params = GovernanceParams::default();
        GovernableParam::QuorumBps.apply(&mut params, 1000).unwrap();
        GovernableParam::VotingPeriodSecs.apply(&mut params, 7200).unwrap();
        assert_eq!(params.quorum_bps, 1000);
        assert_eq!(params.voting_period_secs, 7200);
    }

    #[test]
    fn proposal_power_is_applied_in_raw_units() {
        let mut params = GovernanceParams::default();
        let threshold = TokenAmount::from_tokens(50_000);
        GovernableParam::MinProposalPower
            .apply(&mut params, threshold.raw())
            .unwrap();
        assert_eq!(params.min_proposal_power, threshold);
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        let mut params = GovernanceParams::default();
        assert!(matches!(
            GovernableParam::ApprovalThresholdBps.apply(&mut params, 10_001),
            Err(GovernanceError::InvalidParameterValue { .. })
        ));
        assert!(GovernableParam::VotingDelaySecs
            .apply(&mut params, u64::MAX as u128 + 1)
            .is_err());
        assert_eq!(params, GovernanceParams::default());
    }
}
