//! Genesis: the initial distribution of the token supply.
//!
//! At genesis the treasury receives `treasury_bps` of total supply and the
//! configured allocations are credited to their accounts. Everything else
//! stays unissued.

use crate::error::LedgerError;
use gdao_types::{Address, TokenAmount, TokenParams, BPS_DENOMINATOR};
use serde::{Deserialize, Serialize};

/// An initial balance credited at genesis.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocation {
    pub address: Address,
    pub amount: TokenAmount,
}

/// Configuration for creating a fresh ledger.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisConfig {
    #[serde(default)]
    pub token: TokenParams,
    #[serde(default)]
    pub allocations: Vec<Allocation>,
}

impl GenesisConfig {
    pub fn new(token: TokenParams) -> Self {
        Self {
            token,
            allocations: Vec::new(),
        }
    }

    /// Add an initial balance.
    pub fn with_allocation(mut self, address: impl Into<Address>, amount: TokenAmount) -> Self {
        self.allocations.push(Allocation {
            address: address.into(),
            amount,
        });
        self
    }

    /// The treasury's share of total supply.
    pub fn treasury_allocation(&self) -> Result<TokenAmount, LedgerError> {
        if self.token.treasury_bps > BPS_DENOMINATOR {
            return Err(LedgerError::InvalidTreasuryShare(self.token.treasury_bps));
        }
        self.token
            .total_supply
            .checked_mul_bps(self.token.treasury_bps)
            .ok_or(LedgerError::Overflow)
    }

    /// Check that every allocation is well-formed and that together they fit
    /// into the supply left after the treasury. Returns the allocated total.
    pub fn validate(&self) -> Result<TokenAmount, LedgerError> {
        let treasury = self.treasury_allocation()?;
        for allocation in &self.allocations {
            if !allocation.address.is_valid() {
                return Err(LedgerError::InvalidAddress(allocation.address.clone()));
            }
        }
        let requested = TokenAmount::checked_sum(self.allocations.iter().map(|a| a.amount))
            .ok_or(LedgerError::Overflow)?;
        let available = self.token.total_supply.saturating_sub(treasury);
        if requested > available {
            return Err(LedgerError::GenesisExceedsSupply {
                requested,
                available,
            });
        }
        Ok(requested)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_treasury_is_ten_percent() {
        let config = GenesisConfig::default();
        assert_eq!(
            config.treasury_allocation().unwrap(),
            TokenAmount::from_tokens(100_000_000)
        );
    }

    #[test]
    fn allocations_must_fit_after_treasury() {
        let token = TokenParams {
            total_supply: TokenAmount::from_tokens(1000),
            ..TokenParams::default()
        };
        let ok =
            GenesisConfig::new(token.clone()).with_allocation("a", TokenAmount::from_tokens(900));
        assert_eq!(ok.validate().unwrap(), TokenAmount::from_tokens(900));

        let too_much =
            GenesisConfig::new(token).with_allocation("a", TokenAmount::from_tokens(901));
        assert!(matches!(
            too_much.validate(),
            Err(LedgerError::GenesisExceedsSupply { .. })
        ));
    }

    #[test]
    fn treasury_share_above_whole_is_rejected() {
        let token = TokenParams {
            treasury_bps: 10_001,
            ..TokenParams::default()
        };
        assert!(matches!(
            GenesisConfig::new(token).validate(),
            Err(LedgerError::InvalidTreasuryShare(10_001))
        ));
    }

    #[test]
    fn blank_allocation_address_is_rejected() {
        let config = GenesisConfig::default().with_allocation("", TokenAmount::from_tokens(1));
        assert!(matches!(config.validate(), Err(LedgerError::InvalidAddress(_))));
    }
}
