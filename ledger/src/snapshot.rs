//! Ledger snapshots: the complete ledger state at a point in time.
//!
//! A snapshot carries a Blake2b-256 digest computed deterministically over
//! the state (not the creation time), so a restored node can check that the
//! file it loaded is the one that was written.

use serde::{Deserialize, Serialize};

use crate::hold::{Hold, HoldId};
use crate::ledger::TokenInfo;
use crate::error::LedgerError;
use gdao_types::{Address, Timestamp, TokenAmount};

pub const SNAPSHOT_VERSION: u32 = 1;

/// The full state of a [`crate::Ledger`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    /// Blake2b-256 over every field except `hash` and `created_at`.
    pub hash: [u8; 32],
    pub created_at: Timestamp,
    pub version: u32,
    pub token: TokenInfo,
    /// Balances ordered by address.
    pub accounts: Vec<(Address, TokenAmount)>,
    pub treasury: TokenAmount,
    pub total_staked: TokenAmount,
    pub total_minted: TokenAmount,
    pub genesis_issued: TokenAmount,
    pub holds: Vec<Hold>,
    pub next_hold_id: HoldId,
}

impl LedgerSnapshot {
    /// Fill in the digest.
    pub(crate) fn seal(mut self) -> Self {
        self.hash = self.compute_hash();
        self
    }

    fn compute_hash(&self) -> [u8; 32] {
        use blake2::digest::consts::U32;
        use blake2::{Blake2b, Digest};

        let mut hasher = Blake2b::<U32>::new();
        hasher.update(self.version.to_le_bytes());
        hasher.update(self.token.name.as_bytes());
        hasher.update(self.token.symbol.as_bytes());
        hasher.update([self.token.decimals]);
        hasher.update(self.token.total_supply.raw().to_le_bytes());
        hasher.update(self.token.circulating_supply.raw().to_le_bytes());
        for (address, balance) in &self.accounts {
            hasher.update((address.as_str().len() as u64).to_le_bytes());
            hasher.update(address.as_str().as_bytes());
            hasher.update(balance.raw().to_le_bytes());
        }
        hasher.update(self.treasury.raw().to_le_bytes());
        hasher.update(self.total_staked.raw().to_le_bytes());
        hasher.update(self.total_minted.raw().to_le_bytes());
        hasher.update(self.genesis_issued.raw().to_le_bytes());
        for hold in &self.holds {
            hasher.update(hold.id.to_le_bytes());
            hasher.update(hold.reference.as_bytes());
            hasher.update(hold.from.as_str().as_bytes());
            hasher.update(hold.to.as_str().as_bytes());
            hasher.update(hold.amount.raw().to_le_bytes());
            hasher.update(hold.placed_at.as_secs().to_le_bytes());
        }
        hasher.update(self.next_hold_id.to_le_bytes());

        let result = hasher.finalize();
        let mut out = [0u8; 32];
        out.copy_from_slice(&result);
        out
    }

    /// Whether the digest matches the contents.
    pub fn verify(&self) -> bool {
        self.version == SNAPSHOT_VERSION && self.hash == self.compute_hash()
    }

    /// Serialize the snapshot to bytes (bincode).
    pub fn to_bytes(&self) -> Result<Vec<u8>, LedgerError> {
        bincode::serialize(self).map_err(|e| LedgerError::Serialization(e.to_string()))
    }

    /// Deserialize a snapshot from bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, LedgerError> {
        bincode::deserialize(bytes).map_err(|e| LedgerError::Serialization(e.to_string()))
    }

    /// Hex form of the digest, for logs.
    pub fn digest_hex(&self) -> String {
        hex::encode(self.hash)
    }

    pub fn account_count(&self) -> usize {
        self.accounts.len()
    }
}
