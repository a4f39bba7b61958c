//! Governance storage trait.

use crate::StoreError;
use gdao_types::Address;

/// Trait for storing governance state (proposals and votes).
pub trait GovernanceStore {
    /// Store (insert or replace) a proposal.
    fn put_proposal(&self, id: u64, data: &[u8]) -> Result<(), StoreError>;

    /// Get a proposal by id.
    fn get_proposal(&self, id: u64) -> Result<Option<Vec<u8>>, StoreError>;

    /// All stored proposals, ordered by id.
    fn iter_proposals(&self) -> Result<Vec<(u64, Vec<u8>)>, StoreError>;

    /// Store a vote. Must fail with [`StoreError::Duplicate`] when the voter
    /// already has a vote on this proposal.
    fn put_vote(&self, proposal: u64, voter: &Address, data: &[u8]) -> Result<(), StoreError>;

    /// Whether the voter has a stored vote on the proposal.
    fn has_vote(&self, proposal: u64, voter: &Address) -> Result<bool, StoreError>;

    /// All votes for a proposal, in insertion order.
    fn get_votes(&self, proposal: u64) -> Result<Vec<Vec<u8>>, StoreError>;
}
