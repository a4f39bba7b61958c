//! Staking storage trait.

use crate::StoreError;

/// Store trait for staking pools and positions.
///
/// Uses opaque `Vec<u8>` so the store doesn't depend on the `gdao-staking`
/// crate. The staking engine serializes/deserializes its own types.
pub trait StakingStore {
    fn put_pool(&self, pool_id: u32, data: &[u8]) -> Result<(), StoreError>;
    fn iter_pools(&self) -> Result<Vec<(u32, Vec<u8>)>, StoreError>;

    fn put_position(&self, position_id: u64, data: &[u8]) -> Result<(), StoreError>;
    fn get_position(&self, position_id: u64) -> Result<Option<Vec<u8>>, StoreError>;
    fn delete_position(&self, position_id: u64) -> Result<(), StoreError>;
    fn iter_positions(&self) -> Result<Vec<(u64, Vec<u8>)>, StoreError>;
}
