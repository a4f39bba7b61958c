//! Account storage trait.

use crate::StoreError;
use gdao_types::Address;

/// Trait for account balance records.
///
/// Record bytes are opaque here; the ledger serializes its own types.
pub trait AccountStore {
    fn get_account(&self, address: &Address) -> Result<Option<Vec<u8>>, StoreError>;
    fn put_account(&self, address: &Address, data: &[u8]) -> Result<(), StoreError>;
    fn iter_accounts(&self) -> Result<Vec<(Address, Vec<u8>)>, StoreError>;

    /// Number of stored accounts.
    fn account_count(&self) -> Result<u64, StoreError> {
        self.iter_accounts().map(|v| v.len() as u64)
    }
}
