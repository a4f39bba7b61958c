//! Metadata storage trait.

use crate::StoreError;

/// Generic key-value store for engine bookkeeping that doesn't belong in any
/// entity table (id counters, supply totals, policy).
pub trait MetaStore {
    fn put_meta(&self, key: &str, value: &[u8]) -> Result<(), StoreError>;
    fn get_meta(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;
    fn delete_meta(&self, key: &str) -> Result<(), StoreError>;

    /// Schema version of the stored records, 0 when unset.
    fn get_schema_version(&self) -> Result<u32, StoreError> {
        match self.get_meta("schema_version")? {
            Some(bytes) => {
                let raw: [u8; 4] = bytes
                    .as_slice()
                    .try_into()
                    .map_err(|_| StoreError::Corruption("schema_version".into()))?;
                Ok(u32::from_be_bytes(raw))
            }
            None => Ok(0),
        }
    }

    fn set_schema_version(&self, version: u32) -> Result<(), StoreError> {
        self.put_meta("schema_version", &version.to_be_bytes())
    }
}
