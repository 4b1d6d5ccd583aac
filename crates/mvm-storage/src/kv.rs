use crate::error::StorageError;

/// Single mutation applied by [`KeyValueStore::write_batch`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BatchOp {
    Put { key: Vec<u8>, value: Vec<u8> },
    Delete { key: Vec<u8> },
}

/// Ordered byte store.
///
/// Implementations must be safe for concurrent readers and writers;
/// `write_batch` applies all operations or none.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StorageError>;

    fn put(&self, key: &[u8], value: &[u8]) -> Result<(), StorageError>;

    fn delete(&self, key: &[u8]) -> Result<(), StorageError>;

    fn has(&self, key: &[u8]) -> Result<bool, StorageError> {
        Ok(self.get(key)?.is_some())
    }

    fn write_batch(&self, ops: Vec<BatchOp>) -> Result<(), StorageError>;
}
