//! In-memory backend.

use crate::error::StorageError;
use crate::kv::{BatchOp, KeyValueStore};
use parking_lot::RwLock;
use std::collections::BTreeMap;

#[derive(Default)]
pub struct MemoryDb {
    data: RwLock<BTreeMap<Vec<u8>, Vec<u8>>>,
}

impl MemoryDb {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }
}

impl KeyValueStore for MemoryDb {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(self.data.read().get(key).cloned())
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<(), StorageError> {
        self.data.write().insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> Result<(), StorageError> {
        self.data.write().remove(key);
        Ok(())
    }

    fn write_batch(&self, ops: Vec<BatchOp>) -> Result<(), StorageError> {
        let mut data = self.data.write();
        for op in ops {
            match op {
                BatchOp::Put { key, value } => {
                    data.insert(key, value);
                }
                BatchOp::Delete { key } => {
                    data.remove(&key);
                }
            }
        }
        Ok(())
    }
}
