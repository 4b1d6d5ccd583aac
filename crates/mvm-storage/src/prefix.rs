use crate::error::StorageError;
use crate::kv::{BatchOp, KeyValueStore};
use std::sync::Arc;

/// Isolated namespace inside a shared store.
///
/// Keys are stored as `blake3(name) ‖ key`, so distinct names never share a key.
pub struct PrefixDb {
    name: String,
    prefix: [u8; 32],
    db: Arc<dyn KeyValueStore>,
}

impl PrefixDb {
    pub fn new(name: &str, db: Arc<dyn KeyValueStore>) -> Self {
        Self {
            name: name.to_string(),
            prefix: *blake3::hash(name.as_bytes()).as_bytes(),
            db,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn prefixed(&self, key: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.prefix.len() + key.len());
        out.extend_from_slice(&self.prefix);
        out.extend_from_slice(key);
        out
    }
}

impl KeyValueStore for PrefixDb {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StorageError> {
        self.db.get(&self.prefixed(key))
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<(), StorageError> {
        self.db.put(&self.prefixed(key), value)
    }

    fn delete(&self, key: &[u8]) -> Result<(), StorageError> {
        self.db.delete(&self.prefixed(key))
    }

    fn has(&self, key: &[u8]) -> Result<bool, StorageError> {
        self.db.has(&self.prefixed(key))
    }

    fn write_batch(&self, ops: Vec<BatchOp>) -> Result<(), StorageError> {
        let ops = ops
            .into_iter()
            .map(|op| match op {
                BatchOp::Put { key, value } => BatchOp::Put {
                    key: self.prefixed(&key),
                    value,
                },
                BatchOp::Delete { key } => BatchOp::Delete {
                    key: self.prefixed(&key),
                },
            })
            .collect();
        self.db.write_batch(ops)
    }
}
