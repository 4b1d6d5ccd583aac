//! Versioned overlay over a durable store.
//!
//! Writes land in an in-memory pending layer and are visible to reads
//! immediately. `commit` flushes the layer to the base store in one batch;
//! `abort` drops it.

use crate::error::StorageError;
use crate::kv::{BatchOp, KeyValueStore};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;

pub struct VersionDb {
    base: Arc<dyn KeyValueStore>,
    /// `None` marks a pending delete
    pending: RwLock<BTreeMap<Vec<u8>, Option<Vec<u8>>>>,
}

impl VersionDb {
    pub fn new(base: Arc<dyn KeyValueStore>) -> Self {
        Self {
            base,
            pending: RwLock::new(BTreeMap::new()),
        }
    }

    /// Number of keys changed since the last commit or abort.
    pub fn pending_len(&self) -> usize {
        self.pending.read().len()
    }

    /// Flushes the pending layer to the base store. Returns the number of keys written.
    pub fn commit(&self) -> Result<usize, StorageError> {
        let mut pending = self.pending.write();
        let ops: Vec<BatchOp> = pending
            .iter()
            .map(|(key, value)| match value {
                Some(value) => BatchOp::Put {
                    key: key.clone(),
                    value: value.clone(),
                },
                None => BatchOp::Delete { key: key.clone() },
            })
            .collect();
        let count = ops.len();
        self.base.write_batch(ops)?;
        pending.clear();
        tracing::debug!("VersionDb: committed {} key(s)", count);
        Ok(count)
    }

    /// Drops the pending layer. Returns the number of discarded keys.
    pub fn abort(&self) -> usize {
        let mut pending = self.pending.write();
        let count = pending.len();
        pending.clear();
        tracing::debug!("VersionDb: aborted {} key(s)", count);
        count
    }
}

impl KeyValueStore for VersionDb {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StorageError> {
        if let Some(value) = self.pending.read().get(key) {
            return Ok(value.clone());
        }
        self.base.get(key)
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<(), StorageError> {
        self.pending
            .write()
            .insert(key.to_vec(), Some(value.to_vec()));
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> Result<(), StorageError> {
        self.pending.write().insert(key.to_vec(), None);
        Ok(())
    }

    fn write_batch(&self, ops: Vec<BatchOp>) -> Result<(), StorageError> {
        let mut pending = self.pending.write();
        for op in ops {
            match op {
                BatchOp::Put { key, value } => {
                    pending.insert(key, Some(value));
                }
                BatchOp::Delete { key } => {
                    pending.insert(key, None);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryDb;

    fn setup() -> (Arc<MemoryDb>, VersionDb) {
        let base = Arc::new(MemoryDb::new());
        let db = VersionDb::new(base.clone());
        (base, db)
    }

    #[test]
    fn test_pending_writes_are_readable() {
        let (base, db) = setup();
        db.put(b"k", b"v").unwrap();
        assert_eq!(db.get(b"k").unwrap(), Some(b"v".to_vec()));
        assert_eq!(base.get(b"k").unwrap(), None);
    }

    #[test]
    fn test_commit_flushes() {
        let (base, db) = setup();
        base.put(b"old", b"x").unwrap();
        db.put(b"k", b"v").unwrap();
        db.delete(b"old").unwrap();
        assert!(!db.has(b"old").unwrap());

        assert_eq!(db.commit().unwrap(), 2);
        assert_eq!(db.pending_len(), 0);
        assert_eq!(base.get(b"k").unwrap(), Some(b"v".to_vec()));
        assert_eq!(base.get(b"old").unwrap(), None);
    }

    #[test]
    fn test_abort_discards() {
        let (base, db) = setup();
        base.put(b"kept", b"1").unwrap();
        db.put(b"k", b"v").unwrap();
        db.delete(b"kept").unwrap();

        assert_eq!(db.abort(), 2);
        assert_eq!(db.get(b"k").unwrap(), None);
        assert_eq!(db.get(b"kept").unwrap(), Some(b"1".to_vec()));
        assert!(base.get(b"k").unwrap().is_none());
    }
}
