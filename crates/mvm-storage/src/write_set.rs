//! Write-set store: Move resources and modules keyed by access path.

use crate::error::StorageError;
use crate::kv::KeyValueStore;
use crate::layout::StoreLayout;
use crate::prefix::PrefixDb;
use mvm_types::access_path::write_set_key;
use mvm_types::AccessPath;
use std::sync::Arc;

pub struct StateStore {
    db: PrefixDb,
}

impl StateStore {
    pub fn new(db: Arc<dyn KeyValueStore>, layout: &StoreLayout) -> Self {
        Self {
            db: PrefixDb::new(&layout.write_sets, db),
        }
    }

    pub fn put(&self, path: &AccessPath, value: &[u8]) -> Result<(), StorageError> {
        self.db.put(&path.storage_key(), value)?;
        tracing::debug!("WriteSet {}: created/updated", path);
        Ok(())
    }

    pub fn delete(&self, path: &AccessPath) -> Result<(), StorageError> {
        self.db.delete(&path.storage_key())?;
        tracing::debug!("WriteSet {}: removed", path);
        Ok(())
    }

    pub fn has(&self, path: &AccessPath) -> Result<bool, StorageError> {
        self.db.has(&path.storage_key())
    }

    /// Value at `path`, or [`StorageError::NotFound`].
    pub fn get(&self, path: &AccessPath) -> Result<Vec<u8>, StorageError> {
        let value = self
            .db
            .get(&path.storage_key())?
            .ok_or_else(|| StorageError::NotFound(format!("writeSet {}", path)))?;
        tracing::debug!("WriteSet {}: read", path);
        Ok(value)
    }

    /// Read for an optional path. A missing path reads nothing.
    pub fn read(&self, path: Option<&AccessPath>) -> Result<Option<Vec<u8>>, StorageError> {
        match write_set_key(path) {
            Some(key) => self.db.get(&key),
            None => Ok(None),
        }
    }
}
