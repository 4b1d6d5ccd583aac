use crate::error::StorageError;
use crate::kv::KeyValueStore;
use crate::layout::StoreLayout;
use crate::prefix::PrefixDb;
use std::sync::Arc;

/// Chain-wide flags, currently only "genesis applied".
pub struct SingletonStore {
    db: PrefixDb,
    initialized_key: Vec<u8>,
}

impl SingletonStore {
    pub fn new(db: Arc<dyn KeyValueStore>, layout: &StoreLayout) -> Self {
        Self {
            db: PrefixDb::new(&layout.singleton, db),
            initialized_key: layout.initialized_key.as_bytes().to_vec(),
        }
    }

    pub fn is_initialized(&self) -> Result<bool, StorageError> {
        self.db.has(&self.initialized_key)
    }

    pub fn set_initialized(&self) -> Result<(), StorageError> {
        self.db.put(&self.initialized_key, &[1])
    }
}
