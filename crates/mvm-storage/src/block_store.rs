//! Block Store - verified blocks and the last accepted pointer

use crate::error::StorageError;
use crate::kv::KeyValueStore;
use crate::layout::StoreLayout;
use crate::prefix::PrefixDb;
use mvm_types::{BlockId, Hash};
use std::sync::Arc;

pub struct BlockStore {
    db: PrefixDb,
    last_accepted_key: Vec<u8>,
}

impl BlockStore {
    pub fn new(db: Arc<dyn KeyValueStore>, layout: &StoreLayout) -> Self {
        Self {
            db: PrefixDb::new(&layout.blocks, db),
            last_accepted_key: layout.last_accepted_key.as_bytes().to_vec(),
        }
    }

    pub fn put_block(&self, id: &BlockId, bytes: &[u8]) -> Result<(), StorageError> {
        self.db.put(id.as_bytes(), bytes)?;
        tracing::debug!("Block {} saved", id);
        Ok(())
    }

    pub fn get_block(&self, id: &BlockId) -> Result<Option<Vec<u8>>, StorageError> {
        self.db.get(id.as_bytes())
    }

    pub fn set_last_accepted(&self, id: &BlockId) -> Result<(), StorageError> {
        self.db.put(&self.last_accepted_key, id.as_bytes())
    }

    pub fn last_accepted(&self) -> Result<Option<BlockId>, StorageError> {
        match self.db.get(&self.last_accepted_key)? {
            Some(bytes) => Ok(Some(Hash::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }
}
