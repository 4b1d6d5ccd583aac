//! Transaction outcome storage.

use crate::error::CoreError;
use lru::LruCache;
use mvm_storage::{KeyValueStore, PrefixDb, StoreLayout};
use mvm_types::{Event, Transaction, TxId, TxState};
use parking_lot::Mutex;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tracing::debug;

/// Dropped transactions kept in memory.
pub const DROPPED_TX_CACHE_SIZE: usize = 2048;

/// Committed transactions are stored durably; dropped ones only live in a
/// bounded LRU cache.
pub struct TxStorage {
    db: PrefixDb,
    dropped: Mutex<LruCache<TxId, TxState>>,
}

impl TxStorage {
    pub fn new(db: Arc<dyn KeyValueStore>, layout: &StoreLayout) -> Self {
        Self::with_cache_size(db, layout, DROPPED_TX_CACHE_SIZE)
    }

    pub fn with_cache_size(
        db: Arc<dyn KeyValueStore>,
        layout: &StoreLayout,
        cache_size: usize,
    ) -> Self {
        let cap = NonZeroUsize::new(cache_size).unwrap_or(NonZeroUsize::MIN);
        Self {
            db: PrefixDb::new(&layout.txs, db),
            dropped: Mutex::new(LruCache::new(cap)),
        }
    }

    pub fn put_committed_tx(&self, tx: &Transaction, events: Vec<Event>) -> Result<(), CoreError> {
        let id = tx.id();
        let state = TxState::committed(tx.clone(), events);
        self.db.put(id.as_bytes(), &state.to_bytes()?)?;
        debug!(tx = %id.short(), "Transaction committed");
        Ok(())
    }

    pub fn put_dropped_tx(&self, tx: &Transaction, events: Vec<Event>, error: &str) {
        let id = tx.id();
        self.dropped
            .lock()
            .put(id, TxState::dropped(tx.clone(), events, error));
        debug!(tx = %id.short(), error, "Transaction dropped");
    }

    /// Cache first, then the durable store. `None` if neither knows the id.
    pub fn get_tx_state(&self, id: &TxId) -> Result<Option<TxState>, CoreError> {
        if let Some(state) = self.dropped.lock().get(id) {
            return Ok(Some(state.clone()));
        }
        match self.db.get(id.as_bytes())? {
            Some(bytes) => Ok(Some(TxState::from_bytes(&bytes)?)),
            None => Ok(None),
        }
    }

    pub fn contains(&self, id: &TxId) -> Result<bool, CoreError> {
        if self.dropped.lock().contains(id) {
            return Ok(true);
        }
        Ok(self.db.has(id.as_bytes())?)
    }
}
