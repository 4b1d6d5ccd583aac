//! One-time chain bootstrap from a genesis write-set document.

use crate::error::CoreError;
use mvm_storage::{BlockStore, SingletonStore, StateStore, StoreLayout, VersionDb};
use mvm_types::{Block, BlockHeader, GenesisState, Hash, Transaction, ValidationContext};
use std::sync::Arc;
use tracing::info;

/// The genesis block for `ctx`: height 0 with a single genesis transaction.
pub fn genesis_block(ctx: &ValidationContext) -> Block {
    Block::new(
        BlockHeader::new(Hash::ZERO, 0, 0),
        vec![Transaction::genesis(ctx)],
    )
}

/// Returns the last accepted block, initializing the database first if it
/// has never been initialized.
///
/// Initialization applies every genesis write-set entry, stores and accepts
/// the genesis block, then sets the initialized flag and flushes, all in one
/// commit. `genesis` may be empty for an empty initial state.
pub fn bootstrap(
    db: &Arc<VersionDb>,
    layout: &StoreLayout,
    ctx: &ValidationContext,
    genesis: &[u8],
) -> Result<Block, CoreError> {
    let singleton = SingletonStore::new(db.clone(), layout);
    let blocks = BlockStore::new(db.clone(), layout);

    if singleton.is_initialized()? {
        let id = blocks.last_accepted()?.ok_or_else(|| {
            CoreError::GenesisError("initialized database has no last accepted block".to_string())
        })?;
        let bytes = blocks.get_block(&id)?.ok_or(CoreError::BlockNotFound(id))?;
        let block = Block::from_bytes(&bytes)?;
        info!(block = %id, height = block.height(), "Resuming from last accepted block");
        return Ok(block);
    }

    let state = GenesisState::from_json(genesis)?;
    let store = StateStore::new(db.clone(), layout);
    let entries = state.entries()?;
    for (path, value) in &entries {
        store.put(path, value)?;
    }

    let block = genesis_block(ctx);
    for tx in &block.txs {
        tx.validate(ctx)?;
    }
    let id = block.id();
    blocks.put_block(&id, &block.to_bytes()?)?;
    blocks.set_last_accepted(&id)?;
    singleton.set_initialized()?;
    db.commit()?;

    info!(block = %id, write_sets = entries.len(), "Genesis block created");
    Ok(block)
}
