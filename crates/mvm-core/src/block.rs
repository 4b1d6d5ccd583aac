//! Block state machine.
//!
//! A block is verified by executing its transactions, in order, against the
//! shared pending overlay. Either every transaction succeeds and the
//! overlay is flushed, or the first failure (in execution or in persisting
//! the results) rejects the block and discards the overlay.

use crate::chain::Chain;
use crate::error::CoreError;
use crate::pipeline::TransactionPipeline;
use crate::tx_storage::TxStorage;
use mvm_crypto::verify_credentials;
use mvm_storage::{BlockStore, StateStore, StoreLayout, VersionDb};
use mvm_types::{Block, BlockId, BlockStatus, Event, ValidationContext};
use mvm_vm::ExecutionClient;
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Everything a block needs to verify, accept or reject itself.
pub struct ChainState {
    ctx: ValidationContext,
    db: Arc<VersionDb>,
    store: Arc<StateStore>,
    pipeline: TransactionPipeline,
    tx_storage: TxStorage,
    blocks: BlockStore,
    chain: RwLock<Chain>,
    verify_lock: tokio::sync::Mutex<()>,
}

impl ChainState {
    /// `root` must be the last accepted block already stored in `db`.
    pub fn new(
        ctx: ValidationContext,
        db: Arc<VersionDb>,
        layout: &StoreLayout,
        client: ExecutionClient,
        root: &Block,
    ) -> Self {
        let store = Arc::new(StateStore::new(db.clone(), layout));
        Self {
            ctx,
            pipeline: TransactionPipeline::new(client, store.clone()),
            tx_storage: TxStorage::new(db.clone(), layout),
            blocks: BlockStore::new(db.clone(), layout),
            chain: RwLock::new(Chain::new(root)),
            verify_lock: tokio::sync::Mutex::new(()),
            store,
            db,
        }
    }

    pub fn ctx(&self) -> &ValidationContext {
        &self.ctx
    }

    pub fn db(&self) -> &Arc<VersionDb> {
        &self.db
    }

    pub fn store(&self) -> &Arc<StateStore> {
        &self.store
    }

    pub fn pipeline(&self) -> &TransactionPipeline {
        &self.pipeline
    }

    pub fn tx_storage(&self) -> &TxStorage {
        &self.tx_storage
    }

    pub fn blocks(&self) -> &BlockStore {
        &self.blocks
    }

    pub fn chain(&self) -> &RwLock<Chain> {
        &self.chain
    }
}

/// A block together with its consensus status.
#[derive(Debug, Clone)]
pub struct StatefulBlock {
    block: Block,
    id: BlockId,
    status: BlockStatus,
}

impl StatefulBlock {
    pub fn new(block: Block) -> Self {
        Self::with_status(block, BlockStatus::Processing)
    }

    pub fn with_status(block: Block, status: BlockStatus) -> Self {
        let id = block.id();
        Self { block, id, status }
    }

    pub fn id(&self) -> BlockId {
        self.id
    }

    pub fn parent(&self) -> BlockId {
        self.block.parent()
    }

    pub fn height(&self) -> u64 {
        self.block.height()
    }

    pub fn status(&self) -> BlockStatus {
        self.status
    }

    pub fn block(&self) -> &Block {
        &self.block
    }

    pub fn bytes(&self) -> Result<Vec<u8>, CoreError> {
        Ok(self.block.to_bytes()?)
    }

    /// Checks, executes and persists the block.
    pub async fn verify(&mut self, state: &ChainState) -> Result<(), CoreError> {
        let _guard = state.verify_lock.lock().await;

        if let Err(e) = self.validate(state) {
            error!(block = %self.id, "Block validation failed: {}", e);
            return Err(e);
        }

        let height = self.block.height();
        let mut executed = Vec::with_capacity(self.block.txs.len());
        let mut failed = None;
        for (idx, tx) in self.block.txs.iter().enumerate() {
            match state.pipeline.execute_tx(tx, height).await {
                Ok(events) => {
                    info!(block = %self.id, tx = %tx.id(), "Transaction executed");
                    executed.push(events);
                }
                Err(failure) => {
                    info!(
                        block = %self.id,
                        tx = %tx.id(),
                        "Transaction [{}] failed: {}", idx, failure.error
                    );
                    state
                        .tx_storage
                        .put_dropped_tx(tx, failure.events, &failure.error.to_string());
                    failed = Some(failure.error);
                    break;
                }
            }
        }
        if let Some(err) = failed {
            self.discard(state);
            return Err(err);
        }

        let flushed = match self.persist(state, executed) {
            Ok(flushed) => flushed,
            Err(e) => {
                error!(block = %self.id, "Block persistence failed: {}", e);
                self.discard(state);
                return Err(e);
            }
        };
        state.chain.write().add_verified(&self.block);

        info!(block = %self.id, height, txs = self.block.txs.len(), flushed, "Block verified");
        Ok(())
    }

    /// Records every transaction as committed, stores the block and flushes
    /// the overlay.
    fn persist(
        &self,
        state: &ChainState,
        executed: Vec<Vec<Event>>,
    ) -> Result<usize, CoreError> {
        for (tx, events) in self.block.txs.iter().zip(executed) {
            state.tx_storage.put_committed_tx(tx, events)?;
        }
        state.blocks.put_block(&self.id, &self.block.to_bytes()?)?;
        Ok(state.db.commit()?)
    }

    /// Rejects the block from inside `verify`, dropping the writes of its
    /// partial execution.
    fn discard(&mut self, state: &ChainState) {
        let discarded = state.db.abort();
        self.mark_rejected(state);
        debug!(block = %self.id, discarded, "Block discarded");
    }

    fn mark_rejected(&mut self, state: &ChainState) {
        self.status = BlockStatus::Rejected;
        state.chain.write().reject(self.id);
    }

    fn validate(&self, state: &ChainState) -> Result<(), CoreError> {
        if self.status.is_decided() {
            return Err(CoreError::BlockDecided(self.id));
        }
        state.chain.read().check_block(&self.block)?;

        if self.block.txs.is_empty() {
            return Err(CoreError::EmptyBlock);
        }
        self.block.check_genesis_placement()?;

        for (idx, tx) in self.block.txs.iter().enumerate() {
            tx.validate(&state.ctx).map_err(|e| {
                CoreError::InvalidTransaction(format!("tx [{}]: validation: {}", idx, e))
            })?;
            verify_credentials(tx).map_err(|e| {
                CoreError::InvalidTransaction(format!("tx [{}]: {}", idx, e))
            })?;
        }
        Ok(())
    }

    /// Marks the block accepted and persists the new last accepted id.
    /// Waits for any in-flight verification.
    pub async fn accept(&mut self, state: &ChainState) -> Result<(), CoreError> {
        let _guard = state.verify_lock.lock().await;

        if state.chain.read().status(&self.id).is_none() {
            return Err(CoreError::BlockNotFound(self.id));
        }
        let persisted = state
            .blocks
            .set_last_accepted(&self.id)
            .and_then(|_| state.db.commit());
        if let Err(e) = persisted {
            state.db.abort();
            return Err(e.into());
        }
        state.chain.write().accept(self.id)?;

        self.status = BlockStatus::Accepted;
        info!(block = %self.id, height = self.block.height(), "Block accepted");
        Ok(())
    }

    /// Marks the block rejected. Writes a verified block already flushed
    /// stay in place; waits for any in-flight verification.
    pub async fn reject(&mut self, state: &ChainState) {
        let _guard = state.verify_lock.lock().await;
        self.mark_rejected(state);
        debug!(block = %self.id, "Block rejected");
    }
}

impl fmt::Display for StatefulBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.block)?;
        writeln!(f, "Status:    {}", self.status)
    }
}
