//! VM facade used by the consensus layer and the node.

use crate::block::{ChainState, StatefulBlock};
use crate::error::CoreError;
use crate::genesis::bootstrap;
use crate::pipeline::CompiledItem;
use mvm_crypto::verify_credentials;
use mvm_storage::{KeyValueStore, StateStore, StoreLayout, VersionDb};
use mvm_types::{
    Address, Block, BlockHeader, BlockId, BlockStatus, Transaction, TxId, TxState,
    ValidationContext,
};
use mvm_vm::{ExecutionClient, Metadata};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info};

/// M-chain VM: mempool, block building and block lookup on top of
/// [`ChainState`].
pub struct Vm {
    state: ChainState,
    mempool: Mutex<VecDeque<Transaction>>,
}

impl Vm {
    /// Opens the chain on `db`, bootstrapping it from `genesis` on first use.
    pub fn new(
        ctx: ValidationContext,
        db: Arc<dyn KeyValueStore>,
        layout: &StoreLayout,
        client: ExecutionClient,
        genesis: &[u8],
    ) -> Result<Self, CoreError> {
        let db = Arc::new(VersionDb::new(db));
        let root = bootstrap(&db, layout, &ctx, genesis)?;
        info!(
            network_id = ctx.network_id,
            last_accepted = %root.id(),
            "VM initialized"
        );
        Ok(Self {
            state: ChainState::new(ctx, db, layout, client, &root),
            mempool: Mutex::new(VecDeque::new()),
        })
    }

    pub fn state(&self) -> &ChainState {
        &self.state
    }

    /// Write-set store over the pending overlay, as read by the engine.
    pub fn state_store(&self) -> Arc<StateStore> {
        self.state.store().clone()
    }

    /// Validates `tx` and queues it for the next block.
    pub fn issue_tx(&self, tx: Transaction) -> Result<TxId, CoreError> {
        let id = tx.id();
        if let Some(existing) = self.state.tx_storage().get_tx_state(&id)? {
            debug!(tx = %id, status = %existing.status, "Transaction already known");
            return Err(CoreError::DuplicateTransaction(id));
        }
        tx.validate(self.state.ctx())?;
        verify_credentials(&tx)?;

        let mut mempool = self.mempool.lock();
        if mempool.iter().any(|pending| pending.id() == id) {
            return Err(CoreError::DuplicateTransaction(id));
        }
        mempool.push_back(tx);
        debug!(tx = %id, pending = mempool.len(), "Transaction issued");
        Ok(id)
    }

    pub fn pending_txs(&self) -> usize {
        self.mempool.lock().len()
    }

    /// Builds a block with the oldest pending transaction on top of the
    /// preferred block.
    pub fn build_block(&self) -> Result<StatefulBlock, CoreError> {
        let tx = self
            .mempool
            .lock()
            .pop_front()
            .ok_or(CoreError::NoPendingTransactions)?;

        let (parent, parent_height) = {
            let chain = self.state.chain().read();
            let parent = chain.preferred();
            let height = chain.height(&parent).ok_or(CoreError::BlockNotFound(parent))?;
            (parent, height)
        };

        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        let block = Block::new(BlockHeader::new(parent, parent_height + 1, timestamp), vec![tx]);
        let block = StatefulBlock::new(block);
        info!(block = %block.id(), height = block.height(), "Block built");
        Ok(block)
    }

    pub fn parse_block(&self, bytes: &[u8]) -> Result<StatefulBlock, CoreError> {
        let block = Block::from_bytes(bytes)?;
        let status = self.block_status(&block.id(), block.height())?;
        Ok(StatefulBlock::with_status(block, status))
    }

    pub fn get_block(&self, id: &BlockId) -> Result<StatefulBlock, CoreError> {
        let bytes = self
            .state
            .blocks()
            .get_block(id)?
            .ok_or(CoreError::BlockNotFound(*id))?;
        self.parse_block(&bytes)
    }

    /// Status known to the in-memory chain, or derived from storage for
    /// blocks decided before the last restart.
    fn block_status(&self, id: &BlockId, height: u64) -> Result<BlockStatus, CoreError> {
        let chain = self.state.chain().read();
        if let Some(status) = chain.status(id) {
            return Ok(status);
        }
        let last_accepted_height = chain.height(&chain.last_accepted()).unwrap_or(0);
        drop(chain);

        let stored = self.state.blocks().get_block(id)?.is_some();
        if stored && height <= last_accepted_height {
            Ok(BlockStatus::Accepted)
        } else {
            Ok(BlockStatus::Processing)
        }
    }

    pub async fn verify_block(&self, block: &mut StatefulBlock) -> Result<(), CoreError> {
        block.verify(&self.state).await
    }

    pub async fn accept_block(&self, block: &mut StatefulBlock) -> Result<(), CoreError> {
        block.accept(&self.state).await
    }

    pub async fn reject_block(&self, block: &mut StatefulBlock) {
        block.reject(&self.state).await
    }

    pub fn set_preference(&self, id: BlockId) -> Result<(), CoreError> {
        self.state.chain().write().set_preference(id)
    }

    pub fn last_accepted(&self) -> BlockId {
        self.state.chain().read().last_accepted()
    }

    pub fn preferred(&self) -> BlockId {
        self.state.chain().read().preferred()
    }

    pub fn get_tx_state(&self, id: &TxId) -> Result<Option<TxState>, CoreError> {
        self.state.tx_storage().get_tx_state(id)
    }

    pub async fn compile(
        &self,
        sender: Address,
        source: &str,
    ) -> Result<Vec<CompiledItem>, CoreError> {
        self.state.pipeline().compile(sender, source).await
    }

    pub async fn get_metadata(&self, code: Vec<u8>) -> Result<Metadata, CoreError> {
        self.state.pipeline().get_metadata(code).await
    }
}
