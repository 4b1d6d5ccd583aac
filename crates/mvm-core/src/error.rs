use mvm_types::{BlockId, Event, TxId};
use thiserror::Error;

/// Errors that can occur in core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Invalid block: {0}")]
    InvalidBlock(String),

    #[error("Invalid transaction: {0}")]
    InvalidTransaction(String),

    #[error("Empty block")]
    EmptyBlock,

    #[error("Block already decided: {0}")]
    BlockDecided(BlockId),

    #[error("Block not found: {0}")]
    BlockNotFound(BlockId),

    #[error("Parent block not found: {0}")]
    ParentBlockNotFound(BlockId),

    #[error("Invalid height: expected {expected}, got {actual}")]
    InvalidHeight { expected: u64, actual: u64 },

    #[error("Transaction {0} already issued")]
    DuplicateTransaction(TxId),

    #[error("No pending transactions")]
    NoPendingTransactions,

    #[error("execution failed (refer to events for details)")]
    ExecutionFailed,

    #[error("{0}")]
    DeployFailed(String),

    #[error("Genesis error: {0}")]
    GenesisError(String),

    #[error("Storage error: {0}")]
    Storage(#[from] mvm_storage::StorageError),

    #[error("VM error: {0}")]
    Vm(#[from] mvm_vm::VmError),

    #[error("Types error: {0}")]
    Types(#[from] mvm_types::TypesError),

    #[error("Credential error: {0}")]
    Crypto(#[from] mvm_crypto::CryptoError),
}

/// Failed transaction execution together with the events it produced.
#[derive(Debug, Error)]
#[error("{error}")]
pub struct TxFailure {
    pub events: Vec<Event>,
    #[source]
    pub error: CoreError,
}

impl TxFailure {
    pub fn new(events: Vec<Event>, error: impl Into<CoreError>) -> Self {
        Self {
            events,
            error: error.into(),
        }
    }
}
