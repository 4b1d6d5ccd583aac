//! MVM Core - block execution for the M-chain.
//!
//! Blocks are verified by running every transaction through the remote
//! execution engine and applying the resulting write-sets to a versioned
//! overlay that is flushed only when the whole block succeeds.

pub mod block;
pub mod chain;
pub mod error;
pub mod genesis;
pub mod pipeline;
pub mod tx_storage;
pub mod vm;

pub use block::{ChainState, StatefulBlock};
pub use chain::Chain;
pub use error::{CoreError, TxFailure};
pub use genesis::{bootstrap, genesis_block};
pub use pipeline::{CodeType, CompiledItem, TransactionPipeline};
pub use tx_storage::{TxStorage, DROPPED_TX_CACHE_SIZE};
pub use vm::Vm;
