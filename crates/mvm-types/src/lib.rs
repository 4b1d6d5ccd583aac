//! MVM Types - Core type definitions for the M-chain Move VM.
//!
//! This crate provides the fundamental types shared by every layer:
//! - Identifiers (32-byte blake3 hashes) and 20-byte Move addresses
//! - Transactions with a closed payload union and their script arguments
//! - Blocks and block status
//! - Access paths addressing the write-set store
//! - Events and transaction states
//! - The genesis write-set document

pub mod access_path;
pub mod address;
pub mod block;
pub mod error;
pub mod event;
pub mod genesis;
pub mod hash;
pub mod transaction;
pub mod tx_state;

mod serialization;

pub use access_path::AccessPath;
pub use address::Address;
pub use block::{Block, BlockHeader, BlockId, BlockStatus};
pub use error::TypesError;
pub use event::{Event, EventAttribute};
pub use genesis::{GenesisState, GenesisWriteSet};
pub use hash::Hash;
pub use transaction::{
    Credential, ScriptArg, Transaction, TxId, TxPayload, UnsignedTx, ValidationContext, VmTypeTag,
};
pub use tx_state::{TxState, TxStatus};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        AccessPath, Address, Block, BlockHeader, BlockId, BlockStatus, Credential, Event,
        EventAttribute, Hash, ScriptArg, Transaction, TxId, TxPayload, TxState, TxStatus,
        TypesError, UnsignedTx, ValidationContext,
    };
}
