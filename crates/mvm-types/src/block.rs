use crate::error::TypesError;
use crate::hash::Hash;
use crate::serialization::{decode, digest, encode};
use crate::transaction::{Transaction, TxPayload};
use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Block identifier: blake3 over the encoded block.
pub type BlockId = Hash;

/// Consensus status of a block.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
pub enum BlockStatus {
    Processing,
    Accepted,
    Rejected,
}

impl BlockStatus {
    pub fn is_decided(&self) -> bool {
        !matches!(self, BlockStatus::Processing)
    }
}

impl fmt::Display for BlockStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BlockStatus::Processing => "Processing",
            BlockStatus::Accepted => "Accepted",
            BlockStatus::Rejected => "Rejected",
        };
        f.write_str(s)
    }
}

/// Block header: ancestry and height.
#[derive(
    Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
pub struct BlockHeader {
    /// Id of the parent block (zero for genesis)
    pub parent: BlockId,
    /// Block height, genesis is 0
    pub height: u64,
    /// Unix timestamp (seconds)
    pub timestamp: u64,
}

impl BlockHeader {
    pub fn new(parent: BlockId, height: u64, timestamp: u64) -> Self {
        Self {
            parent,
            height,
            timestamp,
        }
    }

    pub fn is_genesis(&self) -> bool {
        self.height == 0
    }
}

/// Block data: header plus the ordered transaction batch.
#[derive(
    Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
pub struct Block {
    pub header: BlockHeader,
    pub txs: Vec<Transaction>,
}

impl Block {
    pub fn new(header: BlockHeader, txs: Vec<Transaction>) -> Self {
        Self { header, txs }
    }

    pub fn id(&self) -> BlockId {
        digest(self)
    }

    pub fn parent(&self) -> BlockId {
        self.header.parent
    }

    pub fn height(&self) -> u64 {
        self.header.height
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, TypesError> {
        encode(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, TypesError> {
        decode(bytes)
    }

    /// Genesis markers may only appear at height 0.
    pub fn check_genesis_placement(&self) -> Result<(), TypesError> {
        if self.header.is_genesis() {
            return Ok(());
        }
        if self
            .txs
            .iter()
            .any(|tx| matches!(tx.payload(), TxPayload::GenesisInit))
        {
            return Err(TypesError::GenesisOutsideGenesisBlock(self.header.height));
        }
        Ok(())
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f)?;
        writeln!(f, "ID:        {}", self.id())?;
        writeln!(f, "Parent ID: {}", self.header.parent)?;
        writeln!(f, "Height:    {}", self.header.height)?;
        writeln!(f, "TXs:")?;
        for (idx, tx) in self.txs.iter().enumerate() {
            writeln!(f, "- [{}] {}", idx, tx)?;
            writeln!(f, "  Creds: {}", tx.credentials.len())?;
            if let Ok(bytes) = tx.unsigned.to_bytes() {
                writeln!(f, "  Unsigned bytes: 0x{}", hex::encode(bytes))?;
            }
        }
        Ok(())
    }
}
