use crate::error::TypesError;
use crate::event::Event;
use crate::serialization::{decode, encode};
use crate::transaction::Transaction;
use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of a transaction. Leaves `Processing` exactly once.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
pub enum TxStatus {
    Processing,
    Dropped,
    Committed,
}

impl TxStatus {
    pub fn can_transition_to(&self, next: TxStatus) -> bool {
        matches!(
            (self, next),
            (TxStatus::Processing, TxStatus::Dropped) | (TxStatus::Processing, TxStatus::Committed)
        )
    }
}

impl fmt::Display for TxStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TxStatus::Processing => "Processing",
            TxStatus::Dropped => "Dropped",
            TxStatus::Committed => "Committed",
        };
        f.write_str(s)
    }
}

/// Stored outcome of a transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct TxState {
    pub tx: Transaction,
    pub status: TxStatus,
    pub error: Option<String>,
    pub events: Vec<Event>,
}

impl TxState {
    pub fn committed(tx: Transaction, events: Vec<Event>) -> Self {
        Self {
            tx,
            status: TxStatus::Committed,
            error: None,
            events,
        }
    }

    pub fn dropped(tx: Transaction, events: Vec<Event>, error: impl Into<String>) -> Self {
        Self {
            tx,
            status: TxStatus::Dropped,
            error: Some(error.into()),
            events,
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, TypesError> {
        encode(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, TypesError> {
        decode(bytes)
    }
}
