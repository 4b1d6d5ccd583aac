use crate::access_path::AccessPath;
use crate::address::Address;
use crate::error::TypesError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Genesis document: the initial write-set of the chain.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisState {
    #[serde(rename = "write_set", default)]
    pub write_sets: Vec<GenesisWriteSet>,
}

/// One genesis value, hex encoded.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisWriteSet {
    pub address: String,
    pub path: String,
    pub value: String,
}

impl fmt::Display for GenesisWriteSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.address, self.path)
    }
}

impl GenesisWriteSet {
    pub fn validate(&self) -> Result<(), TypesError> {
        if self.address.is_empty() {
            return Err(TypesError::InvalidGenesis(format!("{}: address: empty", self)));
        }
        if self.path.is_empty() {
            return Err(TypesError::InvalidGenesis(format!("{}: path: empty", self)));
        }
        if self.value.is_empty() {
            return Err(TypesError::InvalidGenesis(format!("{}: value: empty", self)));
        }
        Ok(())
    }

    /// Decodes the entry into its access path and value.
    pub fn decode(&self) -> Result<(AccessPath, Vec<u8>), TypesError> {
        let address = hex::decode(&self.address)
            .map_err(|e| TypesError::InvalidGenesis(format!("{}: address: {}", self, e)))?;
        if address.len() != Address::LEN {
            return Err(TypesError::InvalidGenesis(format!(
                "{}: address: incorrect length (should be {} bytes)",
                self,
                Address::LEN
            )));
        }
        let path = hex::decode(&self.path)
            .map_err(|e| TypesError::InvalidGenesis(format!("{}: path: {}", self, e)))?;
        let value = hex::decode(&self.value)
            .map_err(|e| TypesError::InvalidGenesis(format!("{}: value: {}", self, e)))?;
        Ok((AccessPath::new(address, path), value))
    }
}

impl GenesisState {
    /// Parses and validates a genesis document. Empty input yields an empty state.
    pub fn from_json(bytes: &[u8]) -> Result<Self, TypesError> {
        if bytes.is_empty() {
            return Ok(Self::default());
        }
        let state: GenesisState = serde_json::from_slice(bytes)
            .map_err(|e| TypesError::InvalidGenesis(format!("unmarshal JSON: {}", e)))?;
        state.validate()?;
        Ok(state)
    }

    /// Every entry is well formed and no `address:path` appears twice.
    pub fn validate(&self) -> Result<(), TypesError> {
        let mut seen = HashSet::with_capacity(self.write_sets.len());
        for ws in &self.write_sets {
            ws.validate()?;
            ws.decode()?;
            if !seen.insert(ws.to_string()) {
                return Err(TypesError::InvalidGenesis(format!("{}: duplicated", ws)));
            }
        }
        Ok(())
    }

    /// Decoded `(path, value)` pairs in document order.
    pub fn entries(&self) -> Result<Vec<(AccessPath, Vec<u8>)>, TypesError> {
        self.write_sets.iter().map(GenesisWriteSet::decode).collect()
    }
}
