use thiserror::Error;

/// Errors that can occur in type operations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TypesError {
    #[error("Invalid address format: {0}")]
    InvalidAddressFormat(String),

    #[error("Invalid address length: expected 20, got {0}")]
    InvalidAddressLength(usize),

    #[error("Invalid hash length: expected 32, got {0}")]
    InvalidHashLength(usize),

    #[error("Invalid hex: {0}")]
    InvalidHex(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Wrong network ID: expected {expected}, got {actual}")]
    WrongNetwork { expected: u32, actual: u32 },

    #[error("Wrong chain ID: expected {expected}, got {actual}")]
    WrongChain { expected: String, actual: String },

    #[error("Deploy message has no modules")]
    EmptyModules,

    #[error("Module [{0}]: empty")]
    EmptyModule(usize),

    #[error("Script: empty")]
    EmptyScript,

    #[error("Script argument [{0}]: empty value")]
    EmptyScriptArg(usize),

    #[error("Genesis transaction outside of the genesis block (height {0})")]
    GenesisOutsideGenesisBlock(u64),

    #[error("Invalid genesis: {0}")]
    InvalidGenesis(String),
}

impl From<hex::FromHexError> for TypesError {
    fn from(e: hex::FromHexError) -> Self {
        TypesError::InvalidHex(e.to_string())
    }
}

impl From<std::io::Error> for TypesError {
    fn from(e: std::io::Error) -> Self {
        TypesError::Serialization(e.to_string())
    }
}
