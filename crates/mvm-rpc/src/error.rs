//! RPC error types.

use jsonrpsee::types::error::ErrorObjectOwned;
use thiserror::Error;

/// JSON-RPC error codes.
pub mod error_codes {
    /// Invalid params
    pub const INVALID_PARAMS: i32 = -32602;
    /// Internal error
    pub const INTERNAL_ERROR: i32 = -32603;
    /// Method exists but is not implemented
    pub const UNIMPLEMENTED: i32 = -32004;
}

/// RPC errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RpcError {
    #[error("Invalid params: {0}")]
    InvalidParams(String),

    #[error("Internal error: {0}")]
    InternalError(String),

    #[error("{0} unimplemented")]
    Unimplemented(&'static str),
}

impl RpcError {
    /// Get the error code.
    pub fn code(&self) -> i32 {
        match self {
            RpcError::InvalidParams(_) => error_codes::INVALID_PARAMS,
            RpcError::InternalError(_) => error_codes::INTERNAL_ERROR,
            RpcError::Unimplemented(_) => error_codes::UNIMPLEMENTED,
        }
    }

    /// Convert to JSON-RPC error object.
    pub fn to_error_object(&self) -> ErrorObjectOwned {
        ErrorObjectOwned::owned(self.code(), self.to_string(), None::<()>)
    }
}

impl From<RpcError> for ErrorObjectOwned {
    fn from(err: RpcError) -> Self {
        err.to_error_object()
    }
}

impl From<mvm_storage::StorageError> for RpcError {
    fn from(err: mvm_storage::StorageError) -> Self {
        RpcError::InternalError(err.to_string())
    }
}
