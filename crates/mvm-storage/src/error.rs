use thiserror::Error;

/// Errors that can occur in storage operations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StorageError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<std::io::Error> for StorageError {
    fn from(e: std::io::Error) -> Self {
        StorageError::Io(e.to_string())
    }
}

impl From<mvm_types::TypesError> for StorageError {
    fn from(e: mvm_types::TypesError) -> Self {
        StorageError::Deserialization(e.to_string())
    }
}
