use std::time::Duration;
use thiserror::Error;

/// Gas accounting failures. Distinct from engine-reported execution failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GasError {
    #[error("{descriptor}: gas overflow")]
    Overflow { descriptor: String },

    #[error("{descriptor}: gas reached its limit ({consumed} > {limit})")]
    LimitExceeded {
        descriptor: String,
        consumed: u64,
        limit: u64,
    },

    #[error("{descriptor}: negative gas consumed (refund {amount} > consumed {consumed})")]
    NegativeGas {
        descriptor: String,
        amount: u64,
        consumed: u64,
    },
}

/// Errors that can occur while talking to the execution engine.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum VmError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Request timed out after {0:?}")]
    AttemptTimeout(Duration),

    #[error("in {attempts} attempt(s) with {timeout} timeout ({elapsed:?}): {source}")]
    RetriesExhausted {
        attempts: u32,
        timeout: String,
        elapsed: Duration,
        #[source]
        source: Box<VmError>,
    },

    #[error("Retry task failed: {0}")]
    RetryTaskFailed(String),

    #[error("Compiler errors: [{}]", .0.join(", "))]
    Compilation(Vec<String>),

    #[error("Malformed type tag: {0}")]
    MalformedTypeTag(String),

    #[error("EventType serialization failed: {tag}: {source}")]
    EventType {
        tag: String,
        #[source]
        source: Box<VmError>,
    },

    #[error(transparent)]
    Gas(#[from] GasError),
}

impl From<jsonrpsee::core::ClientError> for VmError {
    fn from(e: jsonrpsee::core::ClientError) -> Self {
        VmError::Transport(e.to_string())
    }
}
