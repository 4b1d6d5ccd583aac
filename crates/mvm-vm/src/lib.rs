//! MVM VM - client side of the remote Move execution engine.
//!
//! This crate provides:
//! - Engine wire protocol types
//! - The `ExecutionEngine` seam with a JSON-RPC implementation
//! - A retrying execution client
//! - Gas metering
//! - Event processing for execution results

pub mod client;
pub mod engine;
pub mod error;
pub mod events;
pub mod gas;
pub mod protocol;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use client::{ExecutionClient, RetryPolicy};
pub use engine::{DvmApiClient, DvmApiServer, ExecutionEngine, JsonRpcEngine};
pub use error::{GasError, VmError};
pub use events::{build_events, stringify_event_type};
pub use gas::{ChargeGas, GasMeter};
pub use protocol::{
    ExecuteRequest, ExecuteResponse, ExecuteScriptRequest, ExecutionStatus, Metadata,
    PublishModuleRequest, WriteOp, WriteSetValue, VM_ABORTED_CODE, VM_EXECUTED_CODE,
};

/// Gas unit price for every engine request.
pub const GAS_PRICE: u64 = 1;

/// Gas limit for every engine request.
pub const GAS_LIMIT: u64 = u64::MAX / 1000 - 1;
