//! MVM RPC - inbound JSON-RPC surface of the M-chain node.
//!
//! The only server is the data source the execution engine reads chain
//! state from while executing.

pub mod data_server;
pub mod error;

pub use data_server::{
    DataServer, DataSource, DataSourceApiClient, DataSourceApiServer, DsErrorCode, RawResponse,
};
pub use error::{error_codes, RpcError};
