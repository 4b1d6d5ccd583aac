//! MVM Node - the M-chain node.
//!
//! Ties the VM, the execution engine client and the data server together
//! behind a TOML configuration.

pub mod config;
pub mod node;
pub mod telemetry;

pub use config::{ChainConfig, EngineConfig, LoggingConfig, NodeConfig};
pub use node::{MvmNode, NodeState};
