//! Node configuration.
//!
//! Handles loading and validation of node configuration from
//! config files and command-line arguments.

use mvm_storage::StoreLayout;
use mvm_types::{Hash, ValidationContext};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Node configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Execution engine and data server endpoints
    pub engine: EngineConfig,
    /// Chain identity and storage location
    pub chain: ChainConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
    /// Namespace names inside the chain database
    pub layout: StoreLayout,
}

impl NodeConfig {
    /// Load configuration from file.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read config file '{}': {}", path.display(), e))?;
        let config: NodeConfig = toml::from_str(&contents)
            .map_err(|e| anyhow::anyhow!("Failed to parse config file '{}': {}", path.display(), e))?;
        Ok(config)
    }

    /// Save configuration to file.
    pub fn to_file(&self, path: &Path) -> anyhow::Result<()> {
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)
            .map_err(|e| anyhow::anyhow!("Failed to write config file '{}': {}", path.display(), e))?;
        Ok(())
    }

    /// Validate configuration.
    pub fn validate(&self) -> anyhow::Result<()> {
        validate_http_address(&self.engine.engine_address)?;
        self.engine.data_server_addr()?;
        self.chain.validation_context()?;

        if self.logging.level.trim().is_empty() {
            anyhow::bail!("Log level cannot be empty");
        }

        Ok(())
    }
}

fn validate_http_address(address: &str) -> anyhow::Result<()> {
    let rest = address
        .strip_prefix("http://")
        .or_else(|| address.strip_prefix("https://"))
        .ok_or_else(|| anyhow::anyhow!("Engine address '{}' must be an http(s) URL", address))?;

    let authority = rest.split('/').next().unwrap_or_default();
    if authority.is_empty() {
        anyhow::bail!("Engine address '{}' has no host", address);
    }
    Ok(())
}

/// Execution engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Engine JSON-RPC endpoint
    pub engine_address: String,
    /// Listen address of the data server the engine reads state from
    pub data_server_address: String,
    /// Attempts per engine request (0 = retry forever)
    pub max_attempts: u32,
    /// Per-attempt timeout in milliseconds (0 = no timeout)
    pub request_timeout_ms: u64,
}

impl EngineConfig {
    pub fn data_server_addr(&self) -> anyhow::Result<SocketAddr> {
        self.data_server_address.parse().map_err(|e| {
            anyhow::anyhow!(
                "Invalid data server address '{}': {}",
                self.data_server_address,
                e
            )
        })
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            engine_address: "http://127.0.0.1:50051".to_string(),
            data_server_address: "127.0.0.1:50061".to_string(),
            max_attempts: 0,
            request_timeout_ms: 0,
        }
    }
}

/// Chain configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainConfig {
    /// Network ID every transaction must carry
    pub network_id: u32,
    /// Chain ID (32-byte hex) every transaction must carry
    pub chain_id: String,
    /// Genesis document; an empty genesis is used when unset
    pub genesis_path: Option<PathBuf>,
    /// Data directory
    pub data_dir: PathBuf,
}

impl ChainConfig {
    pub fn validation_context(&self) -> anyhow::Result<ValidationContext> {
        let chain_id: Hash = self
            .chain_id
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid chain ID '{}': {}", self.chain_id, e))?;
        Ok(ValidationContext {
            network_id: self.network_id,
            chain_id,
        })
    }

    /// Genesis document bytes, or nothing when no genesis file is configured.
    pub fn genesis_bytes(&self) -> anyhow::Result<Vec<u8>> {
        match &self.genesis_path {
            Some(path) => std::fs::read(path).map_err(|e| {
                anyhow::anyhow!("Failed to read genesis file '{}': {}", path.display(), e)
            }),
            None => Ok(Vec::new()),
        }
    }
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            network_id: 12345,
            chain_id: Hash::compute(b"m-chain").to_hex(),
            genesis_path: None,
            data_dir: PathBuf::from("./data"),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level or filter directive
    pub level: String,
    /// Emit JSON lines instead of pretty output
    pub json: bool,
    /// Log to file
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = NodeConfig::default();
        assert_eq!(config.engine.engine_address, "http://127.0.0.1:50051");
        assert_eq!(config.engine.max_attempts, 0);
        assert_eq!(config.layout.write_sets, "writeSets");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = NodeConfig::default();
        config.engine.engine_address = "127.0.0.1:50051".to_string();
        assert!(config.validate().is_err());

        let mut config = NodeConfig::default();
        config.engine.engine_address = "http://".to_string();
        assert!(config.validate().is_err());

        let mut config = NodeConfig::default();
        config.engine.data_server_address = "localhost".to_string();
        assert!(config.validate().is_err());

        let mut config = NodeConfig::default();
        config.chain.chain_id = "abcd".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_file_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("node.toml");

        let mut config = NodeConfig::default();
        config.engine.max_attempts = 3;
        config.chain.genesis_path = Some(PathBuf::from("genesis.json"));
        config.to_file(&path).unwrap();

        let loaded = NodeConfig::from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("node.toml");
        std::fs::write(&path, "[engine]\nrequest_timeout_ms = 250\n").unwrap();

        let config = NodeConfig::from_file(&path).unwrap();
        assert_eq!(config.engine.request_timeout_ms, 250);
        assert_eq!(config.engine.data_server_address, "127.0.0.1:50061");
        assert_eq!(config.chain, ChainConfig::default());
    }

    #[test]
    fn test_genesis_bytes() {
        let dir = TempDir::new().unwrap();
        let mut chain = ChainConfig::default();
        assert!(chain.genesis_bytes().unwrap().is_empty());

        chain.genesis_path = Some(dir.path().join("missing.json"));
        assert!(chain.genesis_bytes().is_err());
    }
}
