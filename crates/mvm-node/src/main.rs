//! M-chain node binary.

use clap::Parser;
use mvm_node::{telemetry, MvmNode, NodeConfig};
use std::path::PathBuf;
use tracing::{error, info};

/// Command-line arguments.
#[derive(Parser, Debug)]
#[command(name = "mvm-node")]
#[command(about = "M-chain node backed by a remote Move execution engine")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Args {
    /// Config file path
    #[arg(short, long, value_name = "FILE", env = "MVM_CONFIG")]
    config: Option<PathBuf>,

    /// Data directory
    #[arg(short, long, env = "MVM_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Genesis document
    #[arg(long, value_name = "FILE", env = "MVM_GENESIS")]
    genesis: Option<PathBuf>,

    /// Log level
    #[arg(short, long, env = "MVM_LOG_LEVEL")]
    log_level: Option<String>,

    /// Emit JSON logs
    #[arg(long)]
    json_logs: bool,

    /// Write a default config to FILE and exit
    #[arg(long, value_name = "FILE")]
    init_config: Option<PathBuf>,
}

impl Args {
    fn apply(&self, config: &mut NodeConfig) {
        if let Some(dir) = &self.data_dir {
            config.chain.data_dir = dir.clone();
        }
        if let Some(genesis) = &self.genesis {
            config.chain.genesis_path = Some(genesis.clone());
        }
        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }
        if self.json_logs {
            config.logging.json = true;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if let Some(path) = &args.init_config {
        NodeConfig::default().to_file(path)?;
        println!("Wrote default configuration to {}", path.display());
        return Ok(());
    }

    let mut config = match &args.config {
        Some(path) => NodeConfig::from_file(path)?,
        None => NodeConfig::default(),
    };
    args.apply(&mut config);
    config.validate()?;

    telemetry::init(&config.logging)?;

    info!("Configuration:");
    info!("  Data dir: {:?}", config.chain.data_dir);
    info!("  Network ID: {}", config.chain.network_id);
    info!("  Chain ID: {}", config.chain.chain_id);
    info!("  Engine: {}", config.engine.engine_address);
    info!("  Data server: {}", config.engine.data_server_address);

    let (mut node, _shutdown) = MvmNode::new(config).await?;

    if let Err(e) = node.start().await {
        error!("Failed to start node: {:#}", e);
        return Err(e);
    }

    if let Err(e) = node.run().await {
        error!("Node error: {:#}", e);
        return Err(e);
    }

    info!("M-chain node shutdown complete");
    Ok(())
}
