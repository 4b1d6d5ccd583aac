//! M-chain node: owns the VM and the data server for one chain.

use anyhow::Context;
use mvm_core::Vm;
use mvm_rpc::DataServer;
use mvm_storage::{FileDb, KeyValueStore};
use mvm_vm::{ExecutionClient, ExecutionEngine, JsonRpcEngine, RetryPolicy};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use tracing::info;

use crate::config::NodeConfig;

/// Node state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeState {
    Initializing,
    Running,
    ShuttingDown,
    Stopped,
}

impl NodeState {
    pub fn is_active(&self) -> bool {
        matches!(self, NodeState::Running)
    }
}

/// The M-chain node.
pub struct MvmNode {
    pub config: NodeConfig,
    pub node_state: Arc<RwLock<NodeState>>,
    pub vm: Arc<Vm>,
    pub data_server: DataServer,
    shutdown: mpsc::Receiver<()>,
}

impl MvmNode {
    /// Opens the chain database under `data_dir` and talks to the engine
    /// at `engine_address`.
    pub async fn new(config: NodeConfig) -> anyhow::Result<(Self, mpsc::Sender<()>)> {
        let db_path = config.chain.data_dir.join("chain");
        let db = FileDb::open(&db_path)
            .with_context(|| format!("opening chain database at {}", db_path.display()))?;
        let engine = JsonRpcEngine::new(&config.engine.engine_address)?;
        Self::with_parts(config, Arc::new(db), Arc::new(engine))
    }

    /// Builds a node over an explicit database and engine.
    pub fn with_parts(
        config: NodeConfig,
        db: Arc<dyn KeyValueStore>,
        engine: Arc<dyn ExecutionEngine>,
    ) -> anyhow::Result<(Self, mpsc::Sender<()>)> {
        info!(engine = %config.engine.engine_address, "Initializing M-chain node");

        let ctx = config.chain.validation_context()?;
        let genesis = config.chain.genesis_bytes()?;
        let policy = RetryPolicy::new(config.engine.max_attempts, config.engine.request_timeout_ms);
        let client = ExecutionClient::new(engine, policy);

        let vm = Arc::new(
            Vm::new(ctx, db, &config.layout, client, &genesis).context("initializing VM")?,
        );
        let data_server = DataServer::new(config.engine.data_server_addr()?, vm.state_store());

        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        let node = Self {
            config,
            node_state: Arc::new(RwLock::new(NodeState::Initializing)),
            vm,
            data_server,
            shutdown: shutdown_rx,
        };

        Ok((node, shutdown_tx))
    }

    /// Start serving the data source. Returns the bound address.
    pub async fn start(&mut self) -> anyhow::Result<SocketAddr> {
        let addr = self
            .data_server
            .start()
            .await
            .context("starting data server")?;

        *self.node_state.write().await = NodeState::Running;
        info!(
            last_accepted = %self.vm.last_accepted(),
            data_server = %addr,
            "M-chain node started"
        );
        Ok(addr)
    }

    /// Run the node until a shutdown signal or Ctrl+C.
    pub async fn run(&mut self) -> anyhow::Result<()> {
        info!("Node is running. Press Ctrl+C to shutdown.");

        tokio::select! {
            _ = self.shutdown.recv() => {
                info!("Shutdown signal received");
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Ctrl+C received");
            }
        }

        self.shutdown().await;
        Ok(())
    }

    /// Graceful shutdown.
    pub async fn shutdown(&mut self) {
        info!("Shutting down M-chain node...");
        *self.node_state.write().await = NodeState::ShuttingDown;

        self.data_server.stop().await;

        *self.node_state.write().await = NodeState::Stopped;
        info!("M-chain node stopped");
    }

    pub async fn state(&self) -> NodeState {
        *self.node_state.read().await
    }

    pub async fn is_healthy(&self) -> bool {
        self.state().await.is_active()
    }
}
