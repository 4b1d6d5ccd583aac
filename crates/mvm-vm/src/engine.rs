//! Execution engine seam.
//!
//! [`ExecutionEngine`] is what the rest of the node talks to. [`JsonRpcEngine`]
//! reaches an out-of-process engine through the `dvm_*` JSON-RPC namespace
//! described by [`DvmApi`].

use crate::error::VmError;
use crate::protocol::{
    Bytecode, CompilationResult, ExecuteResponse, ExecuteScriptRequest, Metadata,
    PublishModuleRequest, SourceFiles,
};
use async_trait::async_trait;
use jsonrpsee::core::RpcResult;
use jsonrpsee::http_client::{HttpClient, HttpClientBuilder};
use jsonrpsee::proc_macros::rpc;

/// Operations the node needs from a Move execution engine.
#[async_trait]
pub trait ExecutionEngine: Send + Sync {
    async fn publish_module(
        &self,
        request: PublishModuleRequest,
    ) -> Result<ExecuteResponse, VmError>;

    async fn execute_script(
        &self,
        request: ExecuteScriptRequest,
    ) -> Result<ExecuteResponse, VmError>;

    async fn compile(&self, source: SourceFiles) -> Result<CompilationResult, VmError>;

    async fn get_metadata(&self, bytecode: Bytecode) -> Result<Metadata, VmError>;
}

/// Engine-side JSON-RPC interface.
#[rpc(server, client, namespace = "dvm")]
pub trait DvmApi {
    #[method(name = "publishModule")]
    async fn publish_module(&self, request: PublishModuleRequest) -> RpcResult<ExecuteResponse>;

    #[method(name = "executeScript")]
    async fn execute_script(&self, request: ExecuteScriptRequest) -> RpcResult<ExecuteResponse>;

    #[method(name = "compile")]
    async fn compile(&self, source: SourceFiles) -> RpcResult<CompilationResult>;

    #[method(name = "getMetadata")]
    async fn get_metadata(&self, bytecode: Bytecode) -> RpcResult<Metadata>;
}

/// [`ExecutionEngine`] over HTTP JSON-RPC.
pub struct JsonRpcEngine {
    address: String,
    client: HttpClient,
}

impl JsonRpcEngine {
    /// Connects lazily; nothing is sent until the first request.
    pub fn new(address: &str) -> Result<Self, VmError> {
        let client = HttpClientBuilder::default()
            .build(address)
            .map_err(|e| VmError::Transport(format!("engine client for {}: {}", address, e)))?;
        Ok(Self {
            address: address.to_string(),
            client,
        })
    }

    pub fn address(&self) -> &str {
        &self.address
    }
}

#[async_trait]
impl ExecutionEngine for JsonRpcEngine {
    async fn publish_module(
        &self,
        request: PublishModuleRequest,
    ) -> Result<ExecuteResponse, VmError> {
        Ok(DvmApiClient::publish_module(&self.client, request).await?)
    }

    async fn execute_script(
        &self,
        request: ExecuteScriptRequest,
    ) -> Result<ExecuteResponse, VmError> {
        Ok(DvmApiClient::execute_script(&self.client, request).await?)
    }

    async fn compile(&self, source: SourceFiles) -> Result<CompilationResult, VmError> {
        Ok(DvmApiClient::compile(&self.client, source).await?)
    }

    async fn get_metadata(&self, bytecode: Bytecode) -> Result<Metadata, VmError> {
        Ok(DvmApiClient::get_metadata(&self.client, bytecode).await?)
    }
}
