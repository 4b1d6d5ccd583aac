//! The engine reads chain state back through the data server while a block
//! is being verified.

use async_trait::async_trait;
use jsonrpsee::core::RpcResult;
use jsonrpsee::http_client::{HttpClient, HttpClientBuilder};
use jsonrpsee::server::{ServerBuilder, ServerHandle};
use jsonrpsee::types::ErrorObjectOwned;
use mvm_crypto::{sign_transaction, Keypair};
use mvm_node::{MvmNode, NodeConfig};
use mvm_rpc::{DataSourceApiClient, DsErrorCode};
use mvm_types::{AccessPath, ScriptArg, Transaction, TxPayload, TxStatus, UnsignedTx};
use mvm_vm::protocol::{
    Bytecode, CompilationResult, ExecutionStatus, Metadata, SourceFiles, WriteSetValue,
};
use mvm_vm::{DvmApiServer, ExecuteResponse, ExecuteScriptRequest, PublishModuleRequest};
use std::net::SocketAddr;
use std::sync::{Arc, OnceLock};
use tempfile::TempDir;

fn module_path(code: &[u8]) -> AccessPath {
    AccessPath::new(vec![0x11; 20], code.to_vec())
}

fn result_path() -> AccessPath {
    AccessPath::new(vec![0x22; 20], b"result".to_vec())
}

fn ds_error(e: impl std::fmt::Display) -> ErrorObjectOwned {
    ErrorObjectOwned::owned(-32000, e.to_string(), None::<()>)
}

/// Engine that stores published modules under `module_path(code)` and runs
/// a script by fetching `module_path(script)` from the node's data server
/// and copying it to `result_path()`.
struct ReadbackEngine {
    ds: Arc<OnceLock<HttpClient>>,
}

#[async_trait]
impl DvmApiServer for ReadbackEngine {
    async fn publish_module(&self, request: PublishModuleRequest) -> RpcResult<ExecuteResponse> {
        Ok(ExecuteResponse::success(
            vec![WriteSetValue::set(module_path(&request.code), request.code.clone())],
            vec![],
        ))
    }

    async fn execute_script(&self, request: ExecuteScriptRequest) -> RpcResult<ExecuteResponse> {
        let ds = self
            .ds
            .get()
            .ok_or_else(|| ds_error("data server not wired"))?;
        let raw = ds
            .get_raw(Some(module_path(&request.code)))
            .await
            .map_err(ds_error)?;

        if raw.error_code == DsErrorCode::NoData {
            return Ok(ExecuteResponse::failure(
                ExecutionStatus::Abort {
                    code: 404,
                    location: None,
                },
                Some(raw.error_message),
            ));
        }
        Ok(ExecuteResponse::success(
            vec![WriteSetValue::set(result_path(), raw.blob)],
            vec![],
        ))
    }

    async fn compile(&self, _source: SourceFiles) -> RpcResult<CompilationResult> {
        Ok(CompilationResult::default())
    }

    async fn get_metadata(&self, _bytecode: Bytecode) -> RpcResult<Metadata> {
        Ok(Metadata::default())
    }
}

struct Harness {
    node: MvmNode,
    engine: ServerHandle,
    _dir: TempDir,
}

impl Harness {
    async fn start(genesis: Option<&str>) -> Self {
        let dir = TempDir::new().unwrap();
        let ds = Arc::new(OnceLock::new());

        let server = ServerBuilder::new()
            .build("127.0.0.1:0".parse::<SocketAddr>().unwrap())
            .await
            .unwrap();
        let engine_addr = server.local_addr().unwrap();
        let engine = server.start(ReadbackEngine { ds: ds.clone() }.into_rpc());

        let mut config = NodeConfig::default();
        config.chain.data_dir = dir.path().to_path_buf();
        config.engine.engine_address = format!("http://{}", engine_addr);
        config.engine.data_server_address = "127.0.0.1:0".to_string();
        config.engine.max_attempts = 3;
        config.engine.request_timeout_ms = 2_000;
        if let Some(doc) = genesis {
            let path = dir.path().join("genesis.json");
            std::fs::write(&path, doc).unwrap();
            config.chain.genesis_path = Some(path);
        }

        let (mut node, _shutdown) = MvmNode::new(config).await.unwrap();
        let ds_addr = node.start().await.unwrap();
        let client = HttpClientBuilder::default()
            .build(format!("http://{}", ds_addr))
            .unwrap();
        let _ = ds.set(client);

        Self {
            node,
            engine,
            _dir: dir,
        }
    }

    async fn stop(mut self) {
        self.node.shutdown().await;
        self.engine.stop().unwrap();
        self.engine.stopped().await;
    }
}

fn keypair() -> Keypair {
    Keypair::from_seed(&[9u8; 32])
}

fn signed(node: &MvmNode, payload: TxPayload) -> Transaction {
    let kp = keypair();
    let ctx = node.config.chain.validation_context().unwrap();
    sign_transaction(UnsignedTx::new(&ctx, kp.address(), payload), &[&kp])
}

fn deploy(node: &MvmNode, module: &[u8]) -> Transaction {
    signed(
        node,
        TxPayload::DeployModule {
            modules: vec![module.to_vec()],
        },
    )
}

fn script(node: &MvmNode, code: &[u8]) -> Transaction {
    signed(
        node,
        TxPayload::ExecuteScript {
            script: code.to_vec(),
            args: vec![ScriptArg::Bool(true)],
        },
    )
}

#[tokio::test]
async fn test_script_reads_module_deployed_in_earlier_block() {
    let h = Harness::start(None).await;
    let vm = h.node.vm.clone();

    vm.issue_tx(deploy(&h.node, b"coin")).unwrap();
    let mut first = vm.build_block().unwrap();
    vm.verify_block(&mut first).await.unwrap();
    vm.accept_block(&mut first).await.unwrap();

    let tx = script(&h.node, b"coin");
    vm.issue_tx(tx.clone()).unwrap();
    let mut second = vm.build_block().unwrap();
    assert_eq!(second.parent(), first.id());
    vm.verify_block(&mut second).await.unwrap();
    vm.accept_block(&mut second).await.unwrap();

    assert_eq!(vm.state_store().get(&result_path()).unwrap(), b"coin".to_vec());
    let state = vm.get_tx_state(&tx.id()).unwrap().unwrap();
    assert_eq!(state.status, TxStatus::Committed);

    h.stop().await;
}

#[tokio::test]
async fn test_script_reads_genesis_state() {
    let genesis = format!(
        r#"{{"write_set":[{{"address":"{}","path":"{}","value":"{}"}}]}}"#,
        hex::encode([0x11u8; 20]),
        hex::encode(b"std"),
        hex::encode(b"stdlib bytes"),
    );
    let h = Harness::start(Some(&genesis)).await;
    let vm = h.node.vm.clone();

    vm.issue_tx(script(&h.node, b"std")).unwrap();
    let mut block = vm.build_block().unwrap();
    assert_eq!(block.height(), 1);
    vm.verify_block(&mut block).await.unwrap();

    assert_eq!(
        vm.state_store().get(&result_path()).unwrap(),
        b"stdlib bytes".to_vec()
    );

    h.stop().await;
}

#[tokio::test]
async fn test_missing_data_drops_transaction() {
    let h = Harness::start(None).await;
    let vm = h.node.vm.clone();

    let tx = script(&h.node, b"nowhere");
    vm.issue_tx(tx.clone()).unwrap();
    let mut block = vm.build_block().unwrap();
    assert!(vm.verify_block(&mut block).await.is_err());

    let state = vm.get_tx_state(&tx.id()).unwrap().unwrap();
    assert_eq!(state.status, TxStatus::Dropped);
    assert_eq!(state.events[0].attribute("status"), Some("discard"));
    assert_eq!(state.events[0].attribute("sub_status"), Some("404"));
    assert!(!vm.state_store().has(&result_path()).unwrap());

    h.stop().await;
}
