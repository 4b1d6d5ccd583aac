//! Transaction pipeline: engine requests in, write-sets and events out.

use crate::error::{CoreError, TxFailure};
use mvm_storage::StateStore;
use mvm_types::{Address, Event, ScriptArg, Transaction, TxPayload};
use mvm_vm::protocol::{FunctionMeta, StructMeta, VmArg};
use mvm_vm::{
    build_events, ExecuteRequest, ExecuteResponse, ExecuteScriptRequest, ExecutionClient,
    Metadata, PublishModuleRequest, VmError, WriteOp, GAS_LIMIT, GAS_PRICE,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Kind of a compiled unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeType {
    Script,
    Module,
}

/// One compiled unit with its metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledItem {
    pub name: String,
    pub bytecode: Vec<u8>,
    /// `None` if the engine reported neither script nor module metadata
    pub code_type: Option<CodeType>,
    pub types: Vec<StructMeta>,
    pub methods: Vec<FunctionMeta>,
}

/// Runs transaction payloads through the execution engine and applies the
/// resulting write-sets to the state store.
pub struct TransactionPipeline {
    client: ExecutionClient,
    store: Arc<StateStore>,
}

impl TransactionPipeline {
    pub fn new(client: ExecutionClient, store: Arc<StateStore>) -> Self {
        Self { client, store }
    }

    pub fn store(&self) -> &Arc<StateStore> {
        &self.store
    }

    /// Executes the payload of `tx` as part of a block at `height`.
    pub async fn execute_tx(
        &self,
        tx: &Transaction,
        height: u64,
    ) -> Result<Vec<Event>, TxFailure> {
        match tx.payload() {
            TxPayload::DeployModule { modules } => self.deploy_module(tx.sender(), modules).await,
            TxPayload::ExecuteScript { script, args } => {
                self.execute_script(tx.sender(), script, args, height).await
            }
            TxPayload::GenesisInit => Ok(Vec::new()),
        }
    }

    /// Executes a Move script on behalf of `sender`.
    pub async fn execute_script(
        &self,
        sender: Address,
        script: &[u8],
        args: &[ScriptArg],
        height: u64,
    ) -> Result<Vec<Event>, TxFailure> {
        let request = ExecuteRequest::ExecuteScript(ExecuteScriptRequest {
            senders: vec![sender],
            max_gas_amount: GAS_LIMIT,
            gas_unit_price: GAS_PRICE,
            block: height,
            timestamp: 0,
            code: script.to_vec(),
            type_params: Vec::new(),
            args: args.iter().map(VmArg::from).collect(),
        });

        let response = self
            .client
            .send_execute_request(request)
            .await
            .map_err(|e| TxFailure::new(Vec::new(), e))?;

        self.process_execution_response(&response)
    }

    /// Publishes every module with its own request.
    ///
    /// Modules are not bundled: each one is attempted even after an earlier
    /// failure, and write-sets of modules that succeeded stay applied when
    /// another one fails.
    pub async fn deploy_module(
        &self,
        sender: Address,
        modules: &[Vec<u8>],
    ) -> Result<Vec<Event>, TxFailure> {
        let mut events = Vec::new();
        let mut errors = Vec::new();

        for (idx, code) in modules.iter().enumerate() {
            let request = ExecuteRequest::PublishModule(PublishModuleRequest {
                sender,
                max_gas_amount: GAS_LIMIT,
                gas_unit_price: GAS_PRICE,
                code: code.clone(),
            });

            let response = match self.client.send_execute_request(request).await {
                Ok(response) => response,
                Err(e) => {
                    warn!(module = idx, "Module publish request failed: {}", e);
                    errors.push(format!("contract [{}]: {}", idx, e));
                    continue;
                }
            };

            match self.process_execution_response(&response) {
                Ok(module_events) => events.extend(module_events),
                Err(failure) => {
                    errors.push(format!("execution [{}]: {}", idx, failure.error));
                    events.extend(failure.events);
                }
            }
        }

        if errors.is_empty() {
            info!(sender = %sender, modules = modules.len(), "Modules published");
            Ok(events)
        } else {
            Err(TxFailure::new(events, CoreError::DeployFailed(errors.join(", "))))
        }
    }

    /// Derives events from an engine response and, on success, applies its
    /// write-set.
    ///
    /// # Panics
    ///
    /// Panics on a write operation kind this node does not know. Continuing
    /// would leave the state store diverged from the engine.
    pub fn process_execution_response(
        &self,
        response: &ExecuteResponse,
    ) -> Result<Vec<Event>, TxFailure> {
        let events = build_events(response).map_err(|e| TxFailure::new(Vec::new(), e))?;

        if !response.status.is_success() {
            debug!(status = ?response.status, "Execution failed");
            return Err(TxFailure::new(events, CoreError::ExecutionFailed));
        }

        for (idx, value) in response.write_set.iter().enumerate() {
            let applied = match value.op {
                WriteOp::Value => self.store.put(&value.path, &value.value),
                WriteOp::Deletion => self.store.delete(&value.path),
                WriteOp::Unknown => {
                    panic!("processing writeSets: writeSet [{}]: unsupported write op", idx)
                }
            };
            if let Err(e) = applied {
                return Err(TxFailure::new(events, e));
            }
        }

        debug!(writes = response.write_set.len(), "Write-set applied");
        Ok(events)
    }

    /// Compiles `source` and classifies every compiled unit.
    pub async fn compile(
        &self,
        sender: Address,
        source: &str,
    ) -> Result<Vec<CompiledItem>, CoreError> {
        let result = self.client.compile(sender, source).await?;
        if !result.errors.is_empty() {
            return Err(VmError::Compilation(result.errors).into());
        }

        let mut items = Vec::with_capacity(result.units.len());
        for unit in result.units {
            let metadata = self.client.get_metadata(unit.bytecode.clone()).await?;
            items.push(classify(unit.name, unit.bytecode, metadata));
        }
        Ok(items)
    }

    pub async fn get_metadata(&self, code: Vec<u8>) -> Result<Metadata, CoreError> {
        Ok(self.client.get_metadata(code).await?)
    }
}

fn classify(name: String, bytecode: Vec<u8>, metadata: Metadata) -> CompiledItem {
    let mut item = CompiledItem {
        name,
        bytecode,
        code_type: None,
        types: Vec::new(),
        methods: Vec::new(),
    };
    if metadata.script.is_some() {
        item.code_type = Some(CodeType::Script);
    }
    if let Some(module) = metadata.module {
        item.code_type = Some(CodeType::Module);
        item.types = module.types;
        item.methods = module.functions;
    }
    item
}
