//! Scriptable in-process engine for tests.

use crate::engine::ExecutionEngine;
use crate::error::VmError;
use crate::protocol::{
    Bytecode, CompilationResult, ExecuteRequest, ExecuteResponse, ExecuteScriptRequest, Metadata,
    PublishModuleRequest, SourceFiles,
};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

type ExecuteHandler = Box<dyn Fn(&ExecuteRequest, usize) -> Result<ExecuteResponse, VmError> + Send + Sync>;
type CompileHandler = Box<dyn Fn(&SourceFiles) -> Result<CompilationResult, VmError> + Send + Sync>;
type MetadataHandler = Box<dyn Fn(&Bytecode) -> Result<Metadata, VmError> + Send + Sync>;

/// Engine whose answers come from closures.
///
/// The execute handler receives the request and the zero-based index of the
/// execute call across both publish and script requests. Without a handler
/// every execute succeeds with an empty write-set.
#[derive(Default)]
pub struct StubEngine {
    execute: Option<ExecuteHandler>,
    compile: Option<CompileHandler>,
    metadata: Option<MetadataHandler>,
    delay: Option<Duration>,
    execute_calls: AtomicUsize,
    publish_calls: AtomicUsize,
    script_calls: AtomicUsize,
    compile_calls: AtomicUsize,
    metadata_calls: AtomicUsize,
}

impl StubEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_execute<F>(mut self, handler: F) -> Self
    where
        F: Fn(&ExecuteRequest, usize) -> Result<ExecuteResponse, VmError> + Send + Sync + 'static,
    {
        self.execute = Some(Box::new(handler));
        self
    }

    pub fn on_compile<F>(mut self, handler: F) -> Self
    where
        F: Fn(&SourceFiles) -> Result<CompilationResult, VmError> + Send + Sync + 'static,
    {
        self.compile = Some(Box::new(handler));
        self
    }

    pub fn on_metadata<F>(mut self, handler: F) -> Self
    where
        F: Fn(&Bytecode) -> Result<Metadata, VmError> + Send + Sync + 'static,
    {
        self.metadata = Some(Box::new(handler));
        self
    }

    /// Sleeps before answering each execute request.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn publish_calls(&self) -> usize {
        self.publish_calls.load(Ordering::SeqCst)
    }

    pub fn script_calls(&self) -> usize {
        self.script_calls.load(Ordering::SeqCst)
    }

    pub fn compile_calls(&self) -> usize {
        self.compile_calls.load(Ordering::SeqCst)
    }

    pub fn metadata_calls(&self) -> usize {
        self.metadata_calls.load(Ordering::SeqCst)
    }

    async fn execute(&self, request: ExecuteRequest) -> Result<ExecuteResponse, VmError> {
        let call = self.execute_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match &self.execute {
            Some(handler) => handler(&request, call),
            None => Ok(ExecuteResponse::success(vec![], vec![])),
        }
    }
}

#[async_trait]
impl ExecutionEngine for StubEngine {
    async fn publish_module(
        &self,
        request: PublishModuleRequest,
    ) -> Result<ExecuteResponse, VmError> {
        self.publish_calls.fetch_add(1, Ordering::SeqCst);
        self.execute(ExecuteRequest::PublishModule(request)).await
    }

    async fn execute_script(
        &self,
        request: ExecuteScriptRequest,
    ) -> Result<ExecuteResponse, VmError> {
        self.script_calls.fetch_add(1, Ordering::SeqCst);
        self.execute(ExecuteRequest::ExecuteScript(request)).await
    }

    async fn compile(&self, source: SourceFiles) -> Result<CompilationResult, VmError> {
        self.compile_calls.fetch_add(1, Ordering::SeqCst);
        match &self.compile {
            Some(handler) => handler(&source),
            None => Ok(CompilationResult::default()),
        }
    }

    async fn get_metadata(&self, bytecode: Bytecode) -> Result<Metadata, VmError> {
        self.metadata_calls.fetch_add(1, Ordering::SeqCst);
        match &self.metadata {
            Some(handler) => handler(&bytecode),
            None => Ok(Metadata::default()),
        }
    }
}
