//! Retrying client for the execution engine.

use crate::engine::ExecutionEngine;
use crate::error::VmError;
use crate::protocol::{
    Bytecode, CompilationResult, CompilationUnit, ExecuteRequest, ExecuteResponse, Metadata,
    SourceFiles,
};
use mvm_types::Address;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, warn};

/// Every N-th consecutive failure is logged while retrying.
pub const FAILED_ATTEMPT_LOG_PERIOD: u32 = 100;

/// Deadline for the single-attempt compile and metadata queries.
pub const ENGINE_QUERY_TIMEOUT: Duration = Duration::from_secs(30);

/// Name given to the single unit submitted for compilation.
pub const COMPILATION_UNIT_NAME: &str = "CompilationUnit";

/// How execute requests are retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RetryPolicy {
    /// Zero retries forever.
    pub max_attempts: u32,
    /// Per-attempt deadline. `None` waits for each attempt indefinitely.
    pub attempt_timeout: Option<Duration>,
}

impl RetryPolicy {
    /// Builds a policy from raw config values; zero means "unbounded".
    pub fn new(max_attempts: u32, request_timeout_ms: u64) -> Self {
        let attempt_timeout = match request_timeout_ms {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        };
        Self {
            max_attempts,
            attempt_timeout,
        }
    }

    fn timeout_label(&self) -> String {
        match self.attempt_timeout {
            Some(timeout) => format!("{:?}", timeout),
            None => "no".to_string(),
        }
    }
}

/// Sends requests to an [`ExecutionEngine`], retrying execute requests
/// according to a [`RetryPolicy`].
#[derive(Clone)]
pub struct ExecutionClient {
    engine: Arc<dyn ExecutionEngine>,
    policy: RetryPolicy,
}

impl ExecutionClient {
    pub fn new(engine: Arc<dyn ExecutionEngine>, policy: RetryPolicy) -> Self {
        Self { engine, policy }
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Sends a publish or execute request, retrying failed attempts.
    ///
    /// The retry loop runs on its own task. Dropping the returned future
    /// does not stop it; the loop ends on success or once the attempt
    /// budget is spent.
    pub async fn send_execute_request(
        &self,
        request: ExecuteRequest,
    ) -> Result<ExecuteResponse, VmError> {
        let kind = request.kind();
        let engine = self.engine.clone();
        let policy = self.policy;
        let started = Instant::now();

        let task = tokio::spawn(async move { retry_loop(engine, policy, request).await });
        let (attempts, result) = task
            .await
            .map_err(|e| VmError::RetryTaskFailed(e.to_string()))?;

        match result {
            Ok(response) => {
                debug!(
                    request = kind,
                    attempts,
                    elapsed = ?started.elapsed(),
                    "Successful VM request"
                );
                Ok(response)
            }
            Err(e) => {
                let elapsed = started.elapsed();
                error!(request = kind, attempts, ?elapsed, "VM request failed: {}", e);
                Err(VmError::RetriesExhausted {
                    attempts,
                    timeout: policy.timeout_label(),
                    elapsed,
                    source: Box::new(e),
                })
            }
        }
    }

    /// Compiles Move source as a single unit, without retries.
    pub async fn compile(
        &self,
        sender: Address,
        source: &str,
    ) -> Result<CompilationResult, VmError> {
        let request = SourceFiles {
            units: vec![CompilationUnit {
                text: source.to_string(),
                name: COMPILATION_UNIT_NAME.to_string(),
            }],
            address: sender,
        };
        with_deadline(ENGINE_QUERY_TIMEOUT, self.engine.compile(request)).await
    }

    /// Fetches bytecode metadata, without retries.
    pub async fn get_metadata(&self, code: Vec<u8>) -> Result<Metadata, VmError> {
        with_deadline(ENGINE_QUERY_TIMEOUT, self.engine.get_metadata(Bytecode { code })).await
    }
}

async fn with_deadline<T>(
    timeout: Duration,
    fut: impl std::future::Future<Output = Result<T, VmError>>,
) -> Result<T, VmError> {
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result,
        Err(_) => Err(VmError::AttemptTimeout(timeout)),
    }
}

async fn send_once(
    engine: &dyn ExecutionEngine,
    request: &ExecuteRequest,
) -> Result<ExecuteResponse, VmError> {
    match request {
        ExecuteRequest::PublishModule(module) => engine.publish_module(module.clone()).await,
        ExecuteRequest::ExecuteScript(script) => engine.execute_script(script.clone()).await,
    }
}

async fn retry_loop(
    engine: Arc<dyn ExecutionEngine>,
    policy: RetryPolicy,
    request: ExecuteRequest,
) -> (u32, Result<ExecuteResponse, VmError>) {
    let mut attempt: u32 = 0;
    loop {
        attempt = attempt.saturating_add(1);
        let attempt_started = Instant::now();

        let result = match policy.attempt_timeout {
            Some(timeout) => with_deadline(timeout, send_once(engine.as_ref(), &request)).await,
            None => send_once(engine.as_ref(), &request).await,
        };

        let err = match result {
            Ok(response) => return (attempt, Ok(response)),
            Err(e) => e,
        };

        if attempt % FAILED_ATTEMPT_LOG_PERIOD == 0 {
            warn!(
                request = request.kind(),
                attempt,
                "VM request still failing: {}", err
            );
        }

        if policy.max_attempts != 0 && attempt >= policy.max_attempts {
            return (attempt, Err(err));
        }

        match policy.attempt_timeout {
            Some(timeout) => {
                let spent = attempt_started.elapsed();
                if spent < timeout {
                    tokio::time::sleep(timeout - spent).await;
                }
            }
            None => tokio::task::yield_now().await,
        }
    }
}
