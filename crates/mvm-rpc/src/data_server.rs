//! Data source server.
//!
//! The execution engine calls back into the node through this server while
//! an execute request is still in flight, so reads observe the pending
//! overlay of the block being verified.

use crate::error::RpcError;
use jsonrpsee::proc_macros::rpc;
use jsonrpsee::server::{ServerBuilder, ServerHandle};
use mvm_storage::StateStore;
use mvm_types::AccessPath;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Domain-level outcome of a raw read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DsErrorCode {
    #[default]
    None,
    NoData,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RawResponse {
    #[serde(with = "hex", default)]
    pub blob: Vec<u8>,
    #[serde(default)]
    pub error_code: DsErrorCode,
    #[serde(default)]
    pub error_message: String,
}

impl RawResponse {
    pub fn found(blob: Vec<u8>) -> Self {
        Self {
            blob,
            ..Default::default()
        }
    }

    pub fn no_data(path: &AccessPath) -> Self {
        Self {
            blob: Vec::new(),
            error_code: DsErrorCode::NoData,
            error_message: format!("data not found for access path: {}", path),
        }
    }
}

/// Engine-facing data source interface.
#[rpc(server, client, namespace = "ds")]
pub trait DataSourceApi {
    #[method(name = "getRaw")]
    fn get_raw(&self, access_path: Option<AccessPath>) -> Result<RawResponse, RpcError>;

    #[method(name = "multiGetRaw")]
    fn multi_get_raw(&self, request: Option<serde_json::Value>) -> Result<Vec<RawResponse>, RpcError>;

    #[method(name = "getOraclePrice")]
    fn get_oracle_price(&self, request: Option<serde_json::Value>) -> Result<serde_json::Value, RpcError>;

    #[method(name = "getNativeBalance")]
    fn get_native_balance(&self, request: Option<serde_json::Value>) -> Result<serde_json::Value, RpcError>;

    #[method(name = "getCurrencyInfo")]
    fn get_currency_info(&self, request: Option<serde_json::Value>) -> Result<serde_json::Value, RpcError>;
}

/// Request handler over the write-set store.
pub struct DataSource {
    store: Arc<StateStore>,
}

impl DataSource {
    pub fn new(store: Arc<StateStore>) -> Self {
        Self { store }
    }
}

impl DataSourceApiServer for DataSource {
    fn get_raw(&self, access_path: Option<AccessPath>) -> Result<RawResponse, RpcError> {
        let path = access_path.ok_or_else(|| RpcError::InvalidParams("empty request".to_string()))?;

        match self.store.read(Some(&path))? {
            Some(blob) => {
                debug!(path = %path, len = blob.len(), "Raw data served");
                Ok(RawResponse::found(blob))
            }
            None => {
                debug!(path = %path, "Raw data not found");
                Ok(RawResponse::no_data(&path))
            }
        }
    }

    fn multi_get_raw(&self, _request: Option<serde_json::Value>) -> Result<Vec<RawResponse>, RpcError> {
        Err(RpcError::Unimplemented("MultiGetRaw"))
    }

    fn get_oracle_price(&self, _request: Option<serde_json::Value>) -> Result<serde_json::Value, RpcError> {
        Err(RpcError::Unimplemented("GetOraclePrice"))
    }

    fn get_native_balance(&self, _request: Option<serde_json::Value>) -> Result<serde_json::Value, RpcError> {
        Err(RpcError::Unimplemented("GetNativeBalance"))
    }

    fn get_currency_info(&self, _request: Option<serde_json::Value>) -> Result<serde_json::Value, RpcError> {
        Err(RpcError::Unimplemented("GetCurrencyInfo"))
    }
}

struct Running {
    handle: ServerHandle,
    local_addr: SocketAddr,
}

/// Lifecycle wrapper for the data source server. `start` and `stop` are
/// idempotent and serialized by one lock.
pub struct DataServer {
    addr: SocketAddr,
    store: Arc<StateStore>,
    running: Mutex<Option<Running>>,
}

impl DataServer {
    pub fn new(addr: SocketAddr, store: Arc<StateStore>) -> Self {
        Self {
            addr,
            store,
            running: Mutex::new(None),
        }
    }

    /// Binds the listener and serves in the background. Returns the bound
    /// address; a second call returns the address already in use.
    pub async fn start(&self) -> Result<SocketAddr, RpcError> {
        let mut running = self.running.lock().await;
        if let Some(r) = running.as_ref() {
            return Ok(r.local_addr);
        }

        let server = ServerBuilder::new()
            .build(self.addr)
            .await
            .map_err(|e| RpcError::InternalError(format!("Failed to build DS server: {}", e)))?;
        let local_addr = server
            .local_addr()
            .map_err(|e| RpcError::InternalError(format!("DS server address: {}", e)))?;

        let module = DataSource::new(self.store.clone()).into_rpc();
        let handle = server.start(module);
        *running = Some(Running { handle, local_addr });

        info!("DS server started on {}", local_addr);
        Ok(local_addr)
    }

    /// Stops serving and waits for the server to shut down.
    pub async fn stop(&self) {
        let mut running = self.running.lock().await;
        let Some(r) = running.take() else {
            return;
        };

        if let Err(e) = r.handle.stop() {
            warn!("DS server stop failed: {}", e);
        }
        r.handle.stopped().await;
        info!("DS server stopped");
    }

    pub async fn local_addr(&self) -> Option<SocketAddr> {
        self.running.lock().await.as_ref().map(|r| r.local_addr)
    }

    pub async fn is_running(&self) -> bool {
        self.running.lock().await.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::error_codes;
    use jsonrpsee::core::ClientError;
    use jsonrpsee::http_client::HttpClientBuilder;
    use mvm_storage::{MemoryDb, StoreLayout, VersionDb};
    use proptest::prelude::*;

    fn store() -> Arc<StateStore> {
        let db = Arc::new(VersionDb::new(Arc::new(MemoryDb::new())));
        Arc::new(StateStore::new(db, &StoreLayout::default()))
    }

    fn local() -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], 0))
    }

    #[test]
    fn test_get_raw_distinguishes_missing() {
        let store = store();
        let path = AccessPath::new(vec![1; 20], vec![2]);
        let source = DataSource::new(store.clone());

        let missing = source.get_raw(Some(path.clone())).unwrap();
        assert_eq!(missing.error_code, DsErrorCode::NoData);
        assert!(missing.error_message.contains("data not found"));

        store.put(&path, &[9, 9]).unwrap();
        let found = source.get_raw(Some(path)).unwrap();
        assert_eq!(found.error_code, DsErrorCode::None);
        assert_eq!(found.blob, vec![9, 9]);

        assert!(matches!(source.get_raw(None), Err(RpcError::InvalidParams(_))));
    }

    #[test]
    fn test_unimplemented_surfaces() {
        let source = DataSource::new(store());
        assert_eq!(
            source.get_oracle_price(None),
            Err(RpcError::Unimplemented("GetOraclePrice"))
        );
        assert_eq!(
            source.get_native_balance(None),
            Err(RpcError::Unimplemented("GetNativeBalance"))
        );
        assert_eq!(
            source.get_currency_info(None),
            Err(RpcError::Unimplemented("GetCurrencyInfo"))
        );
        assert_eq!(
            source.multi_get_raw(None),
            Err(RpcError::Unimplemented("MultiGetRaw"))
        );
    }

    #[tokio::test]
    async fn test_start_stop_idempotent() {
        let server = DataServer::new(local(), store());
        assert!(!server.is_running().await);

        let first = server.start().await.unwrap();
        let second = server.start().await.unwrap();
        assert_eq!(first, second);
        assert_ne!(first.port(), 0);

        server.stop().await;
        server.stop().await;
        assert!(!server.is_running().await);
        assert_eq!(server.local_addr().await, None);
    }

    #[tokio::test]
    async fn test_serves_pending_writes_over_http() {
        let store = store();
        let path = AccessPath::new(vec![3; 20], b"balance".to_vec());
        store.put(&path, &[42]).unwrap();

        let server = DataServer::new(local(), store);
        let addr = server.start().await.unwrap();
        let client = HttpClientBuilder::default()
            .build(format!("http://{}", addr))
            .unwrap();

        let found = client.get_raw(Some(path)).await.unwrap();
        assert_eq!(found.blob, vec![42]);

        let missing = client
            .get_raw(Some(AccessPath::new(vec![3; 20], b"other".to_vec())))
            .await
            .unwrap();
        assert_eq!(missing.error_code, DsErrorCode::NoData);

        match client.multi_get_raw(None).await {
            Err(ClientError::Call(obj)) => assert_eq!(obj.code(), error_codes::UNIMPLEMENTED),
            other => panic!("unexpected result: {other:?}"),
        }

        server.stop().await;
    }

    proptest! {
        #[test]
        fn prop_get_raw_only_serves_exact_path(
            path in proptest::collection::vec(any::<u8>(), 1..32),
            other in proptest::collection::vec(any::<u8>(), 1..32),
            value in proptest::collection::vec(any::<u8>(), 1..64),
        ) {
            prop_assume!(path != other);
            let store = store();
            let stored = AccessPath::new(vec![5; 20], path);
            store.put(&stored, &value).unwrap();
            let source = DataSource::new(store);

            prop_assert_eq!(source.get_raw(Some(stored)).unwrap(), RawResponse::found(value));
            let missing = source.get_raw(Some(AccessPath::new(vec![5; 20], other))).unwrap();
            prop_assert_eq!(missing.error_code, DsErrorCode::NoData);
        }
    }
}
