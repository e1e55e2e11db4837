//! Typed node queries over an owned transport

use super::envelope::{RpcRequest, RpcResponse};
use super::models::{RpcInvokeResult, RpcUnspent};
use super::transport::{HttpTransport, Transport};
use crate::config::RpcConfig;
use crate::error::{RelayerError, RelayerResult};

use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::debug;

/// Chain query facade: each method is exactly one request/response exchange
pub struct RpcClient {
    transport: Box<dyn Transport>,
}

impl RpcClient {
    pub fn new(transport: Box<dyn Transport>) -> Self {
        Self { transport }
    }

    pub fn from_config(config: &RpcConfig) -> RelayerResult<Self> {
        Ok(Self::new(Box::new(HttpTransport::new(config)?)))
    }

    /// Send a request and return the parsed envelope, remote error included
    pub async fn send(&self, request: &RpcRequest) -> RelayerResult<RpcResponse> {
        let body = serde_json::to_string(request)
            .map_err(|e| RelayerError::Protocol(format!("failed to encode request: {}", e)))?;

        debug!("RPC -> {}", request.method);
        let raw = self.transport.post(body).await?;
        RpcResponse::from_body(&raw)
    }

    /// Result of `method`; a remote error becomes `RelayerError::Rpc`
    pub async fn rpc_send(&self, method: &str, params: Vec<Value>) -> RelayerResult<Value> {
        self.send(&RpcRequest::new(method, params))
            .await?
            .into_result()
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, params: Vec<Value>) -> RelayerResult<T> {
        let result = self.rpc_send(method, params).await?;
        serde_json::from_value(result).map_err(|e| {
            RelayerError::Protocol(format!("unexpected result shape for {}: {}", method, e))
        })
    }

    /// Run a script in the node's VM without committing it
    pub async fn invoke_script(&self, script: &[u8]) -> RelayerResult<RpcInvokeResult> {
        self.call("invokescript", vec![json!(hex::encode(script))])
            .await
    }

    pub async fn get_unspents(&self, address: &str) -> RelayerResult<RpcUnspent> {
        self.call("getunspents", vec![json!(address)]).await
    }

    /// Broadcast a serialized transaction; `true` when the node accepted it
    pub async fn send_raw_transaction(&self, raw: &[u8]) -> RelayerResult<bool> {
        let result = self
            .rpc_send("sendrawtransaction", vec![json!(hex::encode(raw))])
            .await?;
        match result {
            Value::Bool(accepted) => Ok(accepted),
            Value::String(s) => s.parse().map_err(|_| {
                RelayerError::Protocol(format!("sendrawtransaction returned {:?}", s))
            }),
            other => Err(RelayerError::Protocol(format!(
                "sendrawtransaction returned {}",
                other
            ))),
        }
    }

    pub async fn get_block_count(&self) -> RelayerResult<u32> {
        self.call("getblockcount", vec![]).await
    }

    pub async fn get_best_block_hash(&self) -> RelayerResult<String> {
        self.call("getbestblockhash", vec![]).await
    }

    pub async fn get_connection_count(&self) -> RelayerResult<u32> {
        self.call("getconnectioncount", vec![]).await
    }
}
