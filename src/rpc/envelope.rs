//! JSON-RPC 2.0 request and response envelopes

use crate::error::{RelayerError, RelayerResult};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Every request goes out with this id; calls never overlap
pub const REQUEST_ID: u64 = 1;
pub const JSONRPC_VERSION: &str = "2.0";

#[derive(Debug, Clone, Serialize)]
pub struct RpcRequest {
    pub id: u64,
    pub jsonrpc: String,
    pub method: String,
    pub params: Vec<Value>,
}

impl RpcRequest {
    pub fn new(method: &str, params: Vec<Value>) -> Self {
        Self {
            id: REQUEST_ID,
            jsonrpc: JSONRPC_VERSION.to_string(),
            method: method.to_string(),
            params,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RpcResponse {
    #[serde(default)]
    pub id: Value,
    pub jsonrpc: String,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<RpcResponseError>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RpcResponseError {
    pub code: i64,
    pub message: String,
    #[serde(default)]
    pub data: Option<Value>,
}

impl RpcResponse {
    /// Parse a raw response body; anything that is not the envelope is a protocol error
    pub fn from_body(body: &str) -> RelayerResult<Self> {
        serde_json::from_str(body)
            .map_err(|e| RelayerError::Protocol(format!("malformed JSON-RPC response: {}", e)))
    }

    /// The remote error wins over any result that came with it
    pub fn into_result(self) -> RelayerResult<Value> {
        if let Some(error) = self.error {
            return Err(RelayerError::Rpc {
                code: error.code,
                message: error.message,
            });
        }
        self.result.ok_or_else(|| {
            RelayerError::Protocol("response carries neither result nor error".to_string())
        })
    }
}
