//! Types for JSON-RPC communication with an Ethereum node.
//!
//! Only the fields the diagram needs are modelled; quantities stay as the
//! node's hex strings and are parsed when converted to `TransactionDetails`.

use serde::{Deserialize, Serialize};

/// JSON-RPC 2.0 request structure
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub method: String,
    pub params: serde_json::Value,
    pub id: u64,
}

impl JsonRpcRequest {
    pub fn new(method: &str, params: serde_json::Value, id: u64) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            method: method.to_string(),
            params,
            id,
        }
    }
}

/// JSON-RPC 2.0 response structure
#[derive(Debug, Deserialize)]
pub struct JsonRpcResponse<T> {
    #[serde(default)]
    pub jsonrpc: String,
    #[serde(default)]
    pub id: u64,
    pub result: Option<T>,
    #[serde(default)]
    pub error: Option<JsonRpcError>,
}

/// JSON-RPC error object
#[derive(Debug, Deserialize)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

/// Raw `callTracer` output, parsed later by `parser::parse_call_trace`
pub type RawTraceData = serde_json::Value;

/// Subset of `eth_getTransactionByHash`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcTransaction {
    pub hash: String,
    pub nonce: String,
    #[serde(default)]
    pub transaction_index: Option<String>,
    #[serde(default)]
    pub block_number: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub gas_price: Option<String>,
}

/// Subset of `eth_getTransactionReceipt`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcReceipt {
    /// `0x1` on success, `0x0` on revert; absent before Byzantium
    #[serde(default)]
    pub status: Option<String>,
}

/// Subset of `eth_getBlockByNumber`
#[derive(Debug, Clone, Deserialize)]
pub struct RpcBlock {
    pub timestamp: String,
}
