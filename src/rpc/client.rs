//! HTTP client for an Ethereum node's JSON-RPC endpoint.

use super::types::{JsonRpcError, JsonRpcRequest, JsonRpcResponse, RawTraceData, RpcBlock, RpcReceipt, RpcTransaction};
use crate::parser::schema::TransactionDetails;
use crate::parser::values::parse_quantity;
use crate::utils::config::{CALL_TRACER, DEFAULT_RPC_TIMEOUT};
use crate::utils::error::RpcError;
use crate::utils::validation::validate_tx_hash;
use chrono::DateTime;
use ethereum_types::U256;
use log::{debug, info, warn};
use reqwest::blocking::Client;
use serde::de::DeserializeOwned;
use std::sync::atomic::{AtomicU64, Ordering};

/// RPC client for fetching call traces and transaction metadata
pub struct RpcClient {
    client: Client,
    rpc_url: String,
    next_id: AtomicU64,
}

impl RpcClient {
    /// Create a new RPC client
    pub fn new(rpc_url: impl Into<String>) -> Result<Self, RpcError> {
        let client = Client::builder()
            .timeout(DEFAULT_RPC_TIMEOUT)
            .build()
            .map_err(RpcError::RequestFailed)?;

        Ok(Self {
            client,
            rpc_url: rpc_url.into(),
            next_id: AtomicU64::new(1),
        })
    }

    pub fn rpc_url(&self) -> &str {
        &self.rpc_url
    }

    /// Fetch the nested call tree of a transaction via `callTracer`
    pub fn debug_trace_call_tree(&self, tx_hash: &str) -> Result<RawTraceData, RpcError> {
        ensure_tx_hash(tx_hash)?;
        info!("Fetching call trace for transaction: {}", tx_hash);

        let params = serde_json::json!([tx_hash, { "tracer": CALL_TRACER }]);
        self.request::<RawTraceData>("debug_traceTransaction", params, tx_hash)?
            .filter(|trace| !trace.is_null())
            .ok_or_else(|| RpcError::TransactionNotFound(tx_hash.to_string()))
    }

    /// Fetch nonce, position, value, gas price, status and block time
    ///
    /// A missing receipt or block degrades to defaults; a missing transaction is an error.
    pub fn transaction_details(&self, tx_hash: &str) -> Result<TransactionDetails, RpcError> {
        ensure_tx_hash(tx_hash)?;
        info!("Fetching transaction details for: {}", tx_hash);

        let transaction: RpcTransaction = self
            .request("eth_getTransactionByHash", serde_json::json!([tx_hash]), tx_hash)?
            .ok_or_else(|| RpcError::TransactionNotFound(tx_hash.to_string()))?;

        let receipt: Option<RpcReceipt> =
            self.request("eth_getTransactionReceipt", serde_json::json!([tx_hash]), tx_hash)?;
        if receipt.is_none() {
            warn!("No receipt for {}, assuming success", tx_hash);
        }

        let block: Option<RpcBlock> = match transaction.block_number.as_deref() {
            Some(number) => self.request(
                "eth_getBlockByNumber",
                serde_json::json!([number, false]),
                tx_hash,
            )?,
            None => None,
        };

        details_from_rpc(&transaction, receipt.as_ref(), block.as_ref())
    }

    /// Send one JSON-RPC request; a `null` result comes back as `None`
    fn request<T: DeserializeOwned>(
        &self,
        method: &str,
        params: serde_json::Value,
        tx_hash: &str,
    ) -> Result<Option<T>, RpcError> {
        let request = JsonRpcRequest::new(method, params, self.next_id.fetch_add(1, Ordering::Relaxed));
        debug!("RPC request: {:?}", request);

        let response = self
            .client
            .post(&self.rpc_url)
            .json(&request)
            .send()
            .map_err(RpcError::RequestFailed)?;

        if !response.status().is_success() {
            return Err(RpcError::InvalidResponse(format!(
                "HTTP {}: {}",
                response.status(),
                response.text().unwrap_or_default()
            )));
        }

        let rpc_response: JsonRpcResponse<T> = response.json().map_err(RpcError::RequestFailed)?;

        if let Some(error) = rpc_response.error {
            return Err(map_rpc_error(error, tx_hash));
        }

        Ok(rpc_response.result)
    }
}

/// Convert node responses into transaction details
pub fn details_from_rpc(
    transaction: &RpcTransaction,
    receipt: Option<&RpcReceipt>,
    block: Option<&RpcBlock>,
) -> Result<TransactionDetails, RpcError> {
    let nonce = quantity(&transaction.nonce, "nonce")?;
    if nonce > U256::from(u64::MAX) {
        return Err(RpcError::InvalidResponse(format!("nonce out of range: {}", nonce)));
    }

    let index = transaction
        .transaction_index
        .as_deref()
        .map(|raw| quantity(raw, "transactionIndex").map(|i| i.low_u64()))
        .transpose()?;

    let status = match receipt.and_then(|r| r.status.as_deref()) {
        Some(raw) => !quantity(raw, "status")?.is_zero(),
        None => true,
    };

    let timestamp = match block {
        Some(block) => {
            let seconds = quantity(&block.timestamp, "timestamp")?;
            i64::try_from(seconds.low_u64())
                .ok()
                .and_then(|seconds| DateTime::from_timestamp(seconds, 0))
        }
        None => None,
    };

    Ok(TransactionDetails {
        hash: transaction.hash.clone(),
        nonce: nonce.low_u64(),
        index,
        value: optional_quantity(transaction.value.as_deref(), "value")?,
        gas_price: optional_quantity(transaction.gas_price.as_deref(), "gasPrice")?,
        timestamp,
        status,
        error: None,
    })
}

fn quantity(raw: &str, field: &str) -> Result<U256, RpcError> {
    parse_quantity(raw).map_err(|e| RpcError::InvalidResponse(format!("{}: {}", field, e)))
}

fn optional_quantity(raw: Option<&str>, field: &str) -> Result<U256, RpcError> {
    raw.map(|raw| quantity(raw, field))
        .transpose()
        .map(Option::unwrap_or_default)
}

/// Reject a malformed hash before any request leaves the process
pub(crate) fn ensure_tx_hash(tx_hash: &str) -> Result<(), RpcError> {
    validate_tx_hash(tx_hash).map_err(|_| RpcError::InvalidTxHash(tx_hash.to_string()))
}

/// Map JSON-RPC error to our error type
fn map_rpc_error(error: JsonRpcError, tx_hash: &str) -> RpcError {
    match error.code {
        -32000 => {
            if error.message.to_lowercase().contains("not found") {
                RpcError::TransactionNotFound(tx_hash.to_string())
            } else {
                RpcError::InvalidResponse(error.message)
            }
        }
        -32601 => RpcError::TracerNotSupported,
        _ => RpcError::InvalidResponse(format!("{}: {}", error.code, error.message)),
    }
}
