//! HTTP client for the message indexer.
//!
//! Serves `MessagePageSource` for cursor pagination and looks up the
//! transaction resource for diagram metadata.

use crate::aggregator::indexer::{IndexerPage, MessagePageSource};
use crate::parser::schema::TransactionDetails;
use crate::parser::values::parse_quantity;
use crate::utils::config::{DEFAULT_PAGE_SIZE, DEFAULT_RPC_TIMEOUT};
use super::client::ensure_tx_hash;
use crate::utils::error::RpcError;
use chrono::{DateTime, Utc};
use ethereum_types::U256;
use log::{debug, info};
use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;

/// Header carrying the optional API key
const API_KEY_HEADER: &str = "x-api-key";

/// Indexer client over blocking HTTP
pub struct IndexerClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    page_size: usize,
}

impl IndexerClient {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Result<Self, RpcError> {
        let client = Client::builder()
            .timeout(DEFAULT_RPC_TIMEOUT)
            .build()
            .map_err(RpcError::RequestFailed)?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            page_size: DEFAULT_PAGE_SIZE,
        })
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn messages_url(&self, tx_hash: &str) -> String {
        format!("{}/transactions/{}/messages", self.base_url, tx_hash)
    }

    pub fn transaction_url(&self, tx_hash: &str) -> String {
        format!("{}/transactions/{}", self.base_url, tx_hash)
    }

    /// Fetch the transaction resource
    pub fn transaction_details(&self, tx_hash: &str) -> Result<TransactionDetails, RpcError> {
        ensure_tx_hash(tx_hash)?;
        info!("Fetching transaction details from indexer for: {}", tx_hash);
        let document: IndexerDocument<TransactionAttributes> =
            self.get(&self.transaction_url(tx_hash), &[], tx_hash)?;
        document.data.into_details()
    }

    fn get<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
        tx_hash: &str,
    ) -> Result<T, RpcError> {
        debug!("GET {} {:?}", url, query);

        let mut request = self.client.get(url).query(query);
        if let Some(key) = &self.api_key {
            request = request.header(API_KEY_HEADER, key);
        }

        let response = request.send().map_err(RpcError::RequestFailed)?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(RpcError::TransactionNotFound(tx_hash.to_string())),
            status if !status.is_success() => Err(RpcError::InvalidResponse(format!(
                "HTTP {}: {}",
                status,
                response.text().unwrap_or_default()
            ))),
            _ => response.json().map_err(RpcError::RequestFailed),
        }
    }
}

impl MessagePageSource for IndexerClient {
    fn name(&self) -> &str {
        &self.base_url
    }

    fn first_page(&self, tx_hash: &str) -> Result<IndexerPage, RpcError> {
        let query = [("page[size]", self.page_size.to_string())];
        self.get(&self.messages_url(tx_hash), &query, tx_hash)
    }

    fn page_after(&self, tx_hash: &str, cursor: &str) -> Result<IndexerPage, RpcError> {
        let query = [
            ("page[size]", self.page_size.to_string()),
            ("page[cursor]", cursor.to_string()),
        ];
        self.get(&self.messages_url(tx_hash), &query, tx_hash)
    }
}

/// JSON:API single-resource document
#[derive(Debug, Deserialize)]
pub struct IndexerDocument<A> {
    pub data: IndexerResource<A>,
}

#[derive(Debug, Deserialize)]
pub struct IndexerResource<A> {
    pub id: String,
    pub attributes: A,
}

/// Attributes of the indexer's transaction resource
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionAttributes {
    #[serde(default)]
    pub nonce: Option<serde_json::Value>,
    #[serde(default)]
    pub transaction_index: Option<serde_json::Value>,
    #[serde(default)]
    pub value: Option<serde_json::Value>,
    #[serde(default)]
    pub gas_price: Option<serde_json::Value>,
    /// RFC 3339 string or unix seconds
    #[serde(default)]
    pub timestamp: Option<serde_json::Value>,
    #[serde(default)]
    pub status: Option<bool>,
    #[serde(default)]
    pub error: Option<String>,
}

impl IndexerResource<TransactionAttributes> {
    /// Convert the resource into transaction details
    pub fn into_details(self) -> Result<TransactionDetails, RpcError> {
        let attributes = self.attributes;
        let timestamp = attributes.timestamp.as_ref().map(parse_timestamp).transpose()?;

        Ok(TransactionDetails {
            hash: self.id,
            nonce: json_quantity(attributes.nonce.as_ref(), "nonce")?.low_u64(),
            index: attributes
                .transaction_index
                .as_ref()
                .map(|raw| json_quantity(Some(raw), "transactionIndex").map(|i| i.low_u64()))
                .transpose()?,
            value: json_quantity(attributes.value.as_ref(), "value")?,
            gas_price: json_quantity(attributes.gas_price.as_ref(), "gasPrice")?,
            timestamp,
            status: attributes.error.is_none() && attributes.status.unwrap_or(true),
            error: attributes.error,
        })
    }
}

/// Quantities arrive as JSON numbers or decimal/hex strings
fn json_quantity(raw: Option<&serde_json::Value>, field: &str) -> Result<U256, RpcError> {
    let invalid = |e: String| RpcError::InvalidResponse(format!("{}: {}", field, e));
    match raw {
        None | Some(serde_json::Value::Null) => Ok(U256::zero()),
        Some(serde_json::Value::Number(n)) => parse_quantity(&n.to_string()).map_err(invalid),
        Some(serde_json::Value::String(s)) => parse_quantity(s).map_err(invalid),
        Some(other) => Err(invalid(format!("unexpected value {}", other))),
    }
}

fn parse_timestamp(raw: &serde_json::Value) -> Result<DateTime<Utc>, RpcError> {
    let invalid = || RpcError::InvalidResponse(format!("timestamp: unexpected value {}", raw));
    match raw {
        serde_json::Value::String(s) => DateTime::parse_from_rfc3339(s)
            .map(|t| t.with_timezone(&Utc))
            .map_err(|_| invalid()),
        serde_json::Value::Number(n) => n
            .as_i64()
            .and_then(|seconds| DateTime::from_timestamp(seconds, 0))
            .ok_or_else(invalid),
        _ => Err(invalid()),
    }
}
