//! Error types for the entire application.
//!
//! We use `thiserror` for library-style errors with custom types,
//! and `anyhow` for application-level error propagation in main.rs and commands.

use thiserror::Error;

/// Errors that can occur while talking to a node or an indexer
#[derive(Error, Debug)]
pub enum RpcError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("Invalid RPC response: {0}")]
    InvalidResponse(String),

    #[error("Transaction not found: {0}")]
    TransactionNotFound(String),

    #[error("Refusing to query malformed transaction hash \"{0}\"")]
    InvalidTxHash(String),

    #[error("Tracer not supported by this RPC endpoint")]
    TracerNotSupported,
}

/// Errors raised while turning a fetched trace into messages
///
/// Every variant carries the transaction hash so the caller can log it verbatim.
#[derive(Error, Debug)]
pub enum TraceError {
    #[error("Invalid transaction hash \"{0}\": expected 0x followed by 64 hex characters")]
    InvalidTxHash(String),

    #[error("Transaction {tx_hash}: message {message_id}: invalid `{field}` value \"{value}\": {reason}")]
    InvalidField {
        tx_hash: String,
        message_id: String,
        field: &'static str,
        value: String,
        reason: String,
    },

    #[error("Transaction {tx_hash}: message {message_id}: missing required field `{field}`")]
    MissingField {
        tx_hash: String,
        message_id: String,
        field: &'static str,
    },

    #[error("Transaction {tx_hash}: {source_name} returned no usable top-level call")]
    MissingRootCall { tx_hash: String, source_name: String },

    #[error("Transaction {tx_hash}: malformed {source_name} response: {cause}")]
    MalformedTrace {
        tx_hash: String,
        source_name: String,
        #[source]
        cause: serde_json::Error,
    },

    #[error("Transaction {tx_hash}: {source_name} page {page} signalled more results but carried no cursor")]
    MissingCursor {
        tx_hash: String,
        source_name: String,
        page: usize,
    },

    #[error("Transaction {tx_hash}: {source_name} repeated cursor \"{cursor}\"")]
    RepeatedCursor {
        tx_hash: String,
        source_name: String,
        cursor: String,
    },

    #[error("Transaction {tx_hash}: failed to fetch from {source_name}: {cause}")]
    Fetch {
        tx_hash: String,
        source_name: String,
        #[source]
        cause: RpcError,
    },
}

/// Errors from revert reason decoding
///
/// Never fatal: callers treat any of these as "reason unavailable".
#[derive(Error, Debug, PartialEq)]
pub enum DecodeError {
    #[error("Return data is not valid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    #[error("Return data too short: {0} bytes")]
    TooShort(usize),

    #[error("Unknown revert selector 0x{0}")]
    UnknownSelector(String),

    #[error("Declared reason length {declared} exceeds {available} available bytes")]
    LengthOutOfBounds { declared: String, available: usize },

    #[error("Revert reason is not valid UTF-8")]
    InvalidUtf8(#[from] std::str::Utf8Error),
}

/// Errors that can occur during diagram synthesis
#[derive(Error, Debug)]
pub enum DiagramError {
    #[error(transparent)]
    Trace(#[from] TraceError),

    #[error("Transaction {0} has no messages to draw")]
    EmptyTrace(String),

    #[error("Transaction {tx_hash}: message {message_id} has parent {parent} which is not an open activation")]
    UnbalancedActivation {
        tx_hash: String,
        message_id: usize,
        parent: usize,
    },
}

/// Errors that can occur during file output
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Failed to write file: {0}")]
    WriteFailed(#[from] std::io::Error),

    #[error("Failed to serialize JSON: {0}")]
    SerializationFailed(#[from] serde_json::Error),

    #[error("Invalid output path: {0}")]
    InvalidPath(String),

    #[error("Not a PlantUML diagram: {0}")]
    InvalidDiagram(String),

    #[error("Unsupported report version {found}, expected {expected}")]
    UnsupportedVersion { found: String, expected: String },
}
