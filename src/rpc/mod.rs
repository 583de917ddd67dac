//! Clients for the two trace sources: a node's JSON-RPC endpoint and the message indexer.

pub mod client;
pub mod indexer;
pub mod types;

// Re-export main types
pub use client::RpcClient;
pub use indexer::IndexerClient;
