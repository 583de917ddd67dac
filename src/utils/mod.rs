//! Utility modules for configuration, error handling, and validation.

pub mod config;
pub mod error;
pub mod validation;

// Re-export commonly used error types for convenience
pub use error::{DecodeError, DiagramError, OutputError, RpcError, TraceError};
pub use validation::validate_tx_hash;
