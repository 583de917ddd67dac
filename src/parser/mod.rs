//! Trace parsing and the unified message model.
//!
//! This module handles:
//! - Parsing raw `callTracer` JSON into call records
//! - Flattening call trees into ordered messages
//! - Decoding revert reasons from return data
//! - Defining the message and report schema

pub mod call_trace;
pub mod revert;
pub mod schema;
pub mod values;

// Re-export main types
pub use call_trace::{flatten_trace, parse_call_trace, CallKind, CallRecord};
pub use revert::{decode_revert_reason, encode_revert_reason};
pub use schema::{
    delegation_origin, DisplayFields, Message, MessageSequence, MessageType, TraceReport,
    TransactionDetails, TransactionTrace,
};
