//! Call tree parser and flattener for `callTracer` output.
//!
//! Parses the nested response of `debug_traceTransaction` into `CallRecord`s
//! and flattens the tree into a pre-ordered `MessageSequence`.

use super::schema::{delegation_origin, Message, MessageSequence, MessageType};
use super::values::{function_selector, parse_address, parse_quantity};
use crate::utils::error::TraceError;
use crate::utils::validation::validate_tx_hash;
use ethereum_types::{Address, U256};
use log::debug;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use std::fmt;

/// Source name used in error context
const NODE_SOURCE: &str = "node call trace";

/// Opcode that opened a call frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallKind {
    Call,
    CallCode,
    Create,
    Create2,
    DelegateCall,
    StaticCall,
    Selfdestruct,
    Unknown,
}

impl std::str::FromStr for CallKind {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_uppercase().as_str() {
            "CALL" => Self::Call,
            "CALLCODE" => Self::CallCode,
            "CREATE" => Self::Create,
            "CREATE2" => Self::Create2,
            "DELEGATECALL" => Self::DelegateCall,
            "STATICCALL" => Self::StaticCall,
            "SELFDESTRUCT" | "SUICIDE" => Self::Selfdestruct,
            _ => Self::Unknown,
        })
    }
}

impl<'de> Deserialize<'de> for CallKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(raw.parse().unwrap_or(CallKind::Unknown))
    }
}

impl CallKind {
    pub fn message_type(self) -> MessageType {
        match self {
            CallKind::Call | CallKind::CallCode => MessageType::Call,
            CallKind::DelegateCall => MessageType::DelegateCall,
            CallKind::StaticCall => MessageType::StaticCall,
            CallKind::Create | CallKind::Create2 => MessageType::Create,
            CallKind::Selfdestruct => MessageType::Selfdestruct,
            CallKind::Unknown => MessageType::Call,
        }
    }
}

/// One frame of the raw call tree
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallRecord {
    #[serde(rename = "type")]
    pub kind: CallKind,

    pub from: String,

    #[serde(default)]
    pub to: Option<String>,

    #[serde(default)]
    pub input: Option<String>,

    #[serde(default)]
    pub output: Option<String>,

    #[serde(default, deserialize_with = "deserialize_quantity")]
    pub value: Option<String>,

    #[serde(default, rename = "gas", alias = "gasLimit", deserialize_with = "deserialize_quantity")]
    pub gas_limit: Option<String>,

    #[serde(default, deserialize_with = "deserialize_quantity")]
    pub gas_used: Option<String>,

    #[serde(default)]
    pub error: Option<String>,

    #[serde(default)]
    pub revert_reason: Option<String>,

    #[serde(default, rename = "calls", alias = "children")]
    pub children: Vec<CallRecord>,
}

impl CallRecord {
    /// Number of frames in this subtree, including itself
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(CallRecord::node_count).sum::<usize>()
    }
}

/// Accept quantities as JSON strings or numbers
pub(crate) fn deserialize_quantity<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<serde_json::Value>::deserialize(deserializer)? {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::String(s)) => Ok(Some(s)),
        Some(serde_json::Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(D::Error::custom(format!(
            "expected number or string quantity, found {}",
            other
        ))),
    }
}

/// Parse a raw `callTracer` response into its root call
///
/// **Public** - entry point for node traces
///
/// Accepts the call object itself or a JSON-RPC envelope with a `result` field.
///
/// # Errors
/// * `TraceError::InvalidTxHash` - hash is malformed (checked first)
/// * `TraceError::MissingRootCall` - no top-level call object
/// * `TraceError::MalformedTrace` - call object does not match the expected shape
pub fn parse_call_trace(tx_hash: &str, raw_trace: &serde_json::Value) -> Result<CallRecord, TraceError> {
    validate_tx_hash(tx_hash)?;

    let root = match raw_trace.get("result") {
        Some(result) if !raw_trace.get("type").is_some_and(|t| t.is_string()) => result,
        _ => raw_trace,
    };

    if !root.is_object() {
        return Err(TraceError::MissingRootCall {
            tx_hash: tx_hash.to_string(),
            source_name: NODE_SOURCE.to_string(),
        });
    }

    let record = CallRecord::deserialize(root).map_err(|cause| TraceError::MalformedTrace {
        tx_hash: tx_hash.to_string(),
        source_name: NODE_SOURCE.to_string(),
        cause,
    })?;

    debug!("Parsed call tree with {} frames for {}", record.node_count(), tx_hash);
    Ok(record)
}

/// Flatten a call tree into messages in execution order
///
/// **Public** - main entry point for flattening
///
/// Frames are visited in pre-order with an explicit work stack, so a parent
/// always receives its `sequence_id` before any of its children.
///
/// # Errors
/// * `TraceError::InvalidTxHash` - hash is malformed (checked first)
/// * `TraceError::InvalidField` / `MissingField` - a frame carries an
///   unparseable address or quantity
pub fn flatten_trace(tx_hash: &str, root: &CallRecord) -> Result<MessageSequence, TraceError> {
    validate_tx_hash(tx_hash)?;

    let mut messages = MessageSequence::new();
    let mut pending: Vec<(&CallRecord, Option<usize>, usize)> = vec![(root, None, 0)];

    while let Some((record, parent, depth)) = pending.pop() {
        let id = messages.len();
        let message = build_message(tx_hash, id, record, parent.and_then(|p| messages.get(p)), depth)?;
        let id = messages.push(message);

        // Reversed so the first child is popped next
        for child in record.children.iter().rev() {
            pending.push((child, Some(id), depth + 1));
        }
    }

    debug!("Flattened {} messages for {}", messages.len(), tx_hash);
    Ok(messages)
}

/// Convert one frame into a message, attributing it under `parent`
fn build_message(
    tx_hash: &str,
    id: usize,
    record: &CallRecord,
    parent: Option<&Message>,
    depth: usize,
) -> Result<Message, TraceError> {
    if record.kind == CallKind::Unknown {
        debug!("Message {} of {} has an unknown call type, treating as call", id, tx_hash);
    }

    let from = address_field(tx_hash, id, "from", &record.from)?;
    let to = match record.to.as_deref() {
        None | Some("") => None,
        Some(raw) => Some(address_field(tx_hash, id, "to", raw)?),
    };

    let message_type = record.kind.message_type();
    if to.is_none() && message_type != MessageType::Create {
        return Err(TraceError::MissingField {
            tx_hash: tx_hash.to_string(),
            message_id: id.to_string(),
            field: "to",
        });
    }

    let inputs = record.input.clone().unwrap_or_else(|| "0x".to_string());

    Ok(Message {
        sequence_id: id,
        message_type,
        from,
        delegated_from: delegation_origin(parent, from),
        to,
        value: quantity_field(tx_hash, id, "value", record.value.as_deref())?,
        func_selector: function_selector(&inputs),
        inputs,
        outputs: record.output.clone(),
        gas_limit: quantity_field(tx_hash, id, "gasLimit", record.gas_limit.as_deref())?,
        gas_used: quantity_field(tx_hash, id, "gasUsed", record.gas_used.as_deref())?,
        call_depth: depth,
        parent: parent.map(|p| p.sequence_id),
        children: Vec::new(),
        status: record.error.is_none(),
        error: record.error.clone(),
        revert_reason: record.revert_reason.clone(),
    })
}

pub(crate) fn address_field(
    tx_hash: &str,
    message_id: impl fmt::Display,
    field: &'static str,
    raw: &str,
) -> Result<Address, TraceError> {
    parse_address(raw).map_err(|reason| TraceError::InvalidField {
        tx_hash: tx_hash.to_string(),
        message_id: message_id.to_string(),
        field,
        value: raw.to_string(),
        reason,
    })
}

/// Absent quantities are zero; present ones must parse
pub(crate) fn quantity_field(
    tx_hash: &str,
    message_id: impl fmt::Display,
    field: &'static str,
    raw: Option<&str>,
) -> Result<U256, TraceError> {
    match raw {
        None => Ok(U256::zero()),
        Some(raw) => parse_quantity(raw).map_err(|reason| TraceError::InvalidField {
            tx_hash: tx_hash.to_string(),
            message_id: message_id.to_string(),
            field,
            value: raw.to_string(),
            reason,
        }),
    }
}
