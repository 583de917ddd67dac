//! Unified message model shared by both trace sources.
//!
//! Messages are stored in an arena (`MessageSequence`) whose index is the
//! message's `sequence_id`. Parent and child links are indices into that
//! arena, so the whole structure serializes as a flat list.

use crate::aggregator::metrics::MessageStats;
use chrono::{DateTime, Utc};
use ethereum_types::{Address, U256};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of a message between two accounts
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MessageType {
    Call,
    Value,
    Create,
    Selfdestruct,
    DelegateCall,
    StaticCall,
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MessageType::Call => "call",
            MessageType::Value => "value",
            MessageType::Create => "create",
            MessageType::Selfdestruct => "selfdestruct",
            MessageType::DelegateCall => "delegatecall",
            MessageType::StaticCall => "staticcall",
        };
        f.write_str(name)
    }
}

/// One flattened call between two accounts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Pre-order rank across the whole call tree
    pub sequence_id: usize,

    #[serde(rename = "type")]
    pub message_type: MessageType,

    pub from: Address,

    /// Identity the message is sent on behalf of (differs from `from` only
    /// under delegatecall)
    pub delegated_from: Address,

    /// Missing for a failed create
    pub to: Option<Address>,

    pub value: U256,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub func_selector: Option<String>,

    pub inputs: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub outputs: Option<String>,

    pub gas_limit: U256,
    pub gas_used: U256,

    pub call_depth: usize,

    /// Index of the calling message, `None` for the root
    pub parent: Option<usize>,

    /// Indices of the messages this one made, in call order
    pub children: Vec<usize>,

    pub status: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Reason string already decoded by the node, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revert_reason: Option<String>,
}

/// Fields of a message a diagram label may show
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayFields {
    /// Present only when value was transferred
    pub value: Option<U256>,
    pub gas_used: U256,
    pub gas_limit: U256,
}

impl Message {
    /// Account whose lifeline the message lands on
    ///
    /// A create that failed before an address was assigned stays on the sender.
    pub fn lifeline(&self) -> Address {
        self.to.unwrap_or(self.from)
    }

    /// Identity whose storage and balance the callee executes against
    pub fn executing_identity(&self) -> Address {
        match self.message_type {
            MessageType::DelegateCall => self.delegated_from,
            _ => self.lifeline(),
        }
    }

    /// Whether the target runs code and therefore gets an activation bar
    pub fn is_executing(&self) -> bool {
        self.message_type != MessageType::Selfdestruct
    }

    pub fn display_fields(&self) -> DisplayFields {
        DisplayFields {
            value: (!self.value.is_zero()).then_some(self.value),
            gas_used: self.gas_used,
            gas_limit: self.gas_limit,
        }
    }
}

/// Attribute a message made from inside `parent` to the identity executing there
///
/// Under a delegatecall the code of `parent.to` runs as the parent's own
/// delegated identity, which chains through consecutive delegatecalls.
pub fn delegation_origin(parent: Option<&Message>, from: Address) -> Address {
    match parent {
        Some(parent) if parent.message_type == MessageType::DelegateCall => {
            parent.executing_identity()
        }
        _ => from,
    }
}

/// Arena of messages in `sequence_id` order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageSequence {
    messages: Vec<Message>,
}

impl MessageSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message, linking it under its parent
    ///
    /// The message's `sequence_id` and `children` are overwritten so the
    /// arena invariants hold regardless of what the caller passed in.
    pub(crate) fn push(&mut self, mut message: Message) -> usize {
        let id = self.messages.len();
        message.sequence_id = id;
        message.children.clear();
        if let Some(parent) = message.parent {
            self.messages[parent].children.push(id);
        }
        self.messages.push(message);
        id
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn get(&self, id: usize) -> Option<&Message> {
        self.messages.get(id)
    }

    pub fn root(&self) -> Option<&Message> {
        self.messages.first()
    }

    pub fn parent_of(&self, message: &Message) -> Option<&Message> {
        message.parent.and_then(|id| self.messages.get(id))
    }

    pub fn children_of<'a>(&'a self, message: &'a Message) -> impl Iterator<Item = &'a Message> + 'a {
        message.children.iter().filter_map(|id| self.messages.get(*id))
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Message> {
        self.messages.iter()
    }

    pub fn as_slice(&self) -> &[Message] {
        &self.messages
    }
}

impl<'a> IntoIterator for &'a MessageSequence {
    type Item = &'a Message;
    type IntoIter = std::slice::Iter<'a, Message>;

    fn into_iter(self) -> Self::IntoIter {
        self.messages.iter()
    }
}

/// Top-level transaction metadata, fetched once per transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionDetails {
    pub hash: String,
    pub nonce: u64,
    pub index: Option<u64>,
    pub value: U256,
    pub gas_price: U256,
    pub timestamp: Option<DateTime<Utc>>,
    pub status: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TransactionDetails {
    /// Details known only by hash, e.g. when rendering a saved trace
    pub fn from_hash(hash: impl Into<String>) -> Self {
        Self {
            hash: hash.into(),
            nonce: 0,
            index: None,
            value: U256::zero(),
            gas_price: U256::zero(),
            timestamp: None,
            status: true,
            error: None,
        }
    }
}

/// A transaction's metadata together with its unified message sequence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionTrace {
    pub details: TransactionDetails,
    pub messages: MessageSequence,
}

impl TransactionTrace {
    /// Attach messages to their transaction
    ///
    /// A failed root message marks the whole transaction as failed.
    pub fn new(mut details: TransactionDetails, messages: MessageSequence) -> Self {
        if let Some(root) = messages.root() {
            if !root.status {
                details.status = false;
                if details.error.is_none() {
                    details.error = root.error.clone();
                }
            }
        }
        Self { details, messages }
    }
}

/// Top-level report structure written to JSON
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceReport {
    /// Schema version for compatibility checking
    pub version: String,

    pub transaction: TransactionDetails,

    pub stats: MessageStats,

    pub messages: MessageSequence,

    /// Timestamp when the report was generated
    pub generated_at: String,
}
