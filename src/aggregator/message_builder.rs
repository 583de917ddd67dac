//! Build the unified message sequence from either trace source.
//!
//! A node trace arrives as a call tree and is flattened directly. Indexer
//! pages arrive as flat, depth-annotated records; they are concatenated,
//! ordered by message id and re-linked into a tree from their call depths.

use super::indexer::{IndexerPage, IndexerRecord};
use crate::parser::call_trace::{address_field, flatten_trace, quantity_field, CallRecord};
use crate::parser::schema::{delegation_origin, Message, MessageSequence, MessageType};
use crate::parser::values::function_selector;
use crate::utils::error::TraceError;
use crate::utils::validation::validate_tx_hash;
use log::{debug, warn};
use std::collections::HashSet;

/// Trace data as delivered by one of the two sources
#[derive(Debug, Clone)]
pub enum TraceInput {
    /// Call tree from a node's `callTracer`
    NodeTrace(CallRecord),

    /// Pages of indexed messages, in cursor order
    Indexer(Vec<IndexerPage>),
}

/// Resolve either source into the unified message sequence
///
/// **Public** - main entry point for the message model
///
/// # Errors
/// * `TraceError::InvalidTxHash` - before any record is looked at
/// * `TraceError::InvalidField` / `MissingField` - a record cannot be converted
pub fn build_messages(tx_hash: &str, input: &TraceInput) -> Result<MessageSequence, TraceError> {
    validate_tx_hash(tx_hash)?;

    match input {
        TraceInput::NodeTrace(root) => flatten_trace(tx_hash, root),
        TraceInput::Indexer(pages) => messages_from_pages(tx_hash, pages),
    }
}

/// Map an indexer tag onto a message type
///
/// Transaction-level and internal variants share a type; unknown tags are calls.
pub fn classify_tag(tag: &str) -> MessageType {
    match tag.to_lowercase().as_str() {
        "transaction" | "call" | "transaction-call" | "internal-call" => MessageType::Call,
        "value" | "transaction-value" | "internal-value" => MessageType::Value,
        "create" | "create2" | "transaction-create" | "internal-create" => MessageType::Create,
        "selfdestruct" | "suicide" | "internal-selfdestruct" => MessageType::Selfdestruct,
        "delegatecall" | "internal-delegatecall" => MessageType::DelegateCall,
        "staticcall" | "internal-staticcall" => MessageType::StaticCall,
        _ => MessageType::Call,
    }
}

/// Concatenate pages, order records by id and rebuild the call tree
fn messages_from_pages(tx_hash: &str, pages: &[IndexerPage]) -> Result<MessageSequence, TraceError> {
    let mut records: Vec<(u64, &IndexerRecord)> = Vec::new();
    let mut seen = HashSet::new();

    for record in pages.iter().flat_map(|page| page.data.iter()) {
        let id = record.id.trim().parse::<u64>().map_err(|e| TraceError::InvalidField {
            tx_hash: tx_hash.to_string(),
            message_id: record.id.clone(),
            field: "id",
            value: record.id.clone(),
            reason: e.to_string(),
        })?;

        if seen.insert(id) {
            records.push((id, record));
        } else {
            warn!("Dropping duplicate message {} of {}", id, tx_hash);
        }
    }

    // Pages should already be ordered; sorting keeps the output deterministic when they are not
    records.sort_by_key(|(id, _)| *id);

    let mut messages = MessageSequence::new();
    // Open ancestors of the next record, outermost first
    let mut ancestors: Vec<usize> = Vec::new();

    for (id, record) in records {
        let depth = record.attributes.call_depth.ok_or_else(|| TraceError::MissingField {
            tx_hash: tx_hash.to_string(),
            message_id: id.to_string(),
            field: "callDepth",
        })?;

        let valid_depth = if messages.is_empty() {
            depth == 0
        } else {
            depth >= 1 && depth <= ancestors.len()
        };
        if !valid_depth {
            return Err(TraceError::InvalidField {
                tx_hash: tx_hash.to_string(),
                message_id: id.to_string(),
                field: "callDepth",
                value: depth.to_string(),
                reason: format!("expected a depth between 1 and {}", ancestors.len().max(1)),
            });
        }

        ancestors.truncate(depth);
        let parent = ancestors.last().copied();
        let message = build_message(tx_hash, id, record, depth, parent.and_then(|p| messages.get(p)))?;
        ancestors.push(messages.push(message));
    }

    debug!("Built {} messages from {} indexer pages for {}", messages.len(), pages.len(), tx_hash);
    Ok(messages)
}

fn build_message(
    tx_hash: &str,
    id: u64,
    record: &IndexerRecord,
    depth: usize,
    parent: Option<&Message>,
) -> Result<Message, TraceError> {
    let attributes = &record.attributes;
    let message_type = attributes
        .message_type
        .as_deref()
        .map(classify_tag)
        .unwrap_or(MessageType::Call);

    let from_id = record
        .relationships
        .from
        .as_ref()
        .and_then(|r| r.id())
        .ok_or_else(|| TraceError::MissingField {
            tx_hash: tx_hash.to_string(),
            message_id: id.to_string(),
            field: "from",
        })?;
    let from = address_field(tx_hash, id, "from", from_id)?;

    let to = match record.relationships.to.as_ref().and_then(|r| r.id()) {
        Some(to_id) => Some(address_field(tx_hash, id, "to", to_id)?),
        None if message_type == MessageType::Create => None,
        None => {
            return Err(TraceError::MissingField {
                tx_hash: tx_hash.to_string(),
                message_id: id.to_string(),
                field: "to",
            })
        }
    };

    let inputs = attributes.input.clone().unwrap_or_else(|| "0x".to_string());
    let status = attributes.error.is_none() && attributes.status.unwrap_or(true);

    Ok(Message {
        sequence_id: 0,
        message_type,
        from,
        delegated_from: delegation_origin(parent, from),
        to,
        value: quantity_field(tx_hash, id, "value", attributes.value.as_deref())?,
        func_selector: function_selector(&inputs),
        inputs,
        outputs: attributes.output.clone(),
        gas_limit: quantity_field(tx_hash, id, "gasLimit", attributes.gas_limit.as_deref())?,
        gas_used: quantity_field(tx_hash, id, "gasUsed", attributes.gas_used.as_deref())?,
        call_depth: depth,
        parent: parent.map(|p| p.sequence_id),
        children: Vec::new(),
        status,
        error: attributes.error.clone(),
        revert_reason: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_tag() {
        assert_eq!(classify_tag("transaction"), MessageType::Call);
        assert_eq!(classify_tag("internal-value"), MessageType::Value);
        assert_eq!(classify_tag("TRANSACTION-VALUE"), MessageType::Value);
        assert_eq!(classify_tag("internal-create"), MessageType::Create);
        assert_eq!(classify_tag("suicide"), MessageType::Selfdestruct);
        assert_eq!(classify_tag("internal-delegatecall"), MessageType::DelegateCall);
        assert_eq!(classify_tag("staticcall"), MessageType::StaticCall);
        assert_eq!(classify_tag("something-new"), MessageType::Call);
    }
}
