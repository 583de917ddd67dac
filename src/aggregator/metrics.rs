//! Summary statistics over a unified message sequence.
//!
//! Counts messages by type, failures and depth, and totals the value moved
//! between accounts.

use crate::parser::schema::{MessageSequence, MessageType};
use crate::parser::values::format_ether;
use ethereum_types::{Address, U256};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Message statistics for one transaction
///
/// **Public** - embedded in the JSON report and printed by `--summary`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageStats {
    /// Number of messages
    pub total: usize,

    /// Messages per type, in type order
    pub by_type: BTreeMap<MessageType, usize>,

    /// Messages with `status == false`
    pub failed: usize,

    /// Deepest call depth reached
    pub max_depth: usize,

    /// Sum of value carried by every message
    pub total_value: U256,

    /// Distinct accounts appearing as sender or receiver
    pub participants: usize,
}

impl MessageStats {
    /// Calculate statistics from a message sequence
    ///
    /// **Public** - main entry point for metrics calculation
    pub fn from_messages(messages: &MessageSequence) -> Self {
        if messages.is_empty() {
            return Self::default();
        }

        let mut stats = Self::default();
        let mut participants: BTreeSet<Address> = BTreeSet::new();

        for message in messages {
            stats.total += 1;
            *stats.by_type.entry(message.message_type).or_insert(0) += 1;

            if !message.status {
                stats.failed += 1;
            }

            stats.max_depth = stats.max_depth.max(message.call_depth);
            // Saturate rather than wrap on absurd inputs
            stats.total_value = stats.total_value.saturating_add(message.value);

            participants.insert(message.from);
            if let Some(to) = message.to {
                participants.insert(to);
            }
        }

        stats.participants = participants.len();
        debug!("Message stats: {}", stats.summary());
        stats
    }

    /// Count for one message type, zero when absent
    pub fn count(&self, message_type: MessageType) -> usize {
        self.by_type.get(&message_type).copied().unwrap_or(0)
    }

    /// Get human-readable summary
    ///
    /// **Public** - for logging and the `--summary` flag
    pub fn summary(&self) -> String {
        let types = self
            .by_type
            .iter()
            .map(|(kind, count)| format!("{}={}", kind, count))
            .collect::<Vec<_>>()
            .join(", ");

        format!(
            "Messages: {} ({}) | Failed: {} | Max depth: {} | Participants: {} | Value: {}",
            self.total,
            types,
            self.failed,
            self.max_depth,
            self.participants,
            format_ether(&self.total_value)
        )
    }
}
