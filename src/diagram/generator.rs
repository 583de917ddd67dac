//! PlantUML sequence diagram generation from a unified message sequence.
//!
//! Each message becomes one arrow leaving its parent's lifeline. Executing
//! targets are activated on arrival, and an explicit stack of open
//! activations decides when returns are drawn: before a message is emitted
//! every activation above its parent is closed, innermost first.

use crate::parser::revert::decode_revert_reason;
use crate::parser::schema::{Message, MessageSequence, MessageType, TransactionDetails, TransactionTrace};
use crate::parser::values::{format_ether, short_address};
use crate::utils::config::{
    ARROW_CALL, ARROW_CREATE, ARROW_DELEGATE_CALL, ARROW_FAILED_RETURN, ARROW_RETURN,
    ARROW_SELFDESTRUCT, ARROW_STATIC_CALL, ARROW_VALUE, FAILURE_NOTE_COLOR,
};
use crate::utils::error::DiagramError;
use crate::utils::validation::validate_tx_hash;
use ethereum_types::Address;
use log::debug;
use std::collections::{BTreeMap, HashSet};
use std::fmt::Write as _;

/// Diagram configuration
#[derive(Debug, Clone)]
pub struct DiagramConfig {
    /// Overrides the default `Transaction <hash>` title
    pub title: Option<String>,

    /// Show gas used / gas limit on every arrow
    pub show_gas: bool,

    /// Show the transaction header line and transferred value
    pub show_details: bool,

    /// Known contract names by address
    pub contract_names: BTreeMap<Address, String>,

    /// Known function names by `0x`-prefixed selector
    pub function_names: BTreeMap<String, String>,
}

impl Default for DiagramConfig {
    fn default() -> Self {
        Self {
            title: None,
            show_gas: false,
            show_details: true,
            contract_names: BTreeMap::new(),
            function_names: BTreeMap::new(),
        }
    }
}

impl DiagramConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_gas(mut self, show_gas: bool) -> Self {
        self.show_gas = show_gas;
        self
    }

    pub fn with_details(mut self, show_details: bool) -> Self {
        self.show_details = show_details;
        self
    }

    pub fn with_contract_name(mut self, address: Address, name: impl Into<String>) -> Self {
        self.contract_names.insert(address, name.into());
        self
    }

    /// Selectors are matched lowercase
    pub fn with_function_name(mut self, selector: &str, name: impl Into<String>) -> Self {
        self.function_names.insert(selector.to_lowercase(), name.into());
        self
    }
}

/// Generate a PlantUML sequence diagram for a transaction
///
/// **Public** - main entry point for diagram synthesis
///
/// The output depends only on the trace and the config, so generating twice
/// yields byte-identical text.
///
/// # Errors
/// * `DiagramError::Trace` - the transaction hash is malformed (checked first)
/// * `DiagramError::EmptyTrace` - there are no messages
/// * `DiagramError::UnbalancedActivation` - a message's parent is not an open activation
pub fn generate_diagram(trace: &TransactionTrace, config: &DiagramConfig) -> Result<String, DiagramError> {
    let tx_hash = trace.details.hash.as_str();
    validate_tx_hash(tx_hash)?;

    let messages = &trace.messages;
    if messages.is_empty() {
        return Err(DiagramError::EmptyTrace(tx_hash.to_string()));
    }

    debug!("Generating sequence diagram with {} messages", messages.len());

    let mut diagram = Diagram::new(config);
    diagram.line("@startuml");
    diagram.preamble(&trace.details);
    diagram.participants(messages);
    diagram.blank();
    diagram.messages(tx_hash, messages)?;
    diagram.line("@enduml");

    let text = diagram.finish();
    debug!("Diagram generated successfully ({} bytes)", text.len());
    Ok(text)
}

/// PlantUML alias of an account lifeline
pub fn participant_alias(address: &Address) -> String {
    format!("c{:x}", address)
}

/// Arrow style for a message type
pub fn arrow_for(message_type: MessageType) -> &'static str {
    match message_type {
        MessageType::Call => ARROW_CALL,
        MessageType::StaticCall => ARROW_STATIC_CALL,
        MessageType::DelegateCall => ARROW_DELEGATE_CALL,
        MessageType::Value => ARROW_VALUE,
        MessageType::Create => ARROW_CREATE,
        MessageType::Selfdestruct => ARROW_SELFDESTRUCT,
    }
}

/// Accumulates diagram text
///
/// **Private** - internal state of one `generate_diagram` call
struct Diagram<'a> {
    config: &'a DiagramConfig,
    out: String,
    /// Executing messages whose activation is still open, outermost first
    open: Vec<usize>,
}

impl<'a> Diagram<'a> {
    fn new(config: &'a DiagramConfig) -> Self {
        Self {
            config,
            out: String::new(),
            open: Vec::new(),
        }
    }

    fn line(&mut self, text: &str) {
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn blank(&mut self) {
        self.out.push('\n');
    }

    fn finish(self) -> String {
        self.out
    }

    fn preamble(&mut self, details: &TransactionDetails) {
        let title = self
            .config
            .title
            .clone()
            .unwrap_or_else(|| format!("Transaction {}", details.hash));
        self.line(&format!("title {}", title));

        if self.config.show_details {
            let header = header_text(details);
            self.line(&format!("header {}", header));
        }

        if !details.status {
            let error = details.error.as_deref().unwrap_or("reverted");
            self.line(&format!("caption Transaction failed: {}", error));
        }
        self.blank();
    }

    /// Declare every account once, in first-appearance order
    fn participants(&mut self, messages: &MessageSequence) {
        let mut seen = HashSet::new();
        let mut order = Vec::new();
        for message in messages {
            for address in std::iter::once(message.from).chain(message.to) {
                if seen.insert(address) {
                    order.push(address);
                }
            }
        }

        let sender = messages.root().map(|root| root.from);
        for address in order {
            let kind = if Some(address) == sender { "actor" } else { "participant" };
            let label = self.participant_label(&address);
            self.line(&format!("{} \"{}\" as {}", kind, label, participant_alias(&address)));
        }
    }

    fn participant_label(&self, address: &Address) -> String {
        let short = short_address(address);
        match self.config.contract_names.get(address) {
            Some(name) => format!("{}\\n{}", name.replace('"', "'"), short),
            None => short,
        }
    }

    fn messages(&mut self, tx_hash: &str, messages: &MessageSequence) -> Result<(), DiagramError> {
        for message in messages {
            // Unwind to the caller's activation
            while let Some(&top) = self.open.last() {
                if Some(top) == message.parent {
                    break;
                }
                self.open.pop();
                self.close(messages, top);
            }

            if let Some(parent) = message.parent {
                if self.open.last() != Some(&parent) {
                    return Err(DiagramError::UnbalancedActivation {
                        tx_hash: tx_hash.to_string(),
                        message_id: message.sequence_id,
                        parent,
                    });
                }
            }

            let source = source_alias(messages, message);
            let target = participant_alias(&message.lifeline());
            let label = self.message_label(message);
            self.line(&format!("{} {} {} : {}", source, arrow_for(message.message_type), target, label));

            if message.is_executing() {
                self.line(&format!("activate {}", target));
                self.open.push(message.sequence_id);
            } else if !message.status {
                self.failure(message, &source, &target, false);
            }
        }

        while let Some(top) = self.open.pop() {
            self.close(messages, top);
        }
        Ok(())
    }

    /// Draw the return of an executing message and end its activation
    fn close(&mut self, messages: &MessageSequence, id: usize) {
        let Some(message) = messages.get(id) else {
            return;
        };
        let source = source_alias(messages, message);
        let target = participant_alias(&message.lifeline());

        if message.status {
            self.line(&format!("{} {} {}", target, ARROW_RETURN, source));
            self.line(&format!("deactivate {}", target));
            return;
        }

        self.failure(message, &source, &target, true);
    }

    /// Failed return arrow, optional deactivation, then the revert note
    fn failure(&mut self, message: &Message, source: &str, target: &str, deactivate: bool) {
        let error = message.error.as_deref().unwrap_or("reverted");
        self.line(&format!("{} {} {} : {}", target, ARROW_FAILED_RETURN, source, error));
        if deactivate {
            self.line(&format!("deactivate {}", target));
        }

        if let Some(reason) = failure_reason(message) {
            self.line(&format!("note right of {} {}", target, FAILURE_NOTE_COLOR));
            self.line(&reason);
            self.line("end note");
        }
    }

    fn message_label(&self, message: &Message) -> String {
        let mut label = match message.message_type {
            MessageType::Call | MessageType::StaticCall | MessageType::DelegateCall => {
                match message.func_selector.as_deref() {
                    Some(selector) => self
                        .config
                        .function_names
                        .get(selector)
                        .cloned()
                        .unwrap_or_else(|| selector.to_string()),
                    None => "fallback".to_string(),
                }
            }
            MessageType::Value => "transfer".to_string(),
            MessageType::Create => "create".to_string(),
            MessageType::Selfdestruct => "selfdestruct".to_string(),
        };

        let fields = message.display_fields();
        if self.config.show_details {
            if let Some(value) = fields.value {
                let _ = write!(label, " [{}]", format_ether(&value));
            }
        }
        if self.config.show_gas {
            let _ = write!(label, " (gas {}/{})", fields.gas_used, fields.gas_limit);
        }
        label
    }
}

/// Lifeline a message leaves from: its parent's target, or the sender for the root
fn source_alias(messages: &MessageSequence, message: &Message) -> String {
    let address = messages
        .parent_of(message)
        .map(Message::lifeline)
        .unwrap_or(message.from);
    participant_alias(&address)
}

/// Decoded revert reason, falling back to the node-provided one
fn failure_reason(message: &Message) -> Option<String> {
    let decoded = message
        .outputs
        .as_deref()
        .filter(|output| output.len() > 2)
        .and_then(|output| match decode_revert_reason(output) {
            Ok(reason) => Some(reason),
            Err(e) => {
                debug!("No revert reason for message {}: {}", message.sequence_id, e);
                None
            }
        });

    decoded
        .or_else(|| message.revert_reason.clone())
        .filter(|reason| !reason.is_empty())
}

fn header_text(details: &TransactionDetails) -> String {
    let mut parts = vec![format!("nonce {}", details.nonce)];
    if let Some(index) = details.index {
        parts.push(format!("index {}", index));
    }
    parts.push(format!("value {}", format_ether(&details.value)));
    parts.push(format!("gas price {} wei", details.gas_price));
    if let Some(timestamp) = details.timestamp {
        parts.push(timestamp.format("%Y-%m-%d %H:%M:%S UTC").to_string());
    }
    parts.join(" | ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::call_trace::{flatten_trace, parse_call_trace};
    use crate::parser::revert::encode_revert_reason;
    use chrono::{TimeZone, Utc};
    use ethereum_types::U256;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    const TX: &str = "0x1234567890abcdef1234567890abcdef1234567890abcdef1234567890abcdef";

    fn addr(n: u8) -> String {
        format!("0x{:040x}", n)
    }

    fn alias(n: u8) -> String {
        format!("c{:040x}", n)
    }

    fn trace_from(raw: serde_json::Value) -> TransactionTrace {
        let record = parse_call_trace(TX, &raw).unwrap();
        let messages = flatten_trace(TX, &record).unwrap();
        TransactionTrace::new(TransactionDetails::from_hash(TX), messages)
    }

    #[test]
    fn test_simple_call_diagram() {
        let trace = trace_from(json!({
            "type": "CALL", "from": addr(1), "to": addr(2), "input": "0xa9059cbb0000",
            "calls": [ { "type": "STATICCALL", "from": addr(2), "to": addr(3) } ]
        }));
        let config = DiagramConfig::new()
            .with_details(false)
            .with_function_name("0xA9059CBB", "transfer(address,uint256)");

        let expected = format!(
            "@startuml\n\
             title Transaction {tx}\n\
             \n\
             actor \"0x0000..0001\" as {a1}\n\
             participant \"0x0000..0002\" as {a2}\n\
             participant \"0x0000..0003\" as {a3}\n\
             \n\
             {a1} -> {a2} : transfer(address,uint256)\n\
             activate {a2}\n\
             {a2} -[#gray]> {a3} : fallback\n\
             activate {a3}\n\
             {a3} --> {a2}\n\
             deactivate {a3}\n\
             {a2} --> {a1}\n\
             deactivate {a2}\n\
             @enduml\n",
            tx = TX,
            a1 = alias(1),
            a2 = alias(2),
            a3 = alias(3),
        );

        assert_eq!(generate_diagram(&trace, &config).unwrap(), expected);
    }

    #[test]
    fn test_failure_note_and_caption() {
        let trace = trace_from(json!({
            "type": "CALL", "from": addr(1), "to": addr(2),
            "error": "execution reverted",
            "output": encode_revert_reason("insufficient balance")
        }));

        let diagram = generate_diagram(&trace, &DiagramConfig::new().with_details(false)).unwrap();

        assert!(diagram.contains("caption Transaction failed: execution reverted\n"));
        assert!(diagram.contains(&format!(
            "{} -[#red]->x {} : execution reverted\ndeactivate {}\nnote right of {} #FFAAAA\ninsufficient balance\nend note\n",
            alias(2), alias(1), alias(2), alias(2)
        )));
    }

    #[test]
    fn test_failure_note_falls_back_to_node_reason() {
        let trace = trace_from(json!({
            "type": "CALL", "from": addr(1), "to": addr(2),
            "error": "execution reverted", "output": "0xdeadbeef", "revertReason": "paused"
        }));

        let diagram = generate_diagram(&trace, &DiagramConfig::new()).unwrap();
        assert!(diagram.contains("#FFAAAA\npaused\nend note"));
    }

    #[test]
    fn test_selfdestruct_not_activated() {
        let trace = trace_from(json!({
            "type": "CALL", "from": addr(1), "to": addr(2),
            "calls": [ { "type": "SELFDESTRUCT", "from": addr(2), "to": addr(1), "value": "0xde0b6b3a7640000" } ]
        }));

        let diagram = generate_diagram(&trace, &DiagramConfig::new()).unwrap();
        assert!(diagram.contains(&format!("{} -[#red]>x {} : selfdestruct [1 ETH]\n", alias(2), alias(1))));
        assert_eq!(diagram.matches("activate ").count() - diagram.matches("deactivate ").count(), 1);
        assert_eq!(diagram.matches("deactivate ").count(), 1);
    }

    #[test]
    fn test_failed_selfdestruct_gets_failure_return() {
        let trace = trace_from(json!({
            "type": "CALL", "from": addr(1), "to": addr(2),
            "calls": [ {
                "type": "SELFDESTRUCT", "from": addr(2), "to": addr(3),
                "error": "execution reverted", "revertReason": "locked"
            } ]
        }));

        let diagram = generate_diagram(&trace, &DiagramConfig::new()).unwrap();
        assert!(diagram.contains(&format!(
            "{a2} -[#red]>x {a3} : selfdestruct\n\
             {a3} -[#red]->x {a2} : execution reverted\n\
             note right of {a3} #FFAAAA\nlocked\nend note\n\
             {a2} --> {a1}\n",
            a1 = alias(1),
            a2 = alias(2),
            a3 = alias(3),
        )));
        assert!(!diagram.contains(&format!("deactivate {}", alias(3))));
    }

    #[test]
    fn test_gas_shown_only_when_enabled() {
        let raw = json!({ "type": "CALL", "from": addr(1), "to": addr(2), "gas": "0x7530", "gasUsed": "0x5208" });

        let quiet = generate_diagram(&trace_from(raw.clone()), &DiagramConfig::new()).unwrap();
        assert!(!quiet.contains("gas 21000"));

        let verbose = generate_diagram(&trace_from(raw), &DiagramConfig::new().with_gas(true)).unwrap();
        assert!(verbose.contains(": fallback (gas 21000/30000)\n"));
    }

    #[test]
    fn test_contract_names_in_labels() {
        let trace = trace_from(json!({ "type": "CALL", "from": addr(1), "to": addr(2) }));
        let token = Address::from_low_u64_be(2);

        let diagram = generate_diagram(
            &trace,
            &DiagramConfig::new().with_contract_name(token, "Token").with_title("Transfer"),
        )
        .unwrap();

        assert!(diagram.contains("title Transfer\n"));
        assert!(diagram.contains(&format!("participant \"Token\\n0x0000..0002\" as {}\n", alias(2))));
    }

    #[test]
    fn test_header_line() {
        let mut trace = trace_from(json!({ "type": "CALL", "from": addr(1), "to": addr(2) }));
        trace.details.nonce = 7;
        trace.details.index = Some(3);
        trace.details.gas_price = U256::from(1_000_000_000u64);
        trace.details.timestamp = Utc.timestamp_opt(1_700_000_000, 0).single();

        let diagram = generate_diagram(&trace, &DiagramConfig::new()).unwrap();
        assert!(diagram.contains(
            "header nonce 7 | index 3 | value 0 ETH | gas price 1000000000 wei | 2023-11-14 22:13:20 UTC\n"
        ));
    }

    #[test]
    fn test_rejects_bad_hash_and_empty_trace() {
        let bad = TransactionTrace::new(TransactionDetails::from_hash("not-a-hash"), MessageSequence::new());
        assert!(matches!(
            generate_diagram(&bad, &DiagramConfig::new()),
            Err(DiagramError::Trace(_))
        ));

        let empty = TransactionTrace::new(TransactionDetails::from_hash(TX), MessageSequence::new());
        assert!(matches!(
            generate_diagram(&empty, &DiagramConfig::new()),
            Err(DiagramError::EmptyTrace(_))
        ));
    }

    #[test]
    fn test_child_of_selfdestruct_is_unbalanced() {
        let mut messages = MessageSequence::new();
        let root = trace_from(json!({
            "type": "CALL", "from": addr(1), "to": addr(2),
            "calls": [ { "type": "SELFDESTRUCT", "from": addr(2), "to": addr(1) } ]
        }))
        .messages;
        for message in root.iter().cloned() {
            messages.push(message);
        }
        let mut orphan = root.as_slice()[0].clone();
        orphan.parent = Some(1);
        orphan.call_depth = 2;
        messages.push(orphan);

        let trace = TransactionTrace::new(TransactionDetails::from_hash(TX), messages);
        assert!(matches!(
            generate_diagram(&trace, &DiagramConfig::new()),
            Err(DiagramError::UnbalancedActivation { message_id: 2, parent: 1, .. })
        ));
    }
}
