use ethereum_types::{Address, U256};
use serde_json::json;
use std::cell::RefCell;
use std::collections::HashMap;
use trace_sequence::aggregator::{
    build_messages, collect_pages, IndexerPage, MessagePageSource, MessageStats, TraceInput,
};
use trace_sequence::parser::{parse_call_trace, MessageType};
use trace_sequence::utils::error::{RpcError, TraceError};

const TX: &str = "0x1234567890abcdef1234567890abcdef1234567890abcdef1234567890abcdef";

fn addr(n: u64) -> String {
    format!("0x{:040x}", n)
}

fn record(id: u64, tag: &str, depth: usize, from: u64, to: Option<u64>) -> serde_json::Value {
    let mut relationships = json!({ "from": { "data": { "id": addr(from), "type": "account" } } });
    if let Some(to) = to {
        relationships["to"] = json!({ "data": { "id": addr(to), "type": "account" } });
    }
    json!({
        "id": id.to_string(),
        "type": "message",
        "attributes": { "messageType": tag, "callDepth": depth, "value": "0", "gasUsed": 100 },
        "relationships": relationships
    })
}

fn page(records: Vec<serde_json::Value>, next: Option<&str>) -> IndexerPage {
    serde_json::from_value(json!({
        "data": records,
        "links": { "next": next },
        "meta": { "hasMore": next.is_some() }
    }))
    .unwrap()
}

/// In-memory page source keyed by cursor
struct MockSource {
    first: IndexerPage,
    by_cursor: HashMap<String, IndexerPage>,
    calls: RefCell<usize>,
}

impl MockSource {
    fn new(first: IndexerPage, rest: Vec<(&str, IndexerPage)>) -> Self {
        Self {
            first,
            by_cursor: rest.into_iter().map(|(c, p)| (c.to_string(), p)).collect(),
            calls: RefCell::new(0),
        }
    }
}

impl MessagePageSource for MockSource {
    fn name(&self) -> &str {
        "mock indexer"
    }

    fn first_page(&self, _tx_hash: &str) -> Result<IndexerPage, RpcError> {
        *self.calls.borrow_mut() += 1;
        Ok(self.first.clone())
    }

    fn page_after(&self, tx_hash: &str, cursor: &str) -> Result<IndexerPage, RpcError> {
        *self.calls.borrow_mut() += 1;
        self.by_cursor
            .get(cursor)
            .cloned()
            .ok_or_else(|| RpcError::TransactionNotFound(tx_hash.to_string()))
    }
}

/// Three pages; page two repeats a record from page one and arrives out of order
fn three_page_source() -> MockSource {
    MockSource::new(
        page(
            vec![
                record(0, "transaction", 0, 1, Some(2)),
                record(1, "internal-call", 1, 2, Some(3)),
            ],
            Some("/transactions/0xabc/messages?page%5Bcursor%5D=c2"),
        ),
        vec![
            (
                "c2",
                page(
                    vec![
                        record(3, "internal-value", 1, 2, Some(5)),
                        record(2, "internal-staticcall", 2, 3, Some(4)),
                        record(1, "internal-call", 1, 2, Some(3)),
                    ],
                    Some("https://indexer.example.org/transactions/0xabc/messages?cursor=c3"),
                ),
            ),
            (
                "c3",
                page(vec![record(4, "internal-create", 1, 2, None)], None),
            ),
        ],
    )
}

#[test]
fn test_three_page_pagination() {
    let source = three_page_source();
    let pages = collect_pages(TX, &source).unwrap();

    assert_eq!(pages.len(), 3);
    assert_eq!(*source.calls.borrow(), 3);

    let messages = build_messages(TX, &TraceInput::Indexer(pages)).unwrap();

    // Sorted by id, duplicate dropped
    assert_eq!(messages.len(), 5);
    let types: Vec<MessageType> = messages.iter().map(|m| m.message_type).collect();
    assert_eq!(
        types,
        vec![
            MessageType::Call,
            MessageType::Call,
            MessageType::StaticCall,
            MessageType::Value,
            MessageType::Create,
        ]
    );

    let parents: Vec<Option<usize>> = messages.iter().map(|m| m.parent).collect();
    assert_eq!(parents, vec![None, Some(0), Some(1), Some(0), Some(0)]);
    assert_eq!(messages.root().unwrap().children, vec![1, 3, 4]);
    assert_eq!(messages.get(4).unwrap().to, None);
    assert_eq!(messages.get(2).unwrap().gas_used, U256::from(100));
}

#[test]
fn test_indexer_and_node_yield_same_fields() {
    let node = parse_call_trace(
        TX,
        &json!({
            "type": "CALL", "from": addr(1), "to": addr(2), "gasUsed": 100, "value": "0",
            "calls": [{ "type": "DELEGATECALL", "from": addr(2), "to": addr(3), "gasUsed": 100, "value": "0" }]
        }),
    )
    .unwrap();
    let from_node = build_messages(TX, &TraceInput::NodeTrace(node)).unwrap();

    let indexed = page(
        vec![
            record(10, "transaction", 0, 1, Some(2)),
            record(11, "internal-delegatecall", 1, 2, Some(3)),
        ],
        None,
    );
    let from_indexer = build_messages(TX, &TraceInput::Indexer(vec![indexed])).unwrap();

    assert_eq!(from_node, from_indexer);
}

#[test]
fn test_indexer_delegation_origin() {
    let indexed = page(
        vec![
            record(0, "transaction", 0, 1, Some(0xa)),
            record(1, "internal-delegatecall", 1, 0xa, Some(0xb)),
            record(2, "internal-delegatecall", 2, 0xa, Some(0xc)),
        ],
        None,
    );
    let messages = build_messages(TX, &TraceInput::Indexer(vec![indexed])).unwrap();
    assert_eq!(messages.get(2).unwrap().delegated_from, Address::from_low_u64_be(0xa));
}

#[test]
fn test_missing_cursor_is_structural_error() {
    let source = MockSource::new(
        serde_json::from_value(json!({
            "data": [record(0, "transaction", 0, 1, Some(2))],
            "links": { "next": "/transactions/0xabc/messages?page=2" },
            "meta": { "hasMore": true }
        }))
        .unwrap(),
        vec![],
    );

    assert!(matches!(
        collect_pages(TX, &source),
        Err(TraceError::MissingCursor { page: 1, .. })
    ));
}

#[test]
fn test_repeated_cursor_is_structural_error() {
    let looping = page(vec![], Some("?cursor=again"));
    let source = MockSource::new(looping.clone(), vec![("again", looping)]);

    match collect_pages(TX, &source) {
        Err(TraceError::RepeatedCursor { cursor, source_name, .. }) => {
            assert_eq!(cursor, "again");
            assert_eq!(source_name, "mock indexer");
        }
        other => panic!("unexpected result: {:?}", other.map(|p| p.len())),
    }
}

#[test]
fn test_source_failure_is_wrapped() {
    let source = MockSource::new(page(vec![], Some("?cursor=gone")), vec![]);
    let err = collect_pages(TX, &source).unwrap_err();
    assert!(matches!(err, TraceError::Fetch { .. }));
    assert!(err.to_string().contains(TX));
}

#[test]
fn test_invalid_hash_rejected_before_fetching() {
    let source = three_page_source();
    assert!(matches!(
        collect_pages("not-a-hash", &source),
        Err(TraceError::InvalidTxHash(_))
    ));
    assert_eq!(*source.calls.borrow(), 0);

    assert!(matches!(
        build_messages("not-a-hash", &TraceInput::Indexer(vec![])),
        Err(TraceError::InvalidTxHash(_))
    ));
}

#[test]
fn test_depth_jump_rejected() {
    let indexed = page(
        vec![
            record(0, "transaction", 0, 1, Some(2)),
            record(1, "internal-call", 2, 2, Some(3)),
        ],
        None,
    );
    assert!(matches!(
        build_messages(TX, &TraceInput::Indexer(vec![indexed])),
        Err(TraceError::InvalidField { field: "callDepth", .. })
    ));
}

#[test]
fn test_second_root_rejected() {
    let indexed = page(
        vec![
            record(0, "transaction", 0, 1, Some(2)),
            record(1, "transaction", 0, 1, Some(3)),
        ],
        None,
    );
    assert!(build_messages(TX, &TraceInput::Indexer(vec![indexed])).is_err());
}

#[test]
fn test_missing_callee_rejected_for_calls() {
    let indexed = page(vec![record(0, "transaction", 0, 1, None)], None);
    assert!(matches!(
        build_messages(TX, &TraceInput::Indexer(vec![indexed])),
        Err(TraceError::MissingField { field: "to", .. })
    ));
}

#[test]
fn test_bad_numeric_field_named() {
    let mut bad = record(0, "transaction", 0, 1, Some(2));
    bad["attributes"]["value"] = json!("12abc");
    let err = build_messages(TX, &TraceInput::Indexer(vec![page(vec![bad], None)])).unwrap_err();

    match err {
        TraceError::InvalidField { field, message_id, .. } => {
            assert_eq!(field, "value");
            assert_eq!(message_id, "0");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn test_failed_status_from_indexer() {
    let mut failed = record(1, "internal-call", 1, 2, Some(3));
    failed["attributes"]["status"] = json!(false);
    let indexed = page(vec![record(0, "transaction", 0, 1, Some(2)), failed], None);

    let messages = build_messages(TX, &TraceInput::Indexer(vec![indexed])).unwrap();
    let stats = MessageStats::from_messages(&messages);

    assert!(messages.root().unwrap().status);
    assert!(!messages.get(1).unwrap().status);
    assert_eq!(stats.failed, 1);
    assert_eq!(stats.max_depth, 1);
}
