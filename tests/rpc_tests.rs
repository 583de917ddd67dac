use trace_sequence::aggregator::MessagePageSource;
use trace_sequence::rpc::{IndexerClient, RpcClient};
use trace_sequence::utils::error::RpcError;

#[test]
fn test_rpc_client_requires_prefixed_hash() {
    let client = RpcClient::new("http://127.0.0.1:1").unwrap();
    let unprefixed = "1234567890abcdef1234567890abcdef1234567890abcdef1234567890abcdef";

    assert!(matches!(
        client.debug_trace_call_tree(unprefixed),
        Err(RpcError::InvalidTxHash(_))
    ));
}

#[test]
fn test_indexer_endpoints() {
    let client = IndexerClient::new("http://localhost:3000/api/", Some("key".to_string()))
        .unwrap()
        .with_page_size(50);

    assert_eq!(client.name(), "http://localhost:3000/api");
    assert_eq!(
        client.transaction_url("0xabc"),
        "http://localhost:3000/api/transactions/0xabc"
    );
    assert_eq!(
        client.messages_url("0xabc"),
        "http://localhost:3000/api/transactions/0xabc/messages"
    );
}
