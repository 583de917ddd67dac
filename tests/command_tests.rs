use serde_json::json;
use std::path::PathBuf;
use trace_sequence::commands::{
    diagram_config_from_flags, execute_generate, execute_render, validate_args, GenerateArgs, RenderArgs, SourceKind,
};
use trace_sequence::output::{read_diagram, read_report};

const TX: &str = "0x1234567890abcdef1234567890abcdef1234567890abcdef1234567890abcdef";

#[test]
fn test_validate_args_valid() {
    let args = GenerateArgs {
        transaction_hash: TX.to_string(),
        ..Default::default()
    };

    assert!(validate_args(&args).is_ok());
}

#[test]
fn test_validate_args_empty_rpc() {
    let args = GenerateArgs {
        rpc_url: String::new(),
        transaction_hash: TX.to_string(),
        ..Default::default()
    };

    assert!(validate_args(&args).is_err());
}

#[test]
fn test_validate_args_invalid_rpc_scheme() {
    let args = GenerateArgs {
        rpc_url: "ftp://localhost:8545".to_string(),
        transaction_hash: TX.to_string(),
        ..Default::default()
    };

    assert!(validate_args(&args).is_err());
}

#[test]
fn test_validate_args_rpc_ignored_for_indexer() {
    let args = GenerateArgs {
        rpc_url: String::new(),
        source: SourceKind::Indexer,
        indexer_url: Some("https://indexer.example.org/v1".to_string()),
        transaction_hash: TX.to_string(),
        ..Default::default()
    };

    assert!(validate_args(&args).is_ok());
}

#[test]
fn test_validate_args_empty_tx_hash() {
    let args = GenerateArgs::default();
    assert!(validate_args(&args).is_err());
}

#[test]
fn test_validate_args_not_a_hash() {
    let args = GenerateArgs {
        transaction_hash: "not-a-hash".to_string(),
        ..Default::default()
    };

    assert!(validate_args(&args).is_err());
}

#[test]
fn test_validate_args_tx_hash_without_prefix() {
    let args = GenerateArgs {
        transaction_hash: TX.trim_start_matches("0x").to_string(),
        ..Default::default()
    };

    assert!(validate_args(&args).is_err());
}

#[test]
fn test_generate_rejects_bad_hash_before_fetching() {
    let temp_dir = tempfile::tempdir().unwrap();
    let output_diagram = temp_dir.path().join("tx.puml");
    let args = GenerateArgs {
        transaction_hash: "not-a-hash".to_string(),
        rpc_url: "http://127.0.0.1:1".to_string(),
        output_diagram: output_diagram.clone(),
        ..Default::default()
    };

    let err = execute_generate(args).unwrap_err();

    assert!(err.to_string().contains("Invalid transaction hash"), "{}", err);
    assert!(!output_diagram.exists());
}

#[test]
fn test_render_from_saved_trace() {
    let temp_dir = tempfile::tempdir().unwrap();
    let trace_file = temp_dir.path().join("trace.json");
    let output_diagram = temp_dir.path().join("tx.puml");
    let output_json = temp_dir.path().join("tx.json");

    let saved = json!({
        "jsonrpc": "2.0",
        "id": 1,
        "result": {
            "type": "CALL",
            "from": "0x0000000000000000000000000000000000000001",
            "to": "0x0000000000000000000000000000000000000002",
            "input": "0xa9059cbb",
            "calls": [{
                "type": "DELEGATECALL",
                "from": "0x0000000000000000000000000000000000000002",
                "to": "0x0000000000000000000000000000000000000003"
            }]
        }
    });
    std::fs::write(&trace_file, serde_json::to_string_pretty(&saved).unwrap()).unwrap();

    let diagram_config = diagram_config_from_flags(
        None,
        false,
        true,
        &["0x0000000000000000000000000000000000000002=Proxy".to_string()],
        &["0xa9059cbb=transfer".to_string()],
    )
    .unwrap();

    execute_render(RenderArgs {
        trace_file,
        transaction_hash: TX.to_string(),
        output_diagram: output_diagram.clone(),
        output_json: Some(output_json.clone()),
        diagram_config,
        print_summary: false,
    })
    .unwrap();

    let diagram = read_diagram(&output_diagram).unwrap();
    assert!(diagram.contains("Proxy\\n0x0000..0002"));
    assert!(diagram.contains(": transfer\n"));

    let report = read_report(&output_json).unwrap();
    assert_eq!(report.messages.len(), 2);
}

#[test]
fn test_render_missing_file() {
    let args = RenderArgs {
        trace_file: PathBuf::from("/definitely/not/here.json"),
        transaction_hash: TX.to_string(),
        ..Default::default()
    };

    assert!(execute_render(args).is_err());
}
