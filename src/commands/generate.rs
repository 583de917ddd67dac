//! Generate and render command implementations.
//!
//! The generate command:
//! 1. Fetches the trace from a node or the indexer
//! 2. Builds the unified message sequence
//! 3. Generates the sequence diagram
//! 4. Writes output files
//!
//! The render command runs steps 2-4 on a saved `callTracer` response.

use super::models::{GenerateArgs, RenderArgs, SourceKind};
use crate::aggregator::{build_messages, collect_pages, MessageStats, TraceInput};
use crate::diagram::{generate_diagram, DiagramConfig};
use crate::output::{build_report, write_diagram, write_report};
use crate::parser::call_trace::parse_call_trace;
use crate::parser::schema::{TransactionDetails, TransactionTrace};
use crate::parser::values::parse_address;
use crate::rpc::{IndexerClient, RpcClient};
use crate::utils::validation::validate_tx_hash;
use anyhow::{bail, Context, Result};
use log::{debug, info, warn};
use std::path::Path;
use std::time::Instant;

/// Execute the generate command
///
/// **Public** - main entry point called from main.rs
///
/// # Errors
/// * RPC or indexer failures
/// * Trace validation errors
/// * Diagram activation errors
/// * File write errors
pub fn execute_generate(args: GenerateArgs) -> Result<()> {
    validate_tx_hash(&args.transaction_hash)?;
    let start_time = Instant::now();

    info!("Starting diagram generation for transaction: {}", args.transaction_hash);

    info!("Step 1/4: Fetching trace from {:?} source...", args.source);
    let (input, details) = match args.source {
        SourceKind::Node => fetch_from_node(&args)?,
        SourceKind::Indexer => fetch_from_indexer(&args)?,
    };

    let outputs = Outputs {
        diagram: &args.output_diagram,
        json: args.output_json.as_deref(),
        config: &args.diagram_config,
        print_summary: args.print_summary,
    };
    build_and_write(&args.transaction_hash, &input, details, &outputs)?;

    info!("Generation completed in {:.2}s", start_time.elapsed().as_secs_f64());
    Ok(())
}

/// Execute the render command
///
/// **Public** - offline counterpart of `execute_generate`
pub fn execute_render(args: RenderArgs) -> Result<()> {
    validate_tx_hash(&args.transaction_hash)?;

    info!("Step 1/4: Reading trace from {}...", args.trace_file.display());
    let text = std::fs::read_to_string(&args.trace_file)
        .with_context(|| format!("Failed to read trace file {}", args.trace_file.display()))?;
    let raw: serde_json::Value = serde_json::from_str(&text).context("Trace file is not valid JSON")?;
    let record = parse_call_trace(&args.transaction_hash, &raw).context("Failed to parse call trace")?;

    let outputs = Outputs {
        diagram: &args.output_diagram,
        json: args.output_json.as_deref(),
        config: &args.diagram_config,
        print_summary: args.print_summary,
    };
    build_and_write(
        &args.transaction_hash,
        &TraceInput::NodeTrace(record),
        TransactionDetails::from_hash(&args.transaction_hash),
        &outputs,
    )
}

/// Where and how results are written
///
/// **Private** - shared by generate and render
struct Outputs<'a> {
    diagram: &'a Path,
    json: Option<&'a Path>,
    config: &'a DiagramConfig,
    print_summary: bool,
}

fn build_and_write(
    tx_hash: &str,
    input: &TraceInput,
    details: TransactionDetails,
    outputs: &Outputs<'_>,
) -> Result<()> {
    info!("Step 2/4: Building message sequence...");
    let messages = build_messages(tx_hash, input).context("Failed to build message sequence")?;
    let trace = TransactionTrace::new(details, messages);

    let stats = MessageStats::from_messages(&trace.messages);
    info!("{}", stats.summary());

    info!("Step 3/4: Generating sequence diagram...");
    let diagram = generate_diagram(&trace, outputs.config).context("Failed to generate diagram")?;

    info!("Step 4/4: Writing output files...");
    write_diagram(&diagram, outputs.diagram).context("Failed to write diagram")?;
    info!("✓ Diagram written to: {}", outputs.diagram.display());

    if let Some(json_path) = outputs.json {
        write_report(&build_report(&trace), json_path).context("Failed to write JSON report")?;
        info!("✓ Report written to: {}", json_path.display());
    }

    if outputs.print_summary {
        println!("\n{}", "=".repeat(80));
        println!("TRANSACTION SUMMARY");
        println!("{}", "=".repeat(80));
        println!("Transaction:  {}", trace.details.hash);
        println!("Status:       {}", if trace.details.status { "success" } else { "failed" });
        if let Some(error) = &trace.details.error {
            println!("Error:        {}", error);
        }
        println!("Messages:     {}", stats.total);
        for (kind, count) in &stats.by_type {
            println!("  {:<14}{}", kind, count);
        }
        println!("Failed:       {}", stats.failed);
        println!("Max depth:    {}", stats.max_depth);
        println!("Participants: {}", stats.participants);
        println!("{}", "=".repeat(80));
    }

    Ok(())
}

/// Fetch the call tree and metadata from a node
///
/// **Private** - internal helper for execute_generate
fn fetch_from_node(args: &GenerateArgs) -> Result<(TraceInput, TransactionDetails)> {
    let client = RpcClient::new(&args.rpc_url).context("Failed to create RPC client")?;
    let tx_hash = &args.transaction_hash;

    let raw = client
        .debug_trace_call_tree(tx_hash)
        .with_context(|| format!("Failed to fetch call trace for transaction {}", tx_hash))?;
    let record = parse_call_trace(tx_hash, &raw).context("Failed to parse call trace")?;
    debug!("Call tree has {} frames", record.node_count());

    let details = client.transaction_details(tx_hash).unwrap_or_else(|e| {
        warn!("Transaction details unavailable ({}), continuing without them", e);
        TransactionDetails::from_hash(tx_hash.as_str())
    });

    Ok((TraceInput::NodeTrace(record), details))
}

/// Page through the indexer and fetch metadata
///
/// **Private** - internal helper for execute_generate
fn fetch_from_indexer(args: &GenerateArgs) -> Result<(TraceInput, TransactionDetails)> {
    let Some(base_url) = args.indexer_url.as_deref() else {
        bail!("Indexer URL is required for the indexer source");
    };
    let client = IndexerClient::new(base_url, args.indexer_key.clone())
        .context("Failed to create indexer client")?;
    let tx_hash = &args.transaction_hash;

    let pages = collect_pages(tx_hash, &client).context("Failed to fetch indexed messages")?;
    debug!("Fetched {} pages", pages.len());

    let details = client.transaction_details(tx_hash).unwrap_or_else(|e| {
        warn!("Transaction details unavailable ({}), continuing without them", e);
        TransactionDetails::from_hash(tx_hash.as_str())
    });

    Ok((TraceInput::Indexer(pages), details))
}

/// Validate generate arguments
///
/// **Public** - can be called before execute_generate for early validation
pub fn validate_args(args: &GenerateArgs) -> Result<()> {
    if args.transaction_hash.is_empty() {
        bail!("Transaction hash cannot be empty");
    }
    validate_tx_hash(&args.transaction_hash)?;

    match args.source {
        SourceKind::Node => validate_url("RPC URL", &args.rpc_url)?,
        SourceKind::Indexer => match args.indexer_url.as_deref() {
            Some(url) => validate_url("Indexer URL", url)?,
            None => bail!("Indexer URL is required for the indexer source"),
        },
    }

    if args.output_json.as_deref() == Some(args.output_diagram.as_path()) {
        bail!("Diagram and JSON report cannot be written to the same file");
    }

    Ok(())
}

fn validate_url(name: &str, url: &str) -> Result<()> {
    if url.is_empty() {
        bail!("{} cannot be empty", name);
    }
    if !url.starts_with("http://") && !url.starts_with("https://") {
        bail!("{} must start with http:// or https://", name);
    }
    Ok(())
}

/// Build a diagram config from CLI flags
///
/// `names` are `ADDRESS=NAME` pairs, `functions` are `SELECTOR=NAME` pairs.
pub fn diagram_config_from_flags(
    title: Option<String>,
    show_gas: bool,
    show_details: bool,
    names: &[String],
    functions: &[String],
) -> Result<DiagramConfig> {
    let mut config = DiagramConfig::new().with_gas(show_gas).with_details(show_details);
    if let Some(title) = title {
        config = config.with_title(title);
    }

    for pair in names {
        let (address, name) = split_pair(pair)?;
        let address = parse_address(address)
            .map_err(|e| anyhow::anyhow!("Invalid address in --name {}: {}", pair, e))?;
        config = config.with_contract_name(address, name);
    }

    for pair in functions {
        let (selector, name) = split_pair(pair)?;
        let digits = selector.strip_prefix("0x").unwrap_or(selector);
        if digits.len() != 8 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            bail!("Invalid selector in --function {}: expected 4 hex bytes", pair);
        }
        config = config.with_function_name(&format!("0x{}", digits), name);
    }

    Ok(config)
}

fn split_pair(pair: &str) -> Result<(&str, &str)> {
    match pair.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() && !value.trim().is_empty() => {
            Ok((key.trim(), value.trim()))
        }
        _ => bail!("Expected KEY=NAME, got \"{}\"", pair),
    }
}
