use crate::output::read_report;
use crate::parser::revert::decode_revert_reason;
use crate::utils::config::SCHEMA_VERSION;
use anyhow::{Context, Result};
use std::path::PathBuf;

/// Validate a JSON report file
pub fn validate_report_file(file_path: PathBuf) -> Result<()> {
    println!("Validating report: {}", file_path.display());

    let report = read_report(&file_path)
        .with_context(|| format!("Failed to read report {}", file_path.display()))?;

    println!("✓ Valid report JSON");
    println!("  Version: {}", report.version);
    println!("  Transaction: {}", report.transaction.hash);
    println!("  Messages: {}", report.messages.len());
    println!("  Failed: {}", report.stats.failed);
    println!("  Max depth: {}", report.stats.max_depth);

    Ok(())
}

/// Print the revert reason carried by return data
pub fn decode_return_data(data: &str) -> Result<()> {
    let reason = decode_revert_reason(data).context("Return data carries no decodable revert reason")?;
    println!("{}", reason);
    Ok(())
}

/// Display version information
pub fn display_version() {
    println!("trace-sequence v{}", env!("CARGO_PKG_VERSION"));
    println!("Report Schema: v{}", SCHEMA_VERSION);
    println!();
    println!("Sequence diagrams of EVM transaction call structure.");
}
