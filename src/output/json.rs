//! JSON report output writer.
//!
//! Writes `TraceReport` structs (transaction, stats and messages) to JSON files.

use super::{ensure_parent_dir, validate_path};
use crate::aggregator::metrics::MessageStats;
use crate::parser::schema::{TraceReport, TransactionTrace};
use crate::utils::config::SCHEMA_VERSION;
use crate::utils::error::OutputError;
use chrono::Utc;
use log::{debug, info};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// Assemble a report for a transaction trace
///
/// **Public** - stamps the schema version and generation time
pub fn build_report(trace: &TransactionTrace) -> TraceReport {
    TraceReport {
        version: SCHEMA_VERSION.to_string(),
        transaction: trace.details.clone(),
        stats: MessageStats::from_messages(&trace.messages),
        messages: trace.messages.clone(),
        generated_at: Utc::now().to_rfc3339(),
    }
}

/// Write a report to a JSON file
///
/// **Public** - main entry point for JSON output
///
/// # Errors
/// * `OutputError::WriteFailed` - I/O error during write
/// * `OutputError::SerializationFailed` - JSON serialization error
/// * `OutputError::InvalidPath` - Path cannot be created or is invalid
pub fn write_report(report: &TraceReport, output_path: impl AsRef<Path>) -> Result<(), OutputError> {
    let output_path = output_path.as_ref();

    info!("Writing report to: {}", output_path.display());

    validate_path(output_path)?;
    ensure_parent_dir(output_path)?;

    let file = File::create(output_path).map_err(OutputError::WriteFailed)?;
    let writer = BufWriter::new(file);

    serde_json::to_writer_pretty(writer, report).map_err(OutputError::SerializationFailed)?;

    info!("Report written successfully ({} bytes)", calculate_file_size(output_path));
    Ok(())
}

/// Serialize a report to a string
pub fn report_to_string(report: &TraceReport) -> Result<String, OutputError> {
    serde_json::to_string_pretty(report).map_err(OutputError::SerializationFailed)
}

fn calculate_file_size(path: &Path) -> u64 {
    std::fs::metadata(path).map(|m| m.len()).unwrap_or(0)
}

/// Read a report from a JSON file
///
/// **Public** - used by `validate` and tests
///
/// # Errors
/// * `OutputError::WriteFailed` - File read error (reusing WriteFailed for I/O)
/// * `OutputError::SerializationFailed` - JSON parse error
/// * `OutputError::UnsupportedVersion` - major schema version differs
pub fn read_report(input_path: impl AsRef<Path>) -> Result<TraceReport, OutputError> {
    let input_path = input_path.as_ref();

    debug!("Reading report from: {}", input_path.display());

    let file = File::open(input_path).map_err(OutputError::WriteFailed)?;
    let report: TraceReport = serde_json::from_reader(file).map_err(OutputError::SerializationFailed)?;

    if major(&report.version) != major(SCHEMA_VERSION) {
        return Err(OutputError::UnsupportedVersion {
            found: report.version,
            expected: SCHEMA_VERSION.to_string(),
        });
    }

    debug!(
        "Report loaded: version {}, tx {}, {} messages",
        report.version,
        report.transaction.hash,
        report.messages.len()
    );

    Ok(report)
}

fn major(version: &str) -> &str {
    version.split('.').next().unwrap_or(version)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::call_trace::{flatten_trace, parse_call_trace};
    use crate::parser::schema::TransactionDetails;
    use serde_json::json;
    use tempfile::NamedTempFile;

    const TX: &str = "0x1234567890abcdef1234567890abcdef1234567890abcdef1234567890abcdef";

    fn create_test_report() -> TraceReport {
        let raw = json!({
            "type": "CALL",
            "from": "0x0000000000000000000000000000000000000001",
            "to": "0x0000000000000000000000000000000000000002",
            "value": "0x10",
            "calls": [{
                "type": "DELEGATECALL",
                "from": "0x0000000000000000000000000000000000000002",
                "to": "0x0000000000000000000000000000000000000003"
            }]
        });
        let record = parse_call_trace(TX, &raw).unwrap();
        let messages = flatten_trace(TX, &record).unwrap();
        build_report(&TransactionTrace::new(TransactionDetails::from_hash(TX), messages))
    }

    #[test]
    fn test_write_and_read_report() {
        let report = create_test_report();
        let temp_file = NamedTempFile::new().unwrap();
        let path = temp_file.path();

        write_report(&report, path).unwrap();
        let loaded = read_report(path).unwrap();

        assert_eq!(loaded.version, SCHEMA_VERSION);
        assert_eq!(loaded.transaction, report.transaction);
        assert_eq!(loaded.messages, report.messages);
        assert_eq!(loaded.stats, report.stats);
    }

    #[test]
    fn test_report_field_names() {
        let text = report_to_string(&create_test_report()).unwrap();
        assert!(text.contains("\"generatedAt\""));
        assert!(text.contains("\"delegatedFrom\""));
        assert!(text.contains("\"type\": \"delegateCall\""));
    }

    #[test]
    fn test_read_rejects_other_major_version() {
        let mut report = create_test_report();
        report.version = "2.0.0".to_string();
        let temp_file = NamedTempFile::new().unwrap();
        write_report(&report, temp_file.path()).unwrap();

        assert!(matches!(
            read_report(temp_file.path()),
            Err(OutputError::UnsupportedVersion { .. })
        ));
    }

    #[test]
    fn test_write_creates_parent_dirs() {
        let temp_dir = tempfile::tempdir().unwrap();
        let nested_path = temp_dir.path().join("nested/dirs/report.json");

        write_report(&create_test_report(), &nested_path).unwrap();

        assert!(nested_path.exists());
    }
}
