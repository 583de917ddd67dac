//! Configuration and constants for the CLI.

use std::time::Duration;

/// Default timeout for RPC and indexer requests
pub const DEFAULT_RPC_TIMEOUT: Duration = Duration::from_secs(30);

/// Default node endpoint
pub const DEFAULT_RPC_URL: &str = "http://localhost:8545";

/// Current report schema version
pub const SCHEMA_VERSION: &str = "1.0.0";

/// Tracer requested from `debug_traceTransaction`
pub const CALL_TRACER: &str = "callTracer";

/// Records requested per indexer page
pub const DEFAULT_PAGE_SIZE: usize = 100;

// Query parameter names that carry the indexer continuation cursor
pub const CURSOR_PARAM_NAMES: &[&str] = &["page[cursor]", "cursor"];

// Environment variables read by the CLI
pub const ENV_RPC_URL: &str = "TRACE_SEQUENCE_RPC_URL";
pub const ENV_INDEXER_URL: &str = "TRACE_SEQUENCE_INDEXER_URL";
pub const ENV_INDEXER_KEY: &str = "TRACE_SEQUENCE_INDEXER_KEY";

// PlantUML arrow styles keyed by message type
pub const ARROW_CALL: &str = "->";
pub const ARROW_STATIC_CALL: &str = "-[#gray]>";
pub const ARROW_DELEGATE_CALL: &str = "-[#slateblue]>>";
pub const ARROW_VALUE: &str = "-[#green,bold]>";
pub const ARROW_CREATE: &str = "-[#blue]>o";
pub const ARROW_SELFDESTRUCT: &str = "-[#red]>x";
pub const ARROW_RETURN: &str = "-->";
pub const ARROW_FAILED_RETURN: &str = "-[#red]->x";

/// Background of revert reason notes
pub const FAILURE_NOTE_COLOR: &str = "#FFAAAA";
