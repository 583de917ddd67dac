use crate::diagram::DiagramConfig;
use crate::utils::config::DEFAULT_RPC_URL;
use std::path::PathBuf;

/// Where the call structure of a transaction comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum SourceKind {
    /// `debug_traceTransaction` with `callTracer` on a node
    #[default]
    Node,

    /// Paginated messages from an indexing service
    Indexer,
}

/// Arguments for the generate command
///
/// **Public** - used by main.rs to construct from CLI args
#[derive(Debug, Clone)]
pub struct GenerateArgs {
    /// Transaction hash to draw
    pub transaction_hash: String,

    pub source: SourceKind,

    /// Node endpoint URL
    pub rpc_url: String,

    /// Indexer base URL, required for `SourceKind::Indexer`
    pub indexer_url: Option<String>,

    /// Optional indexer API key
    pub indexer_key: Option<String>,

    /// Output path for the PlantUML diagram
    pub output_diagram: PathBuf,

    /// Output path for the JSON report (optional)
    pub output_json: Option<PathBuf>,

    pub diagram_config: DiagramConfig,

    /// Print message statistics to stdout
    pub print_summary: bool,
}

impl Default for GenerateArgs {
    fn default() -> Self {
        Self {
            transaction_hash: String::new(),
            source: SourceKind::Node,
            rpc_url: DEFAULT_RPC_URL.to_string(),
            indexer_url: None,
            indexer_key: None,
            output_diagram: PathBuf::from("diagram.puml"),
            output_json: None,
            diagram_config: DiagramConfig::default(),
            print_summary: false,
        }
    }
}

/// Arguments for the render command
///
/// **Public** - offline rendering of a saved `callTracer` response
#[derive(Debug, Clone)]
pub struct RenderArgs {
    /// Saved `debug_traceTransaction` output
    pub trace_file: PathBuf,

    /// Transaction the trace belongs to
    pub transaction_hash: String,

    pub output_diagram: PathBuf,

    pub output_json: Option<PathBuf>,

    pub diagram_config: DiagramConfig,

    pub print_summary: bool,
}

impl Default for RenderArgs {
    fn default() -> Self {
        Self {
            trace_file: PathBuf::from("trace.json"),
            transaction_hash: String::new(),
            output_diagram: PathBuf::from("diagram.puml"),
            output_json: None,
            diagram_config: DiagramConfig::default(),
            print_summary: false,
        }
    }
}
