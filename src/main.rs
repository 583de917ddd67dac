//! trace-sequence CLI
//!
//! Draws the call structure of an EVM transaction as a PlantUML sequence
//! diagram, from a node's call trace or from indexed messages.

use anyhow::Result;
use clap::{Parser, Subcommand};
use env_logger::Env;
use std::path::PathBuf;

use trace_sequence::commands::{
    decode_return_data, diagram_config_from_flags, display_version, execute_generate,
    execute_render, validate_args, validate_report_file, GenerateArgs, RenderArgs, SourceKind,
};
use trace_sequence::utils::config::{DEFAULT_RPC_URL, ENV_INDEXER_KEY, ENV_INDEXER_URL, ENV_RPC_URL};

/// trace-sequence - sequence diagrams for EVM transactions
#[derive(Parser, Debug)]
#[command(name = "trace-sequence")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Diagram presentation flags shared by generate and render
#[derive(clap::Args, Debug)]
struct DiagramFlags {
    /// Output path for the PlantUML diagram
    #[arg(short, long, default_value = "diagram.puml")]
    output: PathBuf,

    /// Output path for a JSON report of the messages (optional)
    #[arg(short, long)]
    json: Option<PathBuf>,

    /// Diagram title
    #[arg(long)]
    title: Option<String>,

    /// Show gas used / gas limit on every arrow
    #[arg(long)]
    gas: bool,

    /// Hide the transaction header and transferred values
    #[arg(long)]
    no_details: bool,

    /// Print message statistics to stdout
    #[arg(long)]
    summary: bool,

    /// Contract name as ADDRESS=NAME (repeatable)
    #[arg(long = "name", value_name = "ADDRESS=NAME")]
    names: Vec<String>,

    /// Function name as SELECTOR=NAME (repeatable)
    #[arg(long = "function", value_name = "SELECTOR=NAME")]
    functions: Vec<String>,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Fetch a transaction and draw its sequence diagram
    Generate {
        /// Transaction hash to draw
        #[arg(short, long)]
        tx: String,

        /// Trace source
        #[arg(short, long, value_enum, default_value_t = SourceKind::Node)]
        source: SourceKind,

        /// Node RPC endpoint URL
        #[arg(short, long, env = ENV_RPC_URL, default_value = DEFAULT_RPC_URL)]
        rpc: String,

        /// Indexer base URL
        #[arg(long, env = ENV_INDEXER_URL)]
        indexer: Option<String>,

        /// Indexer API key
        #[arg(long, env = ENV_INDEXER_KEY, hide_env_values = true)]
        indexer_key: Option<String>,

        #[command(flatten)]
        diagram: DiagramFlags,
    },

    /// Draw a diagram from a saved callTracer response
    Render {
        /// Path to the saved trace JSON
        #[arg(long)]
        trace: PathBuf,

        /// Transaction hash the trace belongs to
        #[arg(short, long)]
        tx: String,

        #[command(flatten)]
        diagram: DiagramFlags,
    },

    /// Decode a revert reason from return data
    Decode {
        /// 0x-prefixed return data
        #[arg(short, long)]
        data: String,
    },

    /// Validate a JSON report file
    Validate {
        /// Path to report JSON file
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Display version information
    Version,
}

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    // Execute command
    match cli.command {
        Commands::Generate {
            tx,
            source,
            rpc,
            indexer,
            indexer_key,
            diagram,
        } => {
            let diagram_config = diagram_config_from_flags(
                diagram.title,
                diagram.gas,
                !diagram.no_details,
                &diagram.names,
                &diagram.functions,
            )?;

            let args = GenerateArgs {
                transaction_hash: tx,
                source,
                rpc_url: rpc,
                indexer_url: indexer,
                indexer_key,
                output_diagram: diagram.output,
                output_json: diagram.json,
                diagram_config,
                print_summary: diagram.summary,
            };

            // Validate args first
            validate_args(&args)?;

            execute_generate(args)?;
        }

        Commands::Render { trace, tx, diagram } => {
            let diagram_config = diagram_config_from_flags(
                diagram.title,
                diagram.gas,
                !diagram.no_details,
                &diagram.names,
                &diagram.functions,
            )?;

            execute_render(RenderArgs {
                trace_file: trace,
                transaction_hash: tx,
                output_diagram: diagram.output,
                output_json: diagram.json,
                diagram_config,
                print_summary: diagram.summary,
            })?;
        }

        Commands::Decode { data } => {
            decode_return_data(&data)?;
        }

        Commands::Validate { file } => {
            validate_report_file(file)?;
        }

        Commands::Version => {
            display_version();
        }
    }

    Ok(())
}
