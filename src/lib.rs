//! trace-sequence
//!
//! Reconstructs the call structure of a single EVM transaction from a
//! node's `callTracer` output or from an indexer's paginated messages, and
//! renders it as a PlantUML sequence diagram.
//!
//! This crate provides the core implementation for the
//! `trace-sequence` CLI tool.
//!
//! ## Getting Started
//!
//! ```bash
//! trace-sequence generate --tx 0x... --rpc http://localhost:8545 --output tx.puml
//! trace-sequence render --trace trace.json --tx 0x... --output tx.puml
//! ```
//!
//! The pipeline is available as a library too: `parser::parse_call_trace`,
//! `aggregator::build_messages` and `diagram::generate_diagram`.

pub mod aggregator;
pub mod commands;
pub mod diagram;
pub mod output;
pub mod parser;
pub mod rpc;
pub mod utils;
