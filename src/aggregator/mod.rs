//! Reconciliation of both trace sources into one message model.
//!
//! This module handles:
//! - Cursor pagination over indexer pages
//! - Building the unified message sequence from node traces or indexer records
//! - Message statistics

pub mod indexer;
pub mod message_builder;
pub mod metrics;

// Re-export main types and functions
pub use indexer::{collect_pages, extract_cursor, IndexerPage, IndexerRecord, MessagePageSource};
pub use message_builder::{build_messages, classify_tag, TraceInput};
pub use metrics::MessageStats;
