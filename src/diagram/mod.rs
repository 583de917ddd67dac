//! Sequence diagram synthesis.
//!
//! Converts a transaction's unified message sequence into PlantUML text:
//! participants, call and return arrows, activation bars and failure notes.

pub mod generator;

// Re-export main types
pub use generator::{arrow_for, generate_diagram, participant_alias, DiagramConfig};
