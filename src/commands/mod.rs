//! CLI command implementations.
//!
//! Each command is implemented in its own module.
//! Commands orchestrate the various library components to perform user tasks.

pub mod generate;
pub mod models;
pub mod utils;

// Re-export main command functions
pub use generate::{diagram_config_from_flags, execute_generate, execute_render, validate_args};
pub use models::{GenerateArgs, RenderArgs, SourceKind};
pub use utils::{decode_return_data, display_version, validate_report_file};
