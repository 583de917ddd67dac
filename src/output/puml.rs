//! PlantUML diagram output writer.

use super::{ensure_parent_dir, validate_path};
use crate::utils::error::OutputError;
use log::{debug, info};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Write diagram text to a file
///
/// **Public** - main entry point for diagram output
///
/// # Errors
/// * `OutputError::WriteFailed` - I/O error during write
/// * `OutputError::InvalidPath` - Path is invalid
pub fn write_diagram(diagram: &str, output_path: impl AsRef<Path>) -> Result<(), OutputError> {
    let output_path = output_path.as_ref();

    info!("Writing diagram to: {}", output_path.display());

    validate_path(output_path)?;
    if output_path.extension().map_or(true, |ext| ext != "puml") {
        debug!("Diagram file does not have a .puml extension: {}", output_path.display());
    }
    ensure_parent_dir(output_path)?;

    let file = File::create(output_path).map_err(OutputError::WriteFailed)?;
    let mut writer = BufWriter::new(file);

    writer
        .write_all(diagram.as_bytes())
        .map_err(OutputError::WriteFailed)?;
    writer.flush().map_err(OutputError::WriteFailed)?;

    info!("Diagram written successfully ({} bytes)", diagram.len());
    Ok(())
}

/// Read diagram text back, checking its `@startuml`/`@enduml` framing
pub fn read_diagram(input_path: impl AsRef<Path>) -> Result<String, OutputError> {
    let input_path = input_path.as_ref();
    let text = std::fs::read_to_string(input_path).map_err(OutputError::WriteFailed)?;

    let trimmed = text.trim();
    if !trimmed.starts_with("@startuml") || !trimmed.ends_with("@enduml") {
        return Err(OutputError::InvalidDiagram(input_path.display().to_string()));
    }

    Ok(text)
}
