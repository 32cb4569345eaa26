//! `keel fmt`: re-print a program in canonical text syntax.

use std::path::Path;

use anyhow::{Context, Result};

use crate::config::InputFormat;
use crate::source::load_program;

/// Canonical text of the program at `path`.
pub fn format_file(path: &Path, input: Option<InputFormat>) -> Result<String> {
    let program = load_program(path, input)?;
    Ok(program.to_text())
}

/// Whether the file at `path` is already in canonical form. Only text
/// files can be; a JSON program always needs formatting.
pub fn is_formatted(path: &Path, input: Option<InputFormat>) -> Result<bool> {
    let formatted = format_file(path, input)?;
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    Ok(source == formatted)
}
