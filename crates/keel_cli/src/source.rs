//! Reading program files through the right front end.

use std::fs;
use std::path::{Path, PathBuf};

use keel_ops::Program;
use keel_parser::ParseError;
use tracing::debug;

use crate::config::InputFormat;

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("{}", render_parse_errors(.path, .errors))]
    Parse {
        path: PathBuf,
        errors: Vec<ParseError>,
    },
}

/// One `path:line:column: message` line per error.
fn render_parse_errors(path: &Path, errors: &[ParseError]) -> String {
    errors
        .iter()
        .map(|error| format!("{}:{}", path.display(), error))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Read and parse a program. `input` overrides the extension-based guess.
pub fn load_program(path: &Path, input: Option<InputFormat>) -> Result<Program, LoadError> {
    let source = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let format = input.unwrap_or_else(|| InputFormat::from_path(path));
    debug!(path = %path.display(), ?format, bytes = source.len(), "loading program");
    parse_source(&source, format).map_err(|errors| LoadError::Parse {
        path: path.to_path_buf(),
        errors,
    })
}

pub fn parse_source(source: &str, format: InputFormat) -> Result<Program, Vec<ParseError>> {
    match format {
        InputFormat::Text => keel_parser::parse_text(source),
        InputFormat::Json => keel_parser::parse_json(source).map_err(|e| vec![e]),
    }
}
