//! `keel check`: validate one or more program files.

use std::path::{Path, PathBuf};

use keel_borrow::{CheckOptions, Report, Validator};
use serde::Serialize;
use tracing::{debug, info};

use crate::config::{InputFormat, OutputFormat};
use crate::source::{load_program, LoadError};

pub struct CheckOpts {
    pub files: Vec<PathBuf>,
    pub format: OutputFormat,
    pub input: Option<InputFormat>,
    pub options: CheckOptions,
}

/// Worst result over all files checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Outcome {
    Accepted,
    Rejected,
    Failed,
}

impl Outcome {
    pub fn exit_code(self) -> u8 {
        match self {
            Outcome::Accepted => 0,
            Outcome::Rejected => 1,
            Outcome::Failed => 2,
        }
    }
}

#[derive(Serialize)]
struct FileReport<'a> {
    file: String,
    #[serde(flatten)]
    report: &'a Report,
}

#[derive(Serialize)]
struct FileFailure {
    file: String,
    error: String,
}

/// Check every file, printing one result per file. A file that cannot be
/// read or parsed is reported and skipped.
pub fn run(opts: &CheckOpts) -> Outcome {
    let mut outcome = Outcome::Accepted;
    for path in &opts.files {
        let result = check_file(path, opts.input, &opts.options);
        let file_outcome = match &result {
            Ok(report) if report.is_accepted() => Outcome::Accepted,
            Ok(_) => Outcome::Rejected,
            Err(_) => Outcome::Failed,
        };
        match (&result, opts.format) {
            (Ok(report), OutputFormat::Text) => println!("{}", render_text(path, report)),
            (Ok(report), OutputFormat::Json) => println!("{}", render_json(path, report)),
            (Err(err), OutputFormat::Text) => eprintln!("error: {}", err),
            (Err(err), OutputFormat::Json) => println!("{}", render_failure_json(path, err)),
        }
        outcome = outcome.max(file_outcome);
    }
    outcome
}

pub fn check_file(
    path: &Path,
    input: Option<InputFormat>,
    options: &CheckOptions,
) -> Result<Report, LoadError> {
    let program = load_program(path, input)?;
    debug!(path = %path.display(), operations = program.len(), "checking");
    let report = Validator::new(options.clone()).validate(&program);
    if let Some(rejection) = report.rejection() {
        info!(path = %path.display(), reason = %rejection.reason, "rejected");
    }
    Ok(report)
}

/// One line per file: `path: ok (...)` or `path: error[...]: ...`.
pub fn render_text(path: &Path, report: &Report) -> String {
    match report.rejection() {
        None => format!(
            "{}: ok ({} operations, {} resources, {} bytes copied)",
            path.display(),
            report.stats.operations,
            report.stats.resources,
            report.stats.bytes_copied
        ),
        Some(rejection) => format!("{}: {}", path.display(), rejection),
    }
}

/// The report as a single JSON line with a `file` field added.
pub fn render_json(path: &Path, report: &Report) -> String {
    let line = FileReport {
        file: path.display().to_string(),
        report,
    };
    to_json_line(&line)
}

fn render_failure_json(path: &Path, err: &LoadError) -> String {
    to_json_line(&FileFailure {
        file: path.display().to_string(),
        error: err.to_string(),
    })
}

fn to_json_line<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value)
        .unwrap_or_else(|e| serde_json::json!({ "error": e.to_string() }).to_string())
}
