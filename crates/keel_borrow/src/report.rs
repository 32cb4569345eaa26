//! Validation reports.

use std::fmt;

use serde::Serialize;

use crate::error::ErrorKind;
use crate::resolve::Action;

/// Outcome of one validation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum Verdict {
    /// Every operation respected the ownership rules.
    Accepted,
    /// The first violation found.
    Rejected(Rejection),
}

/// The first violated rule, located in the program.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rejection {
    pub reason: ErrorKind,
    /// Zero-based index of the offending operation. Equal to the program
    /// length when the violation was found while closing scopes left open
    /// at the end.
    pub op_index: usize,
    /// Front-end name of the resource involved, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource: Option<String>,
    /// Source line of the operation, for text input.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    pub message: String,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "error[{}]: {} (op #{}", self.reason, self.message, self.op_index)?;
        if let Some(line) = self.line {
            write!(f, ", line {}", line)?;
        }
        write!(f, ")")
    }
}

/// Counters collected over a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Stats {
    /// Operations applied successfully.
    pub operations: usize,
    pub resources: u64,
    pub moves: u64,
    pub clones: u64,
    /// Clones of shared handles (no copy made).
    pub shared_clones: u64,
    /// Bytes copied by clones of unique resources.
    pub bytes_copied: u64,
    pub drops: u64,
    pub allocations_released: u64,
    pub peak_borrows: usize,
    pub max_depth: usize,
}

/// State after one applied operation, recorded when tracing is requested.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TraceEntry {
    pub op_index: usize,
    /// The operation in text syntax.
    pub op: String,
    pub action: Action,
    pub depth: usize,
    pub live_resources: usize,
    pub active_borrows: usize,
}

/// Verdict plus run statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    #[serde(flatten)]
    pub verdict: Verdict,
    pub stats: Stats,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub trace: Vec<TraceEntry>,
}

impl Report {
    pub fn is_accepted(&self) -> bool {
        matches!(self.verdict, Verdict::Accepted)
    }

    pub fn rejection(&self) -> Option<&Rejection> {
        match &self.verdict {
            Verdict::Accepted => None,
            Verdict::Rejected(r) => Some(r),
        }
    }
}
