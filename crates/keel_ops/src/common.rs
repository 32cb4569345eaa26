//! Source locations shared by every operation.

use serde::{Deserialize, Serialize};

/// Source location of an operation.
///
/// `start`/`end` are byte offsets; `line`/`column` are 1-based. Programs
/// that did not come from text (JSON, hand-built in tests) carry the
/// default span, where `line == 0` means "unknown".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Span {
    pub start: u32,
    pub end: u32,
    pub line: u32,
    pub column: u32,
}

impl Span {
    pub fn new(start: u32, end: u32, line: u32, column: u32) -> Self {
        Self {
            start,
            end,
            line,
            column,
        }
    }

    /// Merge two spans into one that covers both. Keeps the earlier position.
    pub fn merge(self, other: Span) -> Span {
        let (line, column) = if (self.line, self.column) <= (other.line, other.column) {
            (self.line, self.column)
        } else {
            (other.line, other.column)
        };
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
            line,
            column,
        }
    }

    /// Whether this span points at real source text.
    pub fn is_known(&self) -> bool {
        self.line > 0
    }
}

/// A node paired with its source location.
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned<T> {
    pub node: T,
    pub span: Span,
}

impl<T> Spanned<T> {
    pub fn new(node: T, span: Span) -> Self {
        Self { node, span }
    }
}
