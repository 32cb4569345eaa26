//! Violation taxonomy.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ids::ResourceId;

/// Why a program was rejected. Every kind is terminal for the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorKind {
    /// An operation referenced a resource that was moved out.
    UseAfterMove,
    /// An operation referenced a resource that was already dropped.
    UseAfterDrop,
    /// A shared and an exclusive access overlapped, or two exclusive ones did.
    BorrowConflict,
    /// A resource was dropped while a borrow still pointed at it.
    DropWhileBorrowed,
    /// A scope was exited out of LIFO order (or a return target does not
    /// enclose the owner).
    ScopeMismatch,
    /// A borrow was placed in a scope that outlives its target's owner.
    DanglingBorrowEscape,
    /// A resource name that was never bound.
    UnknownName,
    /// A scope name that is not currently open.
    UnknownScope,
    /// A borrow label that is not currently active.
    UnknownBorrow,
    /// A name that is already bound to something live.
    DuplicateName,
}

impl ErrorKind {
    /// Short stable code used in diagnostics and JSON output.
    pub fn code(self) -> &'static str {
        match self {
            ErrorKind::UseAfterMove => "use-after-move",
            ErrorKind::UseAfterDrop => "use-after-drop",
            ErrorKind::BorrowConflict => "borrow-conflict",
            ErrorKind::DropWhileBorrowed => "drop-while-borrowed",
            ErrorKind::ScopeMismatch => "scope-mismatch",
            ErrorKind::DanglingBorrowEscape => "dangling-borrow-escape",
            ErrorKind::UnknownName => "unknown-name",
            ErrorKind::UnknownScope => "unknown-scope",
            ErrorKind::UnknownBorrow => "unknown-borrow",
            ErrorKind::DuplicateName => "duplicate-name",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A rule violation detected by one of the components.
///
/// The validator turns this into a [`Rejection`](crate::Rejection) by
/// attaching the operation index and source line.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct Violation {
    pub kind: ErrorKind,
    pub resource: Option<ResourceId>,
    pub message: String,
}

impl Violation {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            resource: None,
            message: message.into(),
        }
    }

    /// Attach the resource the violation is about.
    pub fn on(mut self, resource: ResourceId) -> Self {
        self.resource = Some(resource);
        self
    }
}
