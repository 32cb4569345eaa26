//! Move/clone resolver: which mechanism each operation kind triggers.
//!
//! Pure policy: no state, no side effects. The validator asks the resolver
//! what an operation means and then drives the table, tracker and stack
//! accordingly, so the policy can be read (and tested) on its own.

use std::fmt;

use keel_ops::{BorrowKind, OpKind};
use serde::Serialize;

/// The mechanism an operation is carried out with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Push a scope.
    OpenScope,
    /// Pop a scope: release its borrows, then drop its resources.
    CloseScope,
    /// Allocate a new resource.
    Create,
    /// Transfer ownership to a successor resource; the source becomes moved.
    Move,
    /// Register a borrow of the given kind.
    Acquire(BorrowKind),
    /// Make an independent copy (or, for shared handles, another handle).
    Clone,
    /// Re-home the resource in an enclosing scope, identity unchanged.
    Rebind,
    /// Read through the owning binding.
    Read,
    /// Write through the owning binding.
    Write,
    /// End a borrow early.
    Release,
    /// Drop the resource before its scope ends.
    Forfeit,
}

/// Map an operation kind to its mechanism.
pub fn resolve(kind: OpKind) -> Action {
    match kind {
        OpKind::Enter => Action::OpenScope,
        OpKind::Exit => Action::CloseScope,
        OpKind::Bind => Action::Create,
        OpKind::PassByValue => Action::Move,
        OpKind::PassByShared => Action::Acquire(BorrowKind::Shared),
        OpKind::PassByExclusive => Action::Acquire(BorrowKind::Exclusive),
        OpKind::ExplicitClone => Action::Clone,
        OpKind::Return => Action::Rebind,
        OpKind::Use => Action::Read,
        OpKind::Mutate => Action::Write,
        OpKind::Release => Action::Release,
        OpKind::Drop => Action::Forfeit,
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::OpenScope => write!(f, "open scope"),
            Action::CloseScope => write!(f, "close scope"),
            Action::Create => write!(f, "create"),
            Action::Move => write!(f, "move"),
            Action::Acquire(kind) => write!(f, "acquire {}", kind),
            Action::Clone => write!(f, "clone"),
            Action::Rebind => write!(f, "rebind"),
            Action::Read => write!(f, "read"),
            Action::Write => write!(f, "write"),
            Action::Release => write!(f, "release"),
            Action::Forfeit => write!(f, "forfeit"),
        }
    }
}
