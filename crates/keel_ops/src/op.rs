//! Operation definitions.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::common::{Span, Spanned};

/// A front-end identifier for a scope, resource binding or borrow label.
pub type Name = String;

/// Which kind of view a borrow grants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BorrowKind {
    /// Read-only; any number may coexist.
    Shared,
    /// Read-write; at most one, and never alongside a shared borrow.
    Exclusive,
}

impl fmt::Display for BorrowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BorrowKind::Shared => write!(f, "shared"),
            BorrowKind::Exclusive => write!(f, "exclusive"),
        }
    }
}

/// A single operation of a program.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    /// `enter S`: open a nested scope.
    Enter { scope: Name },

    /// `exit S`: close the innermost scope.
    Exit { scope: Name },

    /// `bind R @ S [rc] [size N]`: allocate a resource owned by `S`.
    Bind {
        name: Name,
        scope: Name,
        /// Reference-counted (shared ownership) instead of unique.
        #[serde(default, skip_serializing_if = "is_false")]
        shared: bool,
        /// Size in bytes; the cost a unique clone has to copy.
        #[serde(default, skip_serializing_if = "is_zero")]
        size: u64,
    },

    /// `borrow [mut] R @ S [= B]`: pass by shared or exclusive reference.
    Borrow {
        resource: Name,
        kind: BorrowKind,
        scope: Name,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        label: Option<Name>,
    },

    /// `release B`: end a labelled borrow before its scope exits.
    Release { label: Name },

    /// `move R @ S [as R2]`: pass by value; ownership moves to `S`.
    Move {
        resource: Name,
        scope: Name,
        #[serde(rename = "as", default, skip_serializing_if = "Option::is_none")]
        as_name: Option<Name>,
    },

    /// `clone R @ S as R2`: explicit deep copy (or handle copy for `rc`).
    Clone {
        resource: Name,
        scope: Name,
        #[serde(rename = "as")]
        as_name: Name,
    },

    /// `return R @ S`: hand ownership to an enclosing scope, same identity.
    Return { resource: Name, scope: Name },

    /// `use R`: read the value through its owning binding.
    Use { resource: Name },

    /// `mutate R`: write the value through its owning binding.
    Mutate { resource: Name },

    /// `drop R`: forfeit the resource before its scope exits.
    Drop { resource: Name },
}

fn is_false(b: &bool) -> bool {
    !*b
}

fn is_zero(n: &u64) -> bool {
    *n == 0
}

impl Operation {
    pub fn kind(&self) -> OpKind {
        match self {
            Operation::Enter { .. } => OpKind::Enter,
            Operation::Exit { .. } => OpKind::Exit,
            Operation::Bind { .. } => OpKind::Bind,
            Operation::Borrow {
                kind: BorrowKind::Shared,
                ..
            } => OpKind::PassByShared,
            Operation::Borrow {
                kind: BorrowKind::Exclusive,
                ..
            } => OpKind::PassByExclusive,
            Operation::Release { .. } => OpKind::Release,
            Operation::Move { .. } => OpKind::PassByValue,
            Operation::Clone { .. } => OpKind::ExplicitClone,
            Operation::Return { .. } => OpKind::Return,
            Operation::Use { .. } => OpKind::Use,
            Operation::Mutate { .. } => OpKind::Mutate,
            Operation::Drop { .. } => OpKind::Drop,
        }
    }

    /// The resource binding this operation acts on, if any.
    pub fn resource(&self) -> Option<&str> {
        match self {
            Operation::Bind { name, .. } => Some(name),
            Operation::Borrow { resource, .. }
            | Operation::Move { resource, .. }
            | Operation::Clone { resource, .. }
            | Operation::Return { resource, .. }
            | Operation::Use { resource }
            | Operation::Mutate { resource }
            | Operation::Drop { resource } => Some(resource),
            Operation::Enter { .. } | Operation::Exit { .. } | Operation::Release { .. } => None,
        }
    }

    /// The scope named by this operation, if any.
    pub fn scope(&self) -> Option<&str> {
        match self {
            Operation::Enter { scope }
            | Operation::Exit { scope }
            | Operation::Bind { scope, .. }
            | Operation::Borrow { scope, .. }
            | Operation::Move { scope, .. }
            | Operation::Clone { scope, .. }
            | Operation::Return { scope, .. } => Some(scope),
            Operation::Release { .. }
            | Operation::Use { .. }
            | Operation::Mutate { .. }
            | Operation::Drop { .. } => None,
        }
    }
}

/// The fixed set of operation kinds the move/clone resolver understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpKind {
    Enter,
    Exit,
    Bind,
    PassByValue,
    PassByShared,
    PassByExclusive,
    ExplicitClone,
    Return,
    Use,
    Mutate,
    Release,
    Drop,
}

impl OpKind {
    pub const ALL: [OpKind; 12] = [
        OpKind::Enter,
        OpKind::Exit,
        OpKind::Bind,
        OpKind::PassByValue,
        OpKind::PassByShared,
        OpKind::PassByExclusive,
        OpKind::ExplicitClone,
        OpKind::Return,
        OpKind::Use,
        OpKind::Mutate,
        OpKind::Release,
        OpKind::Drop,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            OpKind::Enter => "enter",
            OpKind::Exit => "exit",
            OpKind::Bind => "bind",
            OpKind::PassByValue => "pass-by-value",
            OpKind::PassByShared => "pass-by-shared",
            OpKind::PassByExclusive => "pass-by-exclusive",
            OpKind::ExplicitClone => "explicit-clone",
            OpKind::Return => "return",
            OpKind::Use => "use",
            OpKind::Mutate => "mutate",
            OpKind::Release => "release",
            OpKind::Drop => "drop",
        }
    }
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An ordered operation sequence, each operation carrying its location.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    pub ops: Vec<Spanned<Operation>>,
}

impl Program {
    pub fn new() -> Self {
        Self { ops: Vec::new() }
    }

    /// Build a program from bare operations (no source locations).
    pub fn from_ops(ops: impl IntoIterator<Item = Operation>) -> Self {
        Self {
            ops: ops
                .into_iter()
                .map(|op| Spanned::new(op, Span::default()))
                .collect(),
        }
    }

    pub fn push(&mut self, op: Operation, span: Span) {
        self.ops.push(Spanned::new(op, span));
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Spanned<Operation>> {
        self.ops.get(index)
    }

    /// Iterate over the operations without their spans.
    pub fn operations(&self) -> impl Iterator<Item = &Operation> {
        self.ops.iter().map(|s| &s.node)
    }
}
