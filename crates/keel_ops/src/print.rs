//! Canonical text printer.
//!
//! Prints operations in the same line syntax the text front end reads,
//! so `keel fmt` output parses back to an equal program:
//! ```text
//! enter S0
//! bind R1 @ S0 size 64
//! borrow mut R1 @ S0 = B1
//! release B1
//! exit S0
//! ```

use std::fmt;

use crate::op::{BorrowKind, Operation, Program};

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Enter { scope } => write!(f, "enter {}", scope),
            Operation::Exit { scope } => write!(f, "exit {}", scope),
            Operation::Bind {
                name,
                scope,
                shared,
                size,
            } => {
                write!(f, "bind {} @ {}", name, scope)?;
                if *shared {
                    write!(f, " rc")?;
                }
                if *size > 0 {
                    write!(f, " size {}", size)?;
                }
                Ok(())
            }
            Operation::Borrow {
                resource,
                kind,
                scope,
                label,
            } => {
                match kind {
                    BorrowKind::Shared => write!(f, "borrow {} @ {}", resource, scope)?,
                    BorrowKind::Exclusive => write!(f, "borrow mut {} @ {}", resource, scope)?,
                }
                if let Some(label) = label {
                    write!(f, " = {}", label)?;
                }
                Ok(())
            }
            Operation::Release { label } => write!(f, "release {}", label),
            Operation::Move {
                resource,
                scope,
                as_name,
            } => {
                write!(f, "move {} @ {}", resource, scope)?;
                if let Some(new_name) = as_name {
                    write!(f, " as {}", new_name)?;
                }
                Ok(())
            }
            Operation::Clone {
                resource,
                scope,
                as_name,
            } => write!(f, "clone {} @ {} as {}", resource, scope, as_name),
            Operation::Return { resource, scope } => write!(f, "return {} @ {}", resource, scope),
            Operation::Use { resource } => write!(f, "use {}", resource),
            Operation::Mutate { resource } => write!(f, "mutate {}", resource),
            Operation::Drop { resource } => write!(f, "drop {}", resource),
        }
    }
}

impl Program {
    /// Render the whole program, one operation per line.
    ///
    /// Operations inside a scope are indented by four spaces per level;
    /// indentation is cosmetic and ignored by the parser.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        let mut depth: usize = 0;
        for op in self.operations() {
            if matches!(op, Operation::Exit { .. }) {
                depth = depth.saturating_sub(1);
            }
            for _ in 0..depth {
                out.push_str("    ");
            }
            out.push_str(&op.to_string());
            out.push('\n');
            if matches!(op, Operation::Enter { .. }) {
                depth += 1;
            }
        }
        out
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}
