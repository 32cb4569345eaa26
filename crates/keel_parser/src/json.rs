//! JSON front end.
//!
//! Accepts either a bare array of operations or an object with an `ops`
//! array:
//! ```json
//! [{"op": "enter", "scope": "S0"},
//!  {"op": "bind", "name": "R1", "scope": "S0"},
//!  {"op": "borrow", "resource": "R1", "kind": "shared", "scope": "S0", "label": "B1"}]
//! ```
//!
//! Every name must be a valid text-syntax identifier, so a decoded program
//! always prints as text that parses back to the same program.

use keel_ops::{Operation, Program, Span};
use serde::Deserialize;

use crate::lexer::is_identifier;
use crate::ParseError;

#[derive(Deserialize)]
struct Wrapped {
    ops: Vec<Operation>,
}

/// Decode a JSON program.
pub fn parse_json(source: &str) -> Result<Program, ParseError> {
    let decoded = if source.trim_start().starts_with('{') {
        serde_json::from_str::<Wrapped>(source).map(|w| w.ops)
    } else {
        serde_json::from_str::<Vec<Operation>>(source)
    };
    let ops = decoded.map_err(|e| {
        let span = Span::new(0, 0, e.line() as u32, e.column() as u32);
        ParseError::new(format!("invalid JSON program: {}", e), span)
    })?;
    for (index, op) in ops.iter().enumerate() {
        check_names(index, op)?;
    }
    Ok(Program::from_ops(ops))
}

fn check_names(index: usize, op: &Operation) -> Result<(), ParseError> {
    let mut names: Vec<(&str, &str)> = Vec::with_capacity(3);
    match op {
        Operation::Enter { scope } | Operation::Exit { scope } => names.push(("scope", scope)),
        Operation::Bind { name, scope, .. } => {
            names.push(("resource", name));
            names.push(("scope", scope));
        }
        Operation::Borrow {
            resource,
            scope,
            label,
            ..
        } => {
            names.push(("resource", resource));
            names.push(("scope", scope));
            if let Some(label) = label {
                names.push(("borrow", label));
            }
        }
        Operation::Release { label } => names.push(("borrow", label)),
        Operation::Move {
            resource,
            scope,
            as_name,
        } => {
            names.push(("resource", resource));
            names.push(("scope", scope));
            if let Some(new_name) = as_name {
                names.push(("resource", new_name));
            }
        }
        Operation::Clone {
            resource,
            scope,
            as_name,
        } => {
            names.push(("resource", resource));
            names.push(("scope", scope));
            names.push(("resource", as_name));
        }
        Operation::Return { resource, scope } => {
            names.push(("resource", resource));
            names.push(("scope", scope));
        }
        Operation::Use { resource } | Operation::Mutate { resource } | Operation::Drop { resource } => {
            names.push(("resource", resource))
        }
    }

    match names.into_iter().find(|(_, name)| !is_identifier(name)) {
        Some((what, name)) => Err(ParseError::new(
            format!("operation #{}: `{}` is not a valid {} name", index, name, what),
            Span::default(),
        )),
        None => Ok(()),
    }
}
