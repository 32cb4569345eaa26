//! Keel operations: the input language of the ownership validator.
//!
//! A program is an ordered list of operations: scope entry and exit,
//! bindings, borrows, moves, clones, returns, uses and explicit drops.
//! Front ends (`keel_parser`) produce a [`Program`]; the validator in
//! `keel_borrow` replays it.
//!
//! This crate contains no validation logic, only data and printing.

pub mod common;
pub mod op;
pub mod print;


pub use common::{Span, Spanned};
pub use op::{BorrowKind, Name, OpKind, Operation, Program};
