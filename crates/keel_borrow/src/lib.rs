//! Keel Borrow: a static model of single ownership and scoped borrowing.
//!
//! The [`Validator`] replays a [`keel_ops::Program`] against three pieces of
//! state and accepts it only if no operation breaks an ownership rule:
//!
//! - [`ResourceTable`]: every allocated value, its owner scope and whether
//!   it is live, moved out or dropped.
//! - [`BorrowTracker`]: the active shared and exclusive views of each value.
//! - [`ScopeStack`]: nested scopes; exiting one releases its borrows and then
//!   drops its resources in reverse creation order.
//!
//! The rules enforced:
//!
//! - No use, borrow or move of a moved or dropped value.
//! - Shared borrows may coexist; an exclusive borrow excludes every other.
//! - A borrow may not live in a scope that outlives its target's owner.
//! - Nothing is dropped while borrowed.
//! - Scopes close in strict LIFO order.
//!
//! Validation is fail-fast: the first violation ends the run and is the only
//! one reported.

pub mod ids;
pub mod error;
pub mod resource;
pub mod borrow;
pub mod scope;
pub mod resolve;
pub mod report;
pub mod validator;


pub use borrow::{Borrow, BorrowTracker};
pub use error::{ErrorKind, Violation};
pub use ids::{AllocationId, BorrowId, ResourceId, ScopeId};
pub use report::{Rejection, Report, Stats, TraceEntry, Verdict};
pub use resolve::{resolve, Action};
pub use resource::{Resource, ResourceKind, ResourceState, ResourceTable};
pub use scope::{Frame, ScopeStack};
pub use validator::{CheckOptions, Validator};

/// Validate a program with default options.
pub fn validate(program: &keel_ops::Program) -> Report {
    Validator::new(CheckOptions::default()).validate(program)
}
