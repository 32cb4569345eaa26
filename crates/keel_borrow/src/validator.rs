//! Validator: replays a program and accepts or rejects it.
//!
//! Operations are applied strictly in order. Each one is mapped to an
//! [`Action`] by the resolver and carried out against the resource table,
//! borrow tracker and scope stack. The first violation stops the run; the
//! remaining state is then unwound so every borrow ends released and every
//! resource ends moved or dropped.
//!
//! A validator is single-use: [`Validator::validate`] consumes it. Validate
//! independent programs with independent validators.

use std::collections::HashMap;

use keel_ops::{BorrowKind, Operation, Program, Span};
use tracing::{debug, info, trace};

use crate::borrow::BorrowTracker;
use crate::error::{ErrorKind, Violation};
use crate::ids::{BorrowId, ResourceId, ScopeId};
use crate::report::{Rejection, Report, Stats, TraceEntry, Verdict};
use crate::resolve::{resolve, Action};
use crate::resource::{ResourceState, ResourceTable};
use crate::scope::{Frame, ScopeStack};

/// Knobs for one validation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckOptions {
    /// Close scopes still open at the end of the program as if they were
    /// exited in LIFO order. When false, an open scope at the end is a
    /// `ScopeMismatch`.
    pub close_open_scopes: bool,
    /// Record a [`TraceEntry`] after every applied operation.
    pub record_trace: bool,
}

impl Default for CheckOptions {
    fn default() -> Self {
        Self {
            close_open_scopes: true,
            record_trace: false,
        }
    }
}

pub struct Validator {
    options: CheckOptions,
    table: ResourceTable,
    borrows: BorrowTracker,
    scopes: ScopeStack,
    /// Open scopes by front-end name.
    scope_names: HashMap<String, ScopeId>,
    /// Binding name -> the resource it currently names (possibly moved or dropped).
    bindings: HashMap<String, ResourceId>,
    /// Active borrow labels.
    labels: HashMap<String, BorrowId>,
    trace: Vec<TraceEntry>,
    applied: usize,
}

impl Validator {
    pub fn new(options: CheckOptions) -> Self {
        Self {
            options,
            table: ResourceTable::new(),
            borrows: BorrowTracker::new(),
            scopes: ScopeStack::new(),
            scope_names: HashMap::new(),
            bindings: HashMap::new(),
            labels: HashMap::new(),
            trace: Vec::new(),
            applied: 0,
        }
    }

    /// Validate a whole program.
    pub fn validate(mut self, program: &Program) -> Report {
        let verdict = match self.run(program) {
            Ok(()) => {
                info!(operations = program.len(), "program accepted");
                Verdict::Accepted
            }
            Err(rejection) => {
                info!(
                    reason = %rejection.reason,
                    op_index = rejection.op_index,
                    "program rejected"
                );
                self.abort();
                Verdict::Rejected(rejection)
            }
        };

        Report {
            verdict,
            stats: self.stats(),
            trace: std::mem::take(&mut self.trace),
        }
    }

    fn run(&mut self, program: &Program) -> Result<(), Rejection> {
        for (index, op) in program.ops.iter().enumerate() {
            self.step(index, &op.node, op.span)?;
        }
        self.finish(program.len())
    }

    /// Apply one operation. `index` is only used for reporting.
    pub fn step(&mut self, index: usize, op: &Operation, span: Span) -> Result<(), Rejection> {
        let action = resolve(op.kind());
        debug!(index, %op, %action, "apply");

        if let Err(violation) = self.apply(action, op) {
            return Err(self.reject(index, Some(op), span, violation));
        }
        self.applied += 1;

        if self.options.record_trace {
            self.trace.push(TraceEntry {
                op_index: index,
                op: op.to_string(),
                action,
                depth: self.scopes.depth(),
                live_resources: self.table.live_count(),
                active_borrows: self.borrows.active_count(),
            });
        }
        Ok(())
    }

    /// End of program: close (or reject) scopes that are still open.
    /// `index` is the program length.
    pub fn finish(&mut self, index: usize) -> Result<(), Rejection> {
        while let Some(top) = self.scopes.top() {
            if !self.options.close_open_scopes {
                let violation = Violation::new(
                    ErrorKind::ScopeMismatch,
                    format!("scope `{}` is never exited", self.scopes.name(top)),
                );
                return Err(self.reject(index, None, Span::default(), violation));
            }
            trace!(scope = %self.scopes.name(top), "closing scope left open");
            if let Err(violation) = self.close_scope(top) {
                return Err(self.reject(index, None, Span::default(), violation));
            }
        }
        Ok(())
    }

    /// Unwind every open scope without checks: release all borrows, drop
    /// all live resources innermost scope first.
    pub fn abort(&mut self) {
        for frame in self.scopes.unwind() {
            for borrow in frame.borrows() {
                self.borrows.release_if_active(*borrow);
            }
            for resource in self.drop_order(&frame) {
                self.table.force_drop(resource);
            }
        }
        self.scope_names.clear();
        self.labels.clear();
    }

    fn reject(
        &self,
        index: usize,
        op: Option<&Operation>,
        span: Span,
        violation: Violation,
    ) -> Rejection {
        let resource = violation
            .resource
            .map(|id| self.table.name_of(id))
            .or_else(|| op.and_then(Operation::resource).map(String::from));
        Rejection {
            reason: violation.kind,
            op_index: index,
            resource,
            line: span.is_known().then_some(span.line),
            message: violation.message,
        }
    }

    // ---- Accessors ---------------------------------------------------------

    pub fn table(&self) -> &ResourceTable {
        &self.table
    }

    pub fn borrows(&self) -> &BorrowTracker {
        &self.borrows
    }

    pub fn scopes(&self) -> &ScopeStack {
        &self.scopes
    }

    /// The resource a binding name currently refers to.
    pub fn binding(&self, name: &str) -> Option<ResourceId> {
        self.bindings.get(name).copied()
    }

    pub fn stats(&self) -> Stats {
        let table = self.table.stats();
        Stats {
            operations: self.applied,
            resources: table.created,
            moves: table.moves,
            clones: table.clones,
            shared_clones: table.shared_clones,
            bytes_copied: table.bytes_copied,
            drops: table.drops,
            allocations_released: table.allocations_released,
            peak_borrows: self.borrows.peak(),
            max_depth: self.scopes.max_depth(),
        }
    }

    // ---- Dispatch ----------------------------------------------------------

    fn apply(&mut self, action: Action, op: &Operation) -> Result<(), Violation> {
        match (action, op) {
            (Action::OpenScope, Operation::Enter { scope }) => self.open_scope(scope),
            (Action::CloseScope, Operation::Exit { scope }) => {
                let id = self.exit_target(scope)?;
                self.close_scope(id)
            }
            (
                Action::Create,
                Operation::Bind {
                    name,
                    scope,
                    shared,
                    size,
                },
            ) => self.bind(name, scope, *shared, *size),
            (
                Action::Acquire(kind),
                Operation::Borrow {
                    resource,
                    scope,
                    label,
                    ..
                },
            ) => self.acquire(resource, kind, scope, label.as_deref()),
            (Action::Release, Operation::Release { label }) => self.release(label),
            (
                Action::Move,
                Operation::Move {
                    resource,
                    scope,
                    as_name,
                },
            ) => self.move_resource(resource, scope, as_name.as_deref()),
            (
                Action::Clone,
                Operation::Clone {
                    resource,
                    scope,
                    as_name,
                },
            ) => self.clone_resource(resource, scope, as_name),
            (Action::Rebind, Operation::Return { resource, scope }) => {
                self.return_resource(resource, scope)
            }
            (Action::Read, Operation::Use { resource }) => self.read(resource),
            (Action::Write, Operation::Mutate { resource }) => self.write(resource),
            (Action::Forfeit, Operation::Drop { resource }) => {
                let id = self.lookup(resource)?;
                self.table.drop_resource(id, &self.borrows)
            }
            (action, op) => unreachable!("resolver mapped `{}` to {:?}", op, action),
        }
    }

    // ---- Name resolution ---------------------------------------------------

    fn scope_id(&self, name: &str) -> Result<ScopeId, Violation> {
        self.scope_names.get(name).copied().ok_or_else(|| {
            Violation::new(
                ErrorKind::UnknownScope,
                format!("scope `{}` is not open", name),
            )
        })
    }

    /// Exiting a scope that was already exited breaks LIFO order; a name
    /// never entered at all is just unknown.
    fn exit_target(&self, name: &str) -> Result<ScopeId, Violation> {
        self.scope_id(name).map_err(|unknown| {
            if self.scopes.was_entered(name) {
                Violation::new(
                    ErrorKind::ScopeMismatch,
                    format!("cannot exit `{}`: it was already exited", name),
                )
            } else {
                unknown
            }
        })
    }

    fn lookup(&self, name: &str) -> Result<ResourceId, Violation> {
        self.bindings.get(name).copied().ok_or_else(|| {
            Violation::new(ErrorKind::UnknownName, format!("`{}` is not bound", name))
        })
    }

    /// A binding name may be reused only once its resource is no longer live.
    fn check_fresh_binding(&self, name: &str) -> Result<(), Violation> {
        match self.bindings.get(name) {
            Some(&id) if self.table.state(id) == Some(ResourceState::Live) => Err(Violation::new(
                ErrorKind::DuplicateName,
                format!("`{}` is already bound to a live resource", name),
            )
            .on(id)),
            _ => Ok(()),
        }
    }

    // ---- Scopes ------------------------------------------------------------

    fn open_scope(&mut self, name: &str) -> Result<(), Violation> {
        if self.scope_names.contains_key(name) {
            return Err(Violation::new(
                ErrorKind::DuplicateName,
                format!("scope `{}` is already open", name),
            ));
        }
        let id = self.scopes.enter(name);
        self.scope_names.insert(name.to_string(), id);
        Ok(())
    }

    /// Exit `id`: release its borrows, then drop what it owns, newest first.
    fn close_scope(&mut self, id: ScopeId) -> Result<(), Violation> {
        let frame = self.scopes.exit(id)?;
        self.scope_names.remove(&frame.name);

        for borrow in frame.borrows() {
            self.borrows.release_if_active(*borrow);
        }
        let borrows = &self.borrows;
        self.labels.retain(|_, id| borrows.is_active(*id));

        for resource in self.drop_order(&frame) {
            if self.table.state(resource) == Some(ResourceState::Live) {
                self.table.drop_resource(resource, &self.borrows)?;
            }
        }
        Ok(())
    }

    /// Owned resources of a frame in reverse creation order.
    fn drop_order(&self, frame: &Frame) -> Vec<ResourceId> {
        let mut owned = frame.resources().to_vec();
        owned.sort_by_key(|id| {
            std::cmp::Reverse(self.table.get(*id).map(|r| r.created).unwrap_or(0))
        });
        owned
    }

    // ---- Resources ---------------------------------------------------------

    fn bind(&mut self, name: &str, scope: &str, shared: bool, size: u64) -> Result<(), Violation> {
        let scope = self.scope_id(scope)?;
        self.check_fresh_binding(name)?;
        let id = self.table.create(name, scope, shared, size);
        self.scopes.register_resource(scope, id);
        self.bindings.insert(name.to_string(), id);
        Ok(())
    }

    fn acquire(
        &mut self,
        resource: &str,
        kind: BorrowKind,
        scope: &str,
        label: Option<&str>,
    ) -> Result<(), Violation> {
        let target = self.lookup(resource)?;
        let scope = self.scope_id(scope)?;
        let owner = self.table.check_live(target)?.owner;

        if !self.scopes.is_within(scope, owner) {
            return Err(Violation::new(
                ErrorKind::DanglingBorrowEscape,
                format!(
                    "borrow of `{}` in `{}` would outlive its owner scope `{}`",
                    resource,
                    self.scopes.name(scope),
                    self.scopes.name(owner)
                ),
            )
            .on(target));
        }
        if kind == BorrowKind::Exclusive {
            self.check_unaliased(target, "mutably borrow")?;
        }
        if let Some(label) = label {
            if self.labels.contains_key(label) {
                return Err(Violation::new(
                    ErrorKind::DuplicateName,
                    format!("borrow label `{}` is already active", label),
                ));
            }
        }

        let id = self.borrows.acquire(&self.table, target, kind, scope)?;
        self.scopes.register_borrow(scope, id);
        if let Some(label) = label {
            self.labels.insert(label.to_string(), id);
        }
        Ok(())
    }

    fn release(&mut self, label: &str) -> Result<(), Violation> {
        let id = self.labels.remove(label).ok_or_else(|| {
            Violation::new(
                ErrorKind::UnknownBorrow,
                format!("borrow `{}` is not active", label),
            )
        })?;
        self.borrows.release(id)?;
        Ok(())
    }

    fn move_resource(
        &mut self,
        resource: &str,
        scope: &str,
        as_name: Option<&str>,
    ) -> Result<(), Violation> {
        let source = self.lookup(resource)?;
        let scope = self.scope_id(scope)?;
        self.table.check_live(source)?;
        self.borrows
            .check_access(&self.table, source, BorrowKind::Exclusive, "move")?;
        if let Some(new_name) = as_name {
            if new_name != resource {
                self.check_fresh_binding(new_name)?;
            }
        }

        let successor = self
            .table
            .move_to(source, scope, as_name.unwrap_or(resource))?;
        self.scopes.register_resource(scope, successor);
        if let Some(new_name) = as_name {
            self.bindings.insert(new_name.to_string(), successor);
        }
        Ok(())
    }

    fn clone_resource(&mut self, resource: &str, scope: &str, as_name: &str) -> Result<(), Violation> {
        let source = self.lookup(resource)?;
        let scope = self.scope_id(scope)?;
        self.table.check_live(source)?;
        self.borrows
            .check_access(&self.table, source, BorrowKind::Shared, "clone")?;
        self.check_fresh_binding(as_name)?;

        let clone = self.table.clone_resource(source, scope, as_name)?;
        self.scopes.register_resource(scope, clone);
        self.bindings.insert(as_name.to_string(), clone);
        Ok(())
    }

    fn return_resource(&mut self, resource: &str, scope: &str) -> Result<(), Violation> {
        let id = self.lookup(resource)?;
        let target = self.scope_id(scope)?;
        let owner = self.table.check_live(id)?.owner;

        if target == owner || !self.scopes.is_within(owner, target) {
            return Err(Violation::new(
                ErrorKind::ScopeMismatch,
                format!(
                    "cannot return `{}` to `{}`: it does not enclose the owner scope `{}`",
                    resource,
                    self.scopes.name(target),
                    self.scopes.name(owner)
                ),
            )
            .on(id));
        }

        self.table.transfer(id, target)?;
        self.scopes.reassign_resource(id, owner, target);
        Ok(())
    }

    fn read(&mut self, resource: &str) -> Result<(), Violation> {
        let id = self.lookup(resource)?;
        self.table.check_live(id)?;
        self.borrows
            .check_access(&self.table, id, BorrowKind::Shared, "use")
    }

    fn write(&mut self, resource: &str) -> Result<(), Violation> {
        let id = self.lookup(resource)?;
        self.table.check_live(id)?;
        self.borrows
            .check_access(&self.table, id, BorrowKind::Exclusive, "mutate")?;
        self.check_unaliased(id, "mutate")
    }

    /// A shared handle may only be written through while it is the only one.
    fn check_unaliased(&self, id: ResourceId, verb: &str) -> Result<(), Violation> {
        match self.table.refcount(id) {
            Some(count) if count > 1 => Err(Violation::new(
                ErrorKind::BorrowConflict,
                format!(
                    "cannot {} `{}` while its allocation is shared by {} handles",
                    verb,
                    self.table.name_of(id),
                    count
                ),
            )
            .on(id)),
            _ => Ok(()),
        }
    }
}
