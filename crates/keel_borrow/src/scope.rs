//! Scope stack: nested lexical regions in strict LIFO order.
//!
//! A scope owns the resources created in (or returned into) it and the
//! borrows registered in it. Exiting a scope hands back its [`Frame`] so the
//! caller can release the borrows first and then drop the resources.

use tracing::trace;

use crate::error::{ErrorKind, Violation};
use crate::ids::{BorrowId, ResourceId, ScopeId};

/// One open scope and what it owns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub id: ScopeId,
    pub name: String,
    pub parent: Option<ScopeId>,
    resources: Vec<ResourceId>,
    borrows: Vec<BorrowId>,
}

impl Frame {
    /// Owned resources in the order they joined this scope.
    pub fn resources(&self) -> &[ResourceId] {
        &self.resources
    }

    pub fn borrows(&self) -> &[BorrowId] {
        &self.borrows
    }
}

#[derive(Debug, Default)]
pub struct ScopeStack {
    frames: Vec<Frame>,
    /// Parent of every scope ever entered, indexed by `ScopeId`.
    parents: Vec<Option<ScopeId>>,
    names: Vec<String>,
    max_depth: usize,
}

impl ScopeStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a new scope whose parent is the current top.
    pub fn enter(&mut self, name: &str) -> ScopeId {
        let id = ScopeId(self.parents.len() as u32);
        let parent = self.top();
        self.parents.push(parent);
        self.names.push(name.to_string());
        self.frames.push(Frame {
            id,
            name: name.to_string(),
            parent,
            resources: Vec::new(),
            borrows: Vec::new(),
        });
        self.max_depth = self.max_depth.max(self.frames.len());
        trace!(%id, name, depth = self.frames.len(), "scope entered");
        id
    }

    /// Pop `id`, which must be the innermost open scope.
    pub fn exit(&mut self, id: ScopeId) -> Result<Frame, Violation> {
        match self.frames.pop() {
            None => Err(Violation::new(
                ErrorKind::ScopeMismatch,
                format!("cannot exit `{}`: no scope is open", self.name(id)),
            )),
            Some(top) if top.id != id => {
                let message = format!(
                    "cannot exit `{}` while the inner scope `{}` is still open",
                    self.name(id),
                    top.name
                );
                self.frames.push(top);
                Err(Violation::new(ErrorKind::ScopeMismatch, message))
            }
            Some(frame) => {
                trace!(%id, name = %frame.name, "scope exited");
                Ok(frame)
            }
        }
    }

    /// Pop every open scope, innermost first.
    pub fn unwind(&mut self) -> Vec<Frame> {
        let mut frames = Vec::with_capacity(self.frames.len());
        while let Some(frame) = self.frames.pop() {
            trace!(id = %frame.id, name = %frame.name, "scope unwound");
            frames.push(frame);
        }
        frames
    }

    pub fn top(&self) -> Option<ScopeId> {
        self.frames.last().map(|f| f.id)
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn is_open(&self, id: ScopeId) -> bool {
        self.frames.iter().any(|f| f.id == id)
    }

    pub fn parent(&self, id: ScopeId) -> Option<ScopeId> {
        self.parents.get(id.index()).copied().flatten()
    }

    pub fn name(&self, id: ScopeId) -> &str {
        self.names
            .get(id.index())
            .map(String::as_str)
            .unwrap_or("<unknown>")
    }

    /// Whether a scope named `name` was ever entered, open or not.
    pub fn was_entered(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    /// Whether `inner` is `outer` or nested (at any depth) inside it.
    pub fn is_within(&self, inner: ScopeId, outer: ScopeId) -> bool {
        let mut current = Some(inner);
        while let Some(id) = current {
            if id == outer {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    fn frame_mut(&mut self, id: ScopeId) -> Option<&mut Frame> {
        self.frames.iter_mut().rev().find(|f| f.id == id)
    }

    pub fn frame(&self, id: ScopeId) -> Option<&Frame> {
        self.frames.iter().rev().find(|f| f.id == id)
    }

    /// Record that `scope` now owns `resource`.
    pub fn register_resource(&mut self, scope: ScopeId, resource: ResourceId) {
        if let Some(frame) = self.frame_mut(scope) {
            frame.resources.push(resource);
        }
    }

    /// Record that `borrow` lives in `scope`.
    pub fn register_borrow(&mut self, scope: ScopeId, borrow: BorrowId) {
        if let Some(frame) = self.frame_mut(scope) {
            frame.borrows.push(borrow);
        }
    }

    /// Move ownership of `resource` from one open scope's frame to another's.
    pub fn reassign_resource(&mut self, resource: ResourceId, from: ScopeId, to: ScopeId) {
        if let Some(frame) = self.frame_mut(from) {
            frame.resources.retain(|r| *r != resource);
        }
        self.register_resource(to, resource);
    }
}
