//! Resource table: one entry per allocated value.
//!
//! Each resource has exactly one owner scope while it is live. A resource
//! leaves the `Live` state exactly once: by being moved (ownership passes to
//! a successor resource) or by being dropped. Neither transition can be
//! undone.
//!
//! Reference-counted resources are modelled as handles onto a shared
//! allocation. Every handle is still an ordinary single-owner resource; the
//! allocation behind them is released when the last handle is dropped.

use serde::Serialize;
use tracing::trace;

use crate::borrow::BorrowTracker;
use crate::error::{ErrorKind, Violation};
use crate::ids::{AllocationId, ResourceId, ScopeId};

/// Lifecycle state of a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceState {
    Live,
    Moved,
    Dropped,
}

/// Ownership flavour of a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// Sole owner of its value. Cloning copies the value.
    Unique,
    /// One handle onto a reference-counted allocation. Cloning adds a handle.
    Shared(AllocationId),
}

/// A single allocated value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resource {
    pub id: ResourceId,
    /// The binding name it was created under (for diagnostics).
    pub name: String,
    pub owner: ScopeId,
    pub state: ResourceState,
    pub kind: ResourceKind,
    /// Bytes a unique clone has to copy.
    pub size: u64,
    /// Creation sequence number; scope exit drops in descending order.
    pub created: u64,
    /// The resource this one was moved or cloned from.
    pub origin: Option<ResourceId>,
}

impl Resource {
    pub fn is_live(&self) -> bool {
        self.state == ResourceState::Live
    }
}

#[derive(Debug, Clone)]
struct Allocation {
    refcount: u32,
    released: bool,
}

/// Counters kept by the table over one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TableStats {
    pub created: u64,
    pub moves: u64,
    pub clones: u64,
    pub shared_clones: u64,
    pub bytes_copied: u64,
    pub drops: u64,
    pub allocations_released: u64,
}

/// Owner and state of every resource seen in a run.
#[derive(Debug, Default)]
pub struct ResourceTable {
    resources: Vec<Resource>,
    allocations: Vec<Allocation>,
    stats: TableStats,
}

impl ResourceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a fresh live resource owned by `owner`.
    pub fn create(&mut self, name: &str, owner: ScopeId, shared: bool, size: u64) -> ResourceId {
        let kind = if shared {
            let alloc = AllocationId(self.allocations.len() as u32);
            self.allocations.push(Allocation {
                refcount: 1,
                released: false,
            });
            ResourceKind::Shared(alloc)
        } else {
            ResourceKind::Unique
        };
        let id = self.push(name, owner, kind, size, None);
        trace!(%id, name, %owner, ?kind, "resource created");
        id
    }

    fn push(
        &mut self,
        name: &str,
        owner: ScopeId,
        kind: ResourceKind,
        size: u64,
        origin: Option<ResourceId>,
    ) -> ResourceId {
        let id = ResourceId(self.resources.len() as u32);
        self.resources.push(Resource {
            id,
            name: name.to_string(),
            owner,
            state: ResourceState::Live,
            kind,
            size,
            created: self.stats.created,
            origin,
        });
        self.stats.created += 1;
        id
    }

    pub fn get(&self, id: ResourceId) -> Option<&Resource> {
        self.resources.get(id.index())
    }

    pub fn state(&self, id: ResourceId) -> Option<ResourceState> {
        self.get(id).map(|r| r.state)
    }

    pub fn owner(&self, id: ResourceId) -> Option<ScopeId> {
        self.get(id).map(|r| r.owner)
    }

    /// The diagnostic name of a resource, or its id if unknown.
    pub fn name_of(&self, id: ResourceId) -> String {
        self.get(id)
            .map(|r| r.name.clone())
            .unwrap_or_else(|| id.to_string())
    }

    /// Return the resource if it is live, otherwise the matching violation.
    pub fn check_live(&self, id: ResourceId) -> Result<&Resource, Violation> {
        let Some(res) = self.get(id) else {
            return Err(Violation::new(
                ErrorKind::UnknownName,
                format!("resource {} does not exist", id),
            ));
        };
        match res.state {
            ResourceState::Live => Ok(res),
            ResourceState::Moved => Err(Violation::new(
                ErrorKind::UseAfterMove,
                format!("`{}` was moved out and can no longer be used", res.name),
            )
            .on(id)),
            ResourceState::Dropped => Err(Violation::new(
                ErrorKind::UseAfterDrop,
                format!("`{}` was dropped and can no longer be used", res.name),
            )
            .on(id)),
        }
    }

    /// Move a live resource to `new_owner`.
    ///
    /// The original becomes `Moved`; the returned successor is a new live
    /// resource owned by `new_owner` that carries the same value (same kind,
    /// same size, same allocation for shared handles).
    pub fn move_to(
        &mut self,
        id: ResourceId,
        new_owner: ScopeId,
        new_name: &str,
    ) -> Result<ResourceId, Violation> {
        let res = self.check_live(id)?;
        let (kind, size) = (res.kind, res.size);

        self.resources[id.index()].state = ResourceState::Moved;
        let successor = self.push(new_name, new_owner, kind, size, Some(id));
        self.stats.moves += 1;
        trace!(from = %id, to = %successor, %new_owner, "resource moved");
        Ok(successor)
    }

    /// Hand a live resource to another scope without changing its identity.
    pub fn transfer(&mut self, id: ResourceId, new_owner: ScopeId) -> Result<(), Violation> {
        self.check_live(id)?;
        let res = &mut self.resources[id.index()];
        trace!(%id, from = %res.owner, to = %new_owner, "ownership transferred");
        res.owner = new_owner;
        Ok(())
    }

    /// Clone a live resource into `owner`.
    ///
    /// A unique resource is copied: the clone is independent and the copy
    /// costs `size` bytes, added to `bytes_copied`. A shared handle is not
    /// copied: the clone is another handle on the same allocation and the
    /// allocation's count goes up by one.
    pub fn clone_resource(
        &mut self,
        id: ResourceId,
        owner: ScopeId,
        new_name: &str,
    ) -> Result<ResourceId, Violation> {
        let res = self.check_live(id)?;
        let (kind, size) = (res.kind, res.size);

        match kind {
            ResourceKind::Unique => {
                self.stats.bytes_copied += size;
            }
            ResourceKind::Shared(alloc) => {
                self.allocations[alloc.index()].refcount += 1;
                self.stats.shared_clones += 1;
            }
        }
        self.stats.clones += 1;

        let clone = self.push(new_name, owner, kind, size, Some(id));
        trace!(from = %id, to = %clone, ?kind, "resource cloned");
        Ok(clone)
    }

    /// Drop a live resource. Fails if any borrow still points at it.
    pub fn drop_resource(&mut self, id: ResourceId, borrows: &BorrowTracker) -> Result<(), Violation> {
        let res = self.check_live(id)?;
        if let Some(borrow) = borrows.active_on(id).next() {
            return Err(Violation::new(
                ErrorKind::DropWhileBorrowed,
                format!(
                    "cannot drop `{}` while it is borrowed ({} borrow {})",
                    res.name, borrow.kind, borrow.id
                ),
            )
            .on(id));
        }
        self.finish_drop(id);
        Ok(())
    }

    /// Drop without checking borrows. Used while unwinding after a rejection.
    pub fn force_drop(&mut self, id: ResourceId) {
        if self.state(id) == Some(ResourceState::Live) {
            self.finish_drop(id);
        }
    }

    fn finish_drop(&mut self, id: ResourceId) {
        let res = &mut self.resources[id.index()];
        res.state = ResourceState::Dropped;
        self.stats.drops += 1;
        trace!(%id, name = %res.name, "resource dropped");

        if let ResourceKind::Shared(alloc) = res.kind {
            let allocation = &mut self.allocations[alloc.index()];
            allocation.refcount = allocation.refcount.saturating_sub(1);
            if allocation.refcount == 0 && !allocation.released {
                allocation.released = true;
                self.stats.allocations_released += 1;
                trace!(%alloc, "shared allocation released");
            }
        }
    }

    /// Live handle count of a shared resource's allocation.
    pub fn refcount(&self, id: ResourceId) -> Option<u32> {
        match self.get(id)?.kind {
            ResourceKind::Shared(alloc) => Some(self.allocations[alloc.index()].refcount),
            ResourceKind::Unique => None,
        }
    }

    /// Whether a shared resource's allocation has been released.
    pub fn allocation_released(&self, id: ResourceId) -> Option<bool> {
        match self.get(id)?.kind {
            ResourceKind::Shared(alloc) => Some(self.allocations[alloc.index()].released),
            ResourceKind::Unique => None,
        }
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    pub fn live_count(&self) -> usize {
        self.resources.iter().filter(|r| r.is_live()).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Resource> {
        self.resources.iter()
    }

    pub fn stats(&self) -> TableStats {
        self.stats
    }
}
