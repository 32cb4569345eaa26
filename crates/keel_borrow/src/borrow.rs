//! Borrow tracker: active shared and exclusive views of resources.
//!
//! Per resource, at any instant there are either any number of shared
//! borrows or exactly one exclusive borrow, never both. Every borrow is
//! registered under the scope it lives in and is released at the latest
//! when that scope exits.

use std::collections::BTreeMap;

use keel_ops::BorrowKind;
use serde::Serialize;
use tracing::trace;

use crate::error::{ErrorKind, Violation};
use crate::ids::{BorrowId, ResourceId, ScopeId};
use crate::resource::ResourceTable;

/// A non-owning view of a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Borrow {
    pub id: BorrowId,
    pub target: ResourceId,
    pub kind: BorrowKind,
    pub scope: ScopeId,
}

#[derive(Debug, Default)]
pub struct BorrowTracker {
    active: BTreeMap<BorrowId, Borrow>,
    next_id: u32,
    peak: usize,
}

impl BorrowTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new borrow of `target` living in `scope`.
    ///
    /// Fails if the target is not live, if an exclusive borrow is requested
    /// while any borrow is active, or if a shared borrow is requested while
    /// an exclusive one is active.
    pub fn acquire(
        &mut self,
        table: &ResourceTable,
        target: ResourceId,
        kind: BorrowKind,
        scope: ScopeId,
    ) -> Result<BorrowId, Violation> {
        table.check_live(target)?;
        let verb = match kind {
            BorrowKind::Shared => "borrow",
            BorrowKind::Exclusive => "mutably borrow",
        };
        self.check_access(table, target, kind, verb)?;

        let id = BorrowId(self.next_id);
        self.next_id += 1;
        self.active.insert(
            id,
            Borrow {
                id,
                target,
                kind,
                scope,
            },
        );
        self.peak = self.peak.max(self.active.len());
        trace!(%id, %target, %kind, %scope, "borrow acquired");
        Ok(id)
    }

    /// Check that an access of the given kind would not overlap an active
    /// borrow. Shared access conflicts with an exclusive borrow; exclusive
    /// access conflicts with any borrow.
    pub fn check_access(
        &self,
        table: &ResourceTable,
        target: ResourceId,
        kind: BorrowKind,
        verb: &str,
    ) -> Result<(), Violation> {
        let conflict = match kind {
            BorrowKind::Shared => self.exclusive_on(target),
            BorrowKind::Exclusive => self.active_on(target).next(),
        };
        match conflict {
            Some(existing) => Err(Violation::new(
                ErrorKind::BorrowConflict,
                format!(
                    "cannot {} `{}` because it is already borrowed as {} ({})",
                    verb,
                    table.name_of(target),
                    existing.kind,
                    existing.id
                ),
            )
            .on(target)),
            None => Ok(()),
        }
    }

    /// Release an active borrow.
    pub fn release(&mut self, id: BorrowId) -> Result<Borrow, Violation> {
        self.release_if_active(id).ok_or_else(|| {
            Violation::new(
                ErrorKind::UnknownBorrow,
                format!("borrow {} is not active", id),
            )
        })
    }

    /// Release a borrow if it is still active. Returns it if it was.
    pub fn release_if_active(&mut self, id: BorrowId) -> Option<Borrow> {
        let borrow = self.active.remove(&id)?;
        trace!(%id, target = %borrow.target, "borrow released");
        Some(borrow)
    }

    pub fn get(&self, id: BorrowId) -> Option<&Borrow> {
        self.active.get(&id)
    }

    pub fn is_active(&self, id: BorrowId) -> bool {
        self.active.contains_key(&id)
    }

    /// Active borrows of `target`, oldest first.
    pub fn active_on(&self, target: ResourceId) -> impl Iterator<Item = &Borrow> {
        self.active.values().filter(move |b| b.target == target)
    }

    pub fn exclusive_on(&self, target: ResourceId) -> Option<&Borrow> {
        self.active_on(target)
            .find(|b| b.kind == BorrowKind::Exclusive)
    }

    pub fn is_borrowed(&self, target: ResourceId) -> bool {
        self.active_on(target).next().is_some()
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Largest number of simultaneously active borrows seen.
    pub fn peak(&self) -> usize {
        self.peak
    }
}
