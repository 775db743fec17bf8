//! Per-context binding tables mapping cells to their current values.
//!
//! A [`CellTable`] owns no cells: each entry is an [`Ephemeron`] whose weak
//! key handle is the table's only hold on the cell, and whose value lives
//! exactly as long as the cell does. Entries are pruned lazily: a lookup
//! that meets a dead key or a released value behaves as "not found" and
//! falls back to the cell default; physical removal happens on overwrite,
//! during an explicit [`CellTable::prune`] sweep, or when the table drops.

use std::any::Any;
use std::rc::Rc;

use smallvec::SmallVec;

use crate::cell::{CellId, CellObject, ThreadCell};
use crate::collections::map::HashMap;
use crate::ephemeron::Ephemeron;

type Binding = Ephemeron<dyn CellObject, dyn Any>;

/// A mapping from cell identity to the cell's bound value.
///
/// One table belongs to one logical execution context; derived contexts get
/// their own independent table via [`CellTable::inherit`].
#[derive(Default)]
pub struct CellTable {
    entries: HashMap<CellId, Binding>,
}

impl CellTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the current value of `cell`, falling back to its default.
    ///
    /// A never-assigned cell skips the table entirely. Otherwise the lookup
    /// returns the bound value only while the entry is still live; a missing
    /// or stale entry is not an error.
    pub fn get<T: 'static>(&self, cell: &Rc<ThreadCell<T>>) -> Rc<T> {
        if !cell.is_assigned() {
            return cell.default_value();
        }

        if let Some(binding) = self.entries.get(&cell.id()) {
            debug_assert!(
                binding.key().map_or(true, |key| key.cell_id() == cell.id()),
                "table entry keyed by a foreign cell"
            );
            if let Some(value) = binding.value() {
                if let Ok(value) = value.downcast::<T>() {
                    return value;
                }
            }
        }

        cell.default_value()
    }

    /// Bind `value` to `cell` in this table, replacing any prior binding.
    ///
    /// The prior entry's ephemeron is released here, so its value may become
    /// reclaimable sooner than before.
    pub fn set<T: 'static>(&mut self, cell: &Rc<ThreadCell<T>>, value: Rc<T>) {
        cell.mark_assigned();

        let key: Rc<dyn CellObject> = cell.clone();
        let value: Rc<dyn Any> = value;
        if self.entries.insert(cell.id(), Ephemeron::new(&key, value)).is_some() {
            log::trace!("replaced binding for {}", cell.id());
        }
    }

    /// Snapshot the currently live, `inherited = true` bindings into a new
    /// independent table for a derived execution context.
    pub fn inherit(&self) -> CellTable {
        self.inherit_matching(true)
    }

    /// Snapshot the currently live bindings whose cell's inheritance flag
    /// equals `inherited`.
    ///
    /// Each copied entry is a fresh ephemeron over the same cell and value,
    /// never a shared reference to the source entry, so later writes to
    /// either table are invisible to the other. Entries with a dead cell are
    /// skipped, as are entries whose value has been released while the cell
    /// is still live: such a binding is treated as unbound, not inherited as
    /// "was once bound".
    pub fn inherit_matching(&self, inherited: bool) -> CellTable {
        let mut table = CellTable::new();
        let mut copied = 0usize;

        for (id, binding) in &self.entries {
            let Some(key) = binding.key() else { continue };
            let Some(value) = binding.value() else { continue };
            if key.is_inherited() != inherited {
                continue;
            }
            table.entries.insert(*id, Ephemeron::new(&key, value));
            copied += 1;
        }

        log::debug!(
            "inherited {} of {} bindings (inherited={})",
            copied,
            self.entries.len(),
            inherited
        );
        table
    }

    /// Sweep out entries whose cell or value is no longer live. Returns the
    /// number of entries removed.
    pub fn prune(&mut self) -> usize {
        let dead: SmallVec<[CellId; 8]> = self
            .entries
            .iter()
            .filter(|(_, binding)| !binding.is_valid())
            .map(|(id, _)| *id)
            .collect();

        for id in &dead {
            self.entries.remove(id);
            log::trace!("pruned dead binding for {id}");
        }
        dead.len()
    }

    /// Number of entries physically present, including stale ones awaiting
    /// a sweep.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Number of entries whose cell and value are both still live.
    pub fn live_len(&self) -> usize {
        self.entries
            .values()
            .filter(|binding| binding.is_valid())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn binding(&self, id: CellId) -> Option<&Binding> {
        self.entries.get(&id)
    }
}
