//! Thread cells: described storage locations with a default value and an
//! inheritance flag.
//!
//! Cells are identity-keyed. Identity comes from a thread-local monotone
//! counter rather than the allocation address, because addresses can be
//! reused after deallocation while table entries for a dead cell may still
//! be awaiting a sweep.

use std::any::Any;
use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

/// Stable identity of a thread cell, assigned at creation and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellId(u64);

impl CellId {
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cell-{}", self.0)
    }
}

thread_local! {
    static NEXT_CELL_ID: Cell<u64> = const { Cell::new(1) };
}

fn allocate_cell_id() -> CellId {
    NEXT_CELL_ID.with(|next| {
        let id = next.get();
        next.set(id + 1);
        CellId(id)
    })
}

/// The table's type-erased view of a cell.
///
/// Tables hold cells of mixed value types; entries key on this trait object
/// the way the snapshot system keys on state objects.
pub trait CellObject: Any {
    fn cell_id(&self) -> CellId;
    fn is_inherited(&self) -> bool;

    /// Record that the cell has been written at least once. The flag only
    /// ever transitions false to true.
    fn mark_assigned(&self);

    fn as_any(&self) -> &dyn Any;
}

/// A storage location with a default value and an inheritance flag.
///
/// Two distinct cells with equal defaults are distinct keys. The cell itself
/// is owned by its callers; a table never keeps one alive.
pub struct ThreadCell<T> {
    id: CellId,
    default: Rc<T>,
    inherited: bool,
    assigned: Cell<bool>,
}

impl<T: 'static> ThreadCell<T> {
    /// Create a cell with the given default. `inherited` decides whether the
    /// cell's binding propagates into derived tables.
    pub fn new(default: T, inherited: bool) -> Rc<Self> {
        Rc::new(Self {
            id: allocate_cell_id(),
            default: Rc::new(default),
            inherited,
            assigned: Cell::new(false),
        })
    }

    #[inline]
    pub fn id(&self) -> CellId {
        self.id
    }

    /// The value returned when no live binding exists. Always the same
    /// shared allocation.
    pub fn default_value(&self) -> Rc<T> {
        Rc::clone(&self.default)
    }

    /// Whether the cell has ever been written through any table.
    #[inline]
    pub fn is_assigned(&self) -> bool {
        self.assigned.get()
    }
}

impl<T: 'static> CellObject for ThreadCell<T> {
    fn cell_id(&self) -> CellId {
        self.id
    }

    fn is_inherited(&self) -> bool {
        self.inherited
    }

    fn mark_assigned(&self) {
        self.assigned.set(true);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
