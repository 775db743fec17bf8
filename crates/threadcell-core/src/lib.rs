//! Inheritable thread-cell storage with ephemeron-backed bindings.
//!
//! A [`ThreadCell`] is a storage location with a default value and an
//! inheritance flag. Each execution context reads and writes cells through
//! its own [`CellTable`]; deriving a new context takes an independent
//! snapshot of the currently live, inheritance-eligible bindings via
//! [`CellTable::inherit`].
//!
//! The table never becomes an obstacle to reclamation: it holds cells only
//! through weak [`Handle`]s and holds each value through an [`Ephemeron`]
//! whose value liveness is bounded by the cell's. A cell dropped by its
//! owners takes its bindings with it; lookups treat such entries as absent
//! and fall back to the cell default.
//!
//! A table belongs to a single logical execution context and is not meant
//! for concurrent mutation; cross-context sharing happens only through the
//! `inherit` snapshot.

mod cell;
mod collections;
mod ephemeron;
mod error;
mod handle;
mod table;


pub use cell::{CellId, CellObject, ThreadCell};
pub use ephemeron::Ephemeron;
pub use error::CellError;
pub use handle::Handle;
pub use table::CellTable;
