//! Liveness-tracked handles over reference-counted targets.
//!
//! A [`Handle`] observes whether its target is still alive and can notify a
//! one-shot callback when the target is reclaimed. Two slot kinds exist:
//!
//! - **Weak**: backed by [`std::rc::Weak`]; never keeps the target alive.
//!   `Rc` has no finalizer hook, so reclamation is observed lazily: the first
//!   `resolve()` that finds the upgrade failing fires the callback.
//! - **Strong**: a fallback slot that keeps the target alive until an
//!   explicit `dispose()`. This exists for targets the caller does not manage
//!   weakly; it does not pretend to be weak, it only honors eager release.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use crate::error::CellError;

/// Shared strong slot, cleared in place when the paired key is reclaimed.
pub(crate) type SharedSlot<T> = Rc<RefCell<Option<Rc<T>>>>;

type ReclaimHook = Box<dyn FnOnce()>;

/// A handle that tracks the liveness of a single target.
pub struct Handle<T: ?Sized> {
    slot: Slot<T>,
    on_reclaimed: RefCell<Option<ReclaimHook>>,
}

enum Slot<T: ?Sized> {
    Weak {
        target: Weak<T>,
        disposed: Cell<bool>,
    },
    Strong {
        slot: SharedSlot<T>,
        writable: bool,
    },
}

impl<T: ?Sized> Handle<T> {
    /// Create a weak handle that observes `target` without keeping it alive.
    pub fn weak(target: &Rc<T>) -> Self {
        Self {
            slot: Slot::Weak {
                target: Rc::downgrade(target),
                disposed: Cell::new(false),
            },
            on_reclaimed: RefCell::new(None),
        }
    }

    /// Create a weak handle whose `on_reclaimed` callback fires exactly once,
    /// at or after the point the target becomes unreachable.
    ///
    /// The callback fires on the first operation that observes the target
    /// dead (or at `dispose()`), which may be arbitrarily later than the
    /// deallocation itself.
    pub fn weak_with(target: &Rc<T>, on_reclaimed: impl FnOnce() + 'static) -> Self {
        Self {
            slot: Slot::Weak {
                target: Rc::downgrade(target),
                disposed: Cell::new(false),
            },
            on_reclaimed: RefCell::new(Some(Box::new(on_reclaimed))),
        }
    }

    /// Create a read-only strong handle. The target stays alive until
    /// `dispose()`.
    pub fn strong(target: Rc<T>) -> Self {
        Self {
            slot: Slot::Strong {
                slot: Rc::new(RefCell::new(Some(target))),
                writable: false,
            },
            on_reclaimed: RefCell::new(None),
        }
    }

    /// Create a read-only strong handle with a one-shot reclamation callback.
    pub fn strong_with(target: Rc<T>, on_reclaimed: impl FnOnce() + 'static) -> Self {
        Self {
            slot: Slot::Strong {
                slot: Rc::new(RefCell::new(Some(target))),
                writable: false,
            },
            on_reclaimed: RefCell::new(Some(Box::new(on_reclaimed))),
        }
    }

    /// Create a writable strong handle whose target can be replaced via
    /// [`Handle::store`].
    pub fn strong_writable(target: Rc<T>) -> Self {
        Self {
            slot: Slot::Strong {
                slot: Rc::new(RefCell::new(Some(target))),
                writable: true,
            },
            on_reclaimed: RefCell::new(None),
        }
    }

    /// Create a read-only strong handle viewing an externally owned slot.
    /// Clearing the slot elsewhere makes this handle report its target gone.
    pub(crate) fn from_shared_slot(slot: SharedSlot<T>) -> Self {
        Self {
            slot: Slot::Strong {
                slot,
                writable: false,
            },
            on_reclaimed: RefCell::new(None),
        }
    }

    /// Resolve the target, or `None` once it has been reclaimed or the
    /// handle disposed. The first `None` outcome fires `on_reclaimed`.
    pub fn resolve(&self) -> Option<Rc<T>> {
        let resolved = match &self.slot {
            Slot::Weak { target, disposed } => {
                if disposed.get() {
                    None
                } else {
                    target.upgrade()
                }
            }
            Slot::Strong { slot, .. } => slot.borrow().clone(),
        };

        if resolved.is_none() {
            self.fire();
        }
        resolved
    }

    /// Replace the target of a writable strong handle.
    ///
    /// Writing through a weak observer, a read-only slot, or a disposed
    /// handle is a programmer error and is surfaced immediately.
    pub fn store(&self, value: Rc<T>) -> Result<(), CellError> {
        match &self.slot {
            Slot::Strong {
                slot,
                writable: true,
            } => {
                let mut guard = slot.borrow_mut();
                if guard.is_none() {
                    return Err(CellError::UnsupportedOperation);
                }
                *guard = Some(value);
                Ok(())
            }
            _ => Err(CellError::UnsupportedOperation),
        }
    }

    /// Explicit early release. Idempotent; afterwards `resolve()` returns
    /// `None` and `on_reclaimed` has fired exactly once (now or earlier).
    pub fn dispose(&self) {
        match &self.slot {
            Slot::Weak { disposed, .. } => disposed.set(true),
            Slot::Strong { slot, .. } => *slot.borrow_mut() = None,
        }
        self.fire();
    }

    /// Whether the handle can no longer yield a target. Does not fire the
    /// reclamation callback.
    pub fn is_disposed(&self) -> bool {
        match &self.slot {
            Slot::Weak { target, disposed } => disposed.get() || target.upgrade().is_none(),
            Slot::Strong { slot, .. } => slot.borrow().is_none(),
        }
    }

    fn fire(&self) {
        let hook = self.on_reclaimed.borrow_mut().take();
        if let Some(hook) = hook {
            hook();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counter() -> (Rc<Cell<u32>>, impl FnOnce()) {
        let count = Rc::new(Cell::new(0));
        let hook = {
            let count = Rc::clone(&count);
            move || count.set(count.get() + 1)
        };
        (count, hook)
    }

    #[test]
    fn weak_resolves_while_target_alive() {
        let target = Rc::new(41);
        let handle = Handle::weak(&target);
        assert_eq!(handle.resolve().as_deref(), Some(&41));
        assert!(!handle.is_disposed());
    }

    #[test]
    fn weak_does_not_keep_target_alive() {
        let target = Rc::new(String::from("gone"));
        let handle = Handle::weak(&target);
        drop(target);
        assert!(handle.resolve().is_none());
        assert!(handle.is_disposed());
    }

    #[test]
    fn weak_fires_callback_once_on_first_dead_resolve() {
        let (count, hook) = counter();
        let target = Rc::new(7u8);
        let handle = Handle::weak_with(&target, hook);

        assert!(handle.resolve().is_some());
        assert_eq!(count.get(), 0);

        drop(target);
        assert!(handle.resolve().is_none());
        assert!(handle.resolve().is_none());
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn weak_dispose_releases_early_and_is_idempotent() {
        let (count, hook) = counter();
        let target = Rc::new(7u8);
        let handle = Handle::weak_with(&target, hook);

        handle.dispose();
        assert!(handle.resolve().is_none());
        assert_eq!(count.get(), 1);

        handle.dispose();
        assert_eq!(count.get(), 1);

        // Target itself was never kept alive by the handle to begin with.
        assert_eq!(Rc::strong_count(&target), 1);
    }

    #[test]
    fn strong_keeps_target_alive_until_dispose() {
        let target = Rc::new(String::from("held"));
        let probe = Rc::downgrade(&target);
        let handle = Handle::strong(target);

        assert!(probe.upgrade().is_some());
        assert_eq!(handle.resolve().as_deref().map(String::as_str), Some("held"));

        handle.dispose();
        assert!(handle.resolve().is_none());
        assert!(probe.upgrade().is_none());
    }

    #[test]
    fn strong_dispose_fires_callback_once() {
        let (count, hook) = counter();
        let handle = Handle::strong_with(Rc::new(1i64), hook);

        handle.dispose();
        handle.dispose();
        assert!(handle.resolve().is_none());
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn store_through_weak_is_unsupported() {
        let target = Rc::new(1u32);
        let handle = Handle::weak(&target);
        assert_eq!(
            handle.store(Rc::new(2u32)),
            Err(CellError::UnsupportedOperation)
        );
    }

    #[test]
    fn store_through_read_only_strong_is_unsupported() {
        let handle = Handle::strong(Rc::new(1u32));
        assert_eq!(
            handle.store(Rc::new(2u32)),
            Err(CellError::UnsupportedOperation)
        );
        assert_eq!(handle.resolve().as_deref(), Some(&1));
    }

    #[test]
    fn store_replaces_writable_target() {
        let handle = Handle::strong_writable(Rc::new(1u32));
        handle.store(Rc::new(2u32)).unwrap();
        assert_eq!(handle.resolve().as_deref(), Some(&2));
    }

    #[test]
    fn store_after_dispose_is_unsupported() {
        let handle = Handle::strong_writable(Rc::new(1u32));
        handle.dispose();
        assert_eq!(
            handle.store(Rc::new(2u32)),
            Err(CellError::UnsupportedOperation)
        );
    }

    #[test]
    fn shared_slot_cleared_elsewhere_reads_absent() {
        let slot: SharedSlot<u32> = Rc::new(RefCell::new(Some(Rc::new(9))));
        let handle = Handle::from_shared_slot(Rc::clone(&slot));

        assert_eq!(handle.resolve().as_deref(), Some(&9));
        *slot.borrow_mut() = None;
        assert!(handle.resolve().is_none());
        assert!(handle.is_disposed());
    }
}
