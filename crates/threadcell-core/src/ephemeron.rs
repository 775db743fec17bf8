//! Key/value pairs whose value liveness is bounded by key liveness.
//!
//! A plain weak-key table risks keeping values alive forever through a strong
//! value reference, while a fully weak-value table loses values whose key is
//! still reachable through another path. An [`Ephemeron`] threads the value's
//! liveness to the key's: the value stays reachable through the entry exactly
//! as long as the key does.

use std::cell::RefCell;
use std::rc::Rc;

use crate::handle::{Handle, SharedSlot};

/// A pair of a weak key handle and a value slot entangled with it.
///
/// The value slot is an explicit shared record: the key handle's reclamation
/// callback clears it in place, and the value handle views the same slot, so
/// observing the key dead through any accessor also releases the value.
pub struct Ephemeron<K: ?Sized, V: ?Sized> {
    key: Handle<K>,
    value: Handle<V>,
}

impl<K, V> Ephemeron<K, V>
where
    K: ?Sized,
    V: ?Sized + 'static,
{
    /// Pair `value` with `key`. The entry holds `value` strongly, but only
    /// for as long as `key` remains alive.
    pub fn new(key: &Rc<K>, value: Rc<V>) -> Self {
        let slot: SharedSlot<V> = Rc::new(RefCell::new(Some(value)));
        let cleared = Rc::clone(&slot);
        Self {
            key: Handle::weak_with(key, move || {
                *cleared.borrow_mut() = None;
            }),
            value: Handle::from_shared_slot(slot),
        }
    }

    /// The key, or `None` once it has been reclaimed.
    pub fn key(&self) -> Option<Rc<K>> {
        self.key.resolve()
    }

    /// The value, or `None` once the key has been reclaimed or the value
    /// released. Checks the key first so that key death observed here still
    /// clears the slot.
    pub fn value(&self) -> Option<Rc<V>> {
        if self.key.resolve().is_none() {
            return None;
        }
        self.value.resolve()
    }

    /// Whether both the key and the value currently resolve.
    pub fn is_valid(&self) -> bool {
        self.key().is_some() && self.value().is_some()
    }

    /// Release the value eagerly while leaving the key observable. After this
    /// the entry behaves as unbound; releasing twice is a no-op.
    pub fn clear_value(&self) {
        self.value.dispose();
    }
}
