//! Listener bookkeeping.
//!
//! The list is closed exactly once by `dispose`; afterwards `add` is refused and
//! `remove` is a silent no-op, so the count stays frozen at 0.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Change callback registered with [`Controller::add_listener`](crate::Controller::add_listener).
pub type Listener = Arc<dyn Fn() + Send + Sync>;

/// Handle returned by `add_listener`, used to remove the listener again.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

#[derive(Default)]
struct Slots {
    next_id: u64,
    closed: bool,
    entries: Vec<(ListenerId, Listener)>,
}

#[derive(Default)]
pub(crate) struct Listeners {
    slots: Mutex<Slots>,
}

impl Listeners {
    fn lock(&self) -> MutexGuard<'_, Slots> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers `listener`; `None` once closed.
    pub(crate) fn add(&self, listener: Listener) -> Option<ListenerId> {
        let mut slots = self.lock();
        if slots.closed {
            return None;
        }
        slots.next_id += 1;
        let id = ListenerId(slots.next_id);
        slots.entries.push((id, listener));
        Some(id)
    }

    /// Removes `id`; false if unknown or closed.
    pub(crate) fn remove(&self, id: ListenerId) -> bool {
        let mut slots = self.lock();
        match slots.entries.iter().position(|(lid, _)| *lid == id) {
            Some(idx) => {
                slots.entries.remove(idx);
                true
            }
            None => false,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.lock().entries.len()
    }

    /// Copy of the current listeners, so callbacks run without the lock held.
    pub(crate) fn snapshot(&self) -> Vec<Listener> {
        self.lock()
            .entries
            .iter()
            .map(|(_, l)| Arc::clone(l))
            .collect()
    }

    /// Closes the list and drops every listener. Returns how many were dropped.
    pub(crate) fn close(&self) -> usize {
        let dropped = {
            let mut slots = self.lock();
            slots.closed = true;
            std::mem::take(&mut slots.entries)
        };
        dropped.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop() -> Listener {
        Arc::new(|| {})
    }

    #[test]
    fn ids_are_unique_and_removal_is_exact() {
        let listeners = Listeners::default();
        let a = listeners.add(noop()).unwrap();
        let b = listeners.add(noop()).unwrap();
        assert_ne!(a, b);
        assert_eq!(listeners.len(), 2);

        assert!(listeners.remove(a));
        assert!(!listeners.remove(a));
        assert_eq!(listeners.len(), 1);
    }

    #[test]
    fn closed_list_is_frozen_at_zero() {
        let listeners = Listeners::default();
        let id = listeners.add(noop()).unwrap();
        listeners.add(noop()).unwrap();

        assert_eq!(listeners.close(), 2);
        assert_eq!(listeners.len(), 0);
        assert!(listeners.add(noop()).is_none());
        assert!(!listeners.remove(id));
        assert_eq!(listeners.len(), 0);
    }
}
