//! # Registry of live controllers.
//!
//! Every controller inserts itself on construction and removes itself on
//! dispose (or on drop, if it was never disposed). The registry only holds
//! weak references, so it never keeps a controller alive.
//!
//! ## Architecture
//! ```text
//! ControllerBuilder::build() ──► Registry::insert(id → {label, Weak})
//! Controller::dispose()      ──► Registry::remove(id)
//! drop(last Arc)             ──► Registry::remove(id)   (if not disposed)
//!
//! tests / debugging          ──► len(), labels(), count_of(label), get(id)
//! ```
//!
//! ## Rules
//! - Used for introspection only; dispatch never consults it.
//! - Safe under concurrent insert/remove from any thread.
//! - [`Registry::global`] is the process-wide default; tests usually inject
//!   their own instance through
//!   [`ControllerBuilder::with_registry`](crate::ControllerBuilder::with_registry).

use std::collections::HashMap;
use std::sync::{Arc, OnceLock, PoisonError, RwLock, Weak};

use crate::controller::{ControllerId, Lifecycle};

/// Process-wide default registry.
static GLOBAL: OnceLock<Arc<Registry>> = OnceLock::new();

struct Entry {
    label: Arc<str>,
    instance: Weak<dyn Lifecycle>,
}

/// Map of live controller instances keyed by id.
#[derive(Default)]
pub struct Registry {
    entries: RwLock<HashMap<ControllerId, Entry>>,
}

impl Registry {
    /// Creates an empty registry.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Returns the process-wide registry.
    pub fn global() -> Arc<Self> {
        Arc::clone(GLOBAL.get_or_init(Registry::new))
    }

    /// Adds `instance`; false if its id is already present.
    pub fn insert(&self, instance: &Arc<dyn Lifecycle>) -> bool {
        let entry = Entry {
            label: Arc::from(instance.label()),
            instance: Arc::downgrade(instance),
        };
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if entries.contains_key(&instance.id()) {
            return false;
        }
        entries.insert(instance.id(), entry);
        true
    }

    /// Removes `id`; false if it was not present.
    pub fn remove(&self, id: ControllerId) -> bool {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id)
            .is_some()
    }

    /// True if `id` is registered.
    pub fn contains(&self, id: ControllerId) -> bool {
        self.read(|entries| entries.contains_key(&id))
    }

    /// Returns the instance registered under `id`, if it is still alive.
    pub fn get(&self, id: ControllerId) -> Option<Arc<dyn Lifecycle>> {
        self.read(|entries| entries.get(&id).and_then(|e| e.instance.upgrade()))
    }

    /// Number of registered instances.
    pub fn len(&self) -> usize {
        self.read(HashMap::len)
    }

    /// True if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of registered instances with the given label.
    pub fn count_of(&self, label: &str) -> usize {
        self.read(|entries| entries.values().filter(|e| &*e.label == label).count())
    }

    /// Sorted list of registered labels (one per instance).
    pub fn labels(&self) -> Vec<String> {
        let mut labels: Vec<String> =
            self.read(|entries| entries.values().map(|e| e.label.to_string()).collect());
        labels.sort_unstable();
        labels
    }

    fn read<R>(&self, f: impl FnOnce(&HashMap<ControllerId, Entry>) -> R) -> R {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        f(&entries)
    }
}
