use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Global counter for controller ids.
static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a controller instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ControllerId(u64);

impl ControllerId {
    /// Allocates the next id (monotonic, never reused).
    pub(crate) fn next() -> Self {
        Self(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Wraps a raw value. Intended for tests and custom [`Lifecycle`] impls.
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw numeric value.
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ControllerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ctrl-{}", self.0)
    }
}

/// Type-erased view of a controller's lifecycle.
///
/// This is what the [`Registry`](crate::Registry), [`Observer`](crate::Observer)
/// and [`Context::owner`](crate::Context::owner) see, independent of the
/// controller's state type.
pub trait Lifecycle: Send + Sync {
    /// Stable identity.
    fn id(&self) -> ControllerId;

    /// Human-readable label (configured, or the state type name).
    fn label(&self) -> &str;

    /// True once `dispose` has been called.
    fn is_disposed(&self) -> bool;

    /// True while at least one handler is admitted and not yet completed.
    fn is_processing(&self) -> bool;

    /// Current number of registered listeners.
    fn subscribers(&self) -> usize;
}
