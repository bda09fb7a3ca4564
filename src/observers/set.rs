//! # ObserverSet: fan-out over multiple observers
//!
//! Forwards each event to every contained observer in insertion order. A
//! panic in one observer is isolated and does not prevent delivery to the
//! others.

use std::backtrace::Backtrace;
use std::fmt::Debug;
use std::sync::Arc;

use crate::{
    context::Context,
    controller::Lifecycle,
    error::{HandlerError, Violation},
};

use super::{Observer, isolate};

/// Composite observer.
#[derive(Clone, Default)]
pub struct ObserverSet {
    observers: Vec<Arc<dyn Observer>>,
}

impl ObserverSet {
    /// Creates a set from the given observers.
    #[must_use]
    pub fn new(observers: Vec<Arc<dyn Observer>>) -> Self {
        Self { observers }
    }

    /// Appends an observer.
    #[must_use]
    pub fn with(mut self, observer: Arc<dyn Observer>) -> Self {
        self.observers.push(observer);
        self
    }

    /// True if there are no observers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    /// Number of observers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.observers.len()
    }

    fn each(&self, f: impl Fn(&dyn Observer)) {
        for observer in &self.observers {
            isolate("observer_set", || f(observer.as_ref()));
        }
    }
}

impl Observer for ObserverSet {
    fn on_create(&self, c: &dyn Lifecycle) {
        self.each(|o| o.on_create(c));
    }

    fn on_dispose(&self, c: &dyn Lifecycle) {
        self.each(|o| o.on_dispose(c));
    }

    fn on_handler(&self, ctx: &Context) {
        self.each(|o| o.on_handler(ctx));
    }

    fn on_state_changed(&self, c: &dyn Lifecycle, prev: &dyn Debug, next: &dyn Debug) {
        self.each(|o| o.on_state_changed(c, prev, next));
    }

    fn on_error(&self, c: &dyn Lifecycle, error: &HandlerError, backtrace: &Backtrace) {
        self.each(|o| o.on_error(c, error, backtrace));
    }

    fn on_violation(&self, c: &dyn Lifecycle, violation: Violation) {
        self.each(|o| o.on_violation(c, violation));
    }

    fn name(&self) -> &'static str {
        "ObserverSet"
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::controller::ControllerId;

    struct Dummy;

    impl Lifecycle for Dummy {
        fn id(&self) -> ControllerId {
            ControllerId::from_raw(1)
        }
        fn label(&self) -> &str {
            "dummy"
        }
        fn is_disposed(&self) -> bool {
            false
        }
        fn is_processing(&self) -> bool {
            false
        }
        fn subscribers(&self) -> usize {
            0
        }
    }

    struct Panicky;

    impl Observer for Panicky {
        fn on_create(&self, _c: &dyn Lifecycle) {
            panic!("broken telemetry");
        }
    }

    #[derive(Default)]
    struct Counter(AtomicUsize);

    impl Observer for Counter {
        fn on_create(&self, _c: &dyn Lifecycle) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn panicking_member_does_not_starve_the_rest() {
        let counter = Arc::new(Counter::default());
        let set = ObserverSet::new(vec![Arc::new(Panicky) as Arc<dyn Observer>]).with(counter.clone());
        assert_eq!(set.len(), 2);

        set.on_create(&Dummy);
        set.on_create(&Dummy);

        assert_eq!(counter.0.load(Ordering::SeqCst), 2);
    }
}
