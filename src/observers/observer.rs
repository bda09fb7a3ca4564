use std::backtrace::Backtrace;
use std::fmt::Debug;

use crate::{
    context::Context,
    controller::Lifecycle,
    error::{HandlerError, Violation},
};

/// # Sink for controller telemetry.
///
/// All methods default to no-ops, so implementations override only what they
/// need. Calls happen synchronously on the thread that triggered the event and
/// must not block.
///
/// # Example
/// ```
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use statevisor::{Lifecycle, Observer};
///
/// #[derive(Default)]
/// struct Creations(AtomicUsize);
///
/// impl Observer for Creations {
///     fn on_create(&self, _controller: &dyn Lifecycle) {
///         self.0.fetch_add(1, Ordering::Relaxed);
///     }
/// }
/// ```
pub trait Observer: Send + Sync + 'static {
    /// A controller was built and registered.
    fn on_create(&self, _controller: &dyn Lifecycle) {}

    /// A controller was disposed (first call only).
    fn on_dispose(&self, _controller: &dyn Lifecycle) {}

    /// A handler is about to run under `ctx`.
    fn on_handler(&self, _ctx: &Context) {}

    /// The held state changed from `prev` to `next`.
    fn on_state_changed(&self, _controller: &dyn Lifecycle, _prev: &dyn Debug, _next: &dyn Debug) {}

    /// A handler failed. Called after the controller's own error hook.
    fn on_error(&self, _controller: &dyn Lifecycle, _error: &HandlerError, _backtrace: &Backtrace) {}

    /// Calling code broke the controller contract.
    fn on_violation(&self, _controller: &dyn Lifecycle, _violation: Violation) {}

    /// Human-readable name (for logs).
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Observer that ignores every event. The builder's default.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopObserver;

impl Observer for NoopObserver {
    fn name(&self) -> &'static str {
        "noop"
    }
}
