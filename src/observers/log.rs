//! # LogObserver: controller events through `tracing`
//!
//! Renders every observer event as a structured `tracing` record. Install a
//! subscriber (e.g. `tracing_subscriber::fmt`) to see them.
//!
//! ## Example output (fmt subscriber)
//! ```text
//! INFO  statevisor: controller created controller=ctrl-1 label="cart"
//! DEBUG statevisor: handler started controller=ctrl-1 handler="refresh" meta={"userId": Number(7)}
//! DEBUG statevisor: state changed controller=ctrl-1 prev=0 next=1
//! WARN  statevisor: handler error controller=ctrl-1 kind="handler_failed" error=handler failed: timeout
//! ERROR statevisor: contract violation controller=ctrl-1 violation="double_dispose"
//! INFO  statevisor: controller disposed controller=ctrl-1 label="cart"
//! ```

use std::backtrace::{Backtrace, BacktraceStatus};
use std::fmt::Debug;

use crate::{
    context::Context,
    controller::Lifecycle,
    error::{HandlerError, Violation},
};

use super::Observer;

/// Observer writing events to `tracing` under the `statevisor` target.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogObserver;

impl LogObserver {
    /// Construct a new [`LogObserver`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Observer for LogObserver {
    fn on_create(&self, c: &dyn Lifecycle) {
        tracing::info!(target: "statevisor", controller = %c.id(), label = c.label(), "controller created");
    }

    fn on_dispose(&self, c: &dyn Lifecycle) {
        tracing::info!(target: "statevisor", controller = %c.id(), label = c.label(), "controller disposed");
    }

    fn on_handler(&self, ctx: &Context) {
        tracing::debug!(
            target: "statevisor",
            controller = %ctx.controller_id(),
            handler = ctx.name(),
            meta = ?ctx.meta(),
            "handler started"
        );
    }

    fn on_state_changed(&self, c: &dyn Lifecycle, prev: &dyn Debug, next: &dyn Debug) {
        tracing::debug!(target: "statevisor", controller = %c.id(), ?prev, ?next, "state changed");
    }

    fn on_error(&self, c: &dyn Lifecycle, error: &HandlerError, backtrace: &Backtrace) {
        if backtrace.status() == BacktraceStatus::Captured {
            tracing::warn!(
                target: "statevisor",
                controller = %c.id(),
                kind = error.as_label(),
                %error,
                %backtrace,
                "handler error"
            );
        } else {
            tracing::warn!(
                target: "statevisor",
                controller = %c.id(),
                kind = error.as_label(),
                %error,
                "handler error"
            );
        }
    }

    fn on_violation(&self, c: &dyn Lifecycle, violation: Violation) {
        tracing::error!(
            target: "statevisor",
            controller = %c.id(),
            violation = violation.as_label(),
            "contract violation"
        );
    }

    fn name(&self) -> &'static str {
        "LogObserver"
    }
}
