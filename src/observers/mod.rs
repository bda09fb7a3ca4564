//! # Observers: telemetry sinks for controller events.
//!
//! An [`Observer`] receives every lifecycle, handler, state-change, error and
//! violation event of the controllers it is installed on.
//!
//! ## Architecture
//! ```text
//! Core ── on_create / on_dispose / on_handler / on_state_changed / on_error / on_violation
//!   │
//!   └──► isolate(..) ──► Observer (one per controller, injected by the builder)
//!                           │
//!                 ┌─────────┼─────────────┐
//!                 ▼         ▼             ▼
//!           NoopObserver  LogObserver  ObserverSet ──► [obs1, obs2, ...]
//! ```
//!
//! ## Rules
//! - Calls are synchronous and best-effort.
//! - A panicking observer is caught at the call site and logged; the
//!   controller keeps working and the event is not retried.

#[cfg(feature = "logging")]
mod log;
mod observer;
mod set;

use std::panic::{AssertUnwindSafe, catch_unwind};

use crate::error::panic_message;

#[cfg(feature = "logging")]
pub use log::LogObserver;
pub use observer::{NoopObserver, Observer};
pub use set::ObserverSet;

/// Runs a telemetry callback, swallowing (and logging) any panic it raises.
pub(crate) fn isolate(site: &'static str, f: impl FnOnce()) {
    if let Err(payload) = catch_unwind(AssertUnwindSafe(f)) {
        tracing::warn!(
            site,
            panic = %panic_message(payload.as_ref()),
            "telemetry callback panicked"
        );
    }
}
