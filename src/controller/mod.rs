//! # Controller lifecycle core.
//!
//! A [`Controller`] owns one state value, a fixed dispatch strategy and a list
//! of change listeners. Everything that does not depend on the state type
//! lives in the internal `Core`, which is also what the registry, observers
//! and invocation contexts refer to (as `dyn Lifecycle`).
//!
//! ## Lifecycle
//! ```text
//! builder.build()
//!   ├─► Registry::insert
//!   └─► Observer::on_create
//!
//! handle(work) ──► disposed? ──yes──► Violation::UseAfterDispose, Rejected
//!                     └─no──► strategy.submit(job) ──► Started | Queued | Dropped
//!
//! dispose()   ──► already disposed? ──yes──► Violation::DoubleDispose
//!                     └─no──► close listeners (count = 0)
//!                             close strategy (queued jobs abandoned)
//!                             Registry::remove
//!                             Observer::on_dispose
//! ```
//!
//! ## Rules
//! - Disposal is monotonic; the first call wins.
//! - After disposal, handler failures and state writes from still-running
//!   handlers are discarded.
//! - Observer, error hook and listener panics are caught and logged.

mod builder;
mod core;
mod instance;
mod lifecycle;
mod listeners;

pub use builder::ControllerBuilder;
pub(crate) use self::core::Core;
pub use self::core::ErrorHook;
pub use instance::Controller;
pub use lifecycle::{ControllerId, Lifecycle};
pub use listeners::{Listener, ListenerId};
