//! # Handler dispatch strategies.
//!
//! A controller forwards every accepted `handle` call to exactly one
//! [`DispatchStrategy`], chosen at construction and fixed for the controller's
//! lifetime. The strategy decides **admission** (run now, queue, drop) and
//! **ordering**; the [`Job`] it receives knows how to execute itself under a
//! fresh [`Context`](crate::Context) and report the outcome.
//!
//! ## Variants
//! - [`Sequential`]: one handler at a time, the rest wait in FIFO order.
//! - [`Concurrent`]: every handler starts immediately.
//! - [`Droppable`]: one handler at a time, the rest are **dropped**.
//!
//! ```text
//! handle(work) ──► Core ──► strategy.submit(job)
//!                              ├─ Sequential: idle? spawn drain loop : queue.push_back
//!                              ├─ Concurrent: spawn job
//!                              └─ Droppable:  idle? spawn job : Dropped
//!
//! spawned: job.run() ─► Context::scope ─► work() ─► Ok / Err / panic
//!                                                    └─► error hook ─► Observer::on_error
//! ```
//!
//! ## Invariants
//! - Bookkeeping (queue push/pop, slot set/clear, in-flight count) happens
//!   under a lock that is never held across an `.await`.
//! - `is_processing()` is true iff at least one admitted job has not completed.
//! - After `close()`, queued jobs are dropped without running and new
//!   submissions are rejected.

mod activity;
mod concurrent;
mod droppable;
mod job;
mod panics;
mod sequential;

use std::sync::{Mutex, MutexGuard, PoisonError};

use futures::future::BoxFuture;
use tokio::runtime::Handle;

pub use activity::Activity;
pub use concurrent::Concurrent;
pub use droppable::Droppable;
pub use job::Job;
pub(crate) use job::BoxWork;
pub use sequential::Sequential;

/// Outcome of submitting a job to a strategy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Admission {
    /// The handler started executing.
    Started,

    /// The handler was queued behind earlier work.
    Queued,

    /// The handler was discarded because the strategy was busy.
    Dropped,

    /// The controller (or strategy) is closed, or no Tokio runtime is
    /// available; nothing will run.
    Rejected,
}

impl Admission {
    /// True for [`Admission::Started`] and [`Admission::Queued`].
    pub fn is_admitted(self) -> bool {
        matches!(self, Admission::Started | Admission::Queued)
    }
}

/// Admission and ordering policy for handlers of one controller.
///
/// Implementations must spawn admitted jobs on the current Tokio runtime and
/// keep their own bookkeeping consistent without holding locks across awaits.
/// Outside of a runtime, `submit` returns [`Admission::Rejected`] and leaves
/// the bookkeeping untouched.
pub trait DispatchStrategy: Send + Sync + 'static {
    /// Admits, queues or drops `job`.
    fn submit(&self, job: Job) -> Admission;

    /// True while at least one admitted job has not completed.
    fn is_processing(&self) -> bool;

    /// Resolves once no admitted job is outstanding.
    fn idle(&self) -> BoxFuture<'_, ()>;

    /// Abandons queued work and refuses further submissions.
    ///
    /// Jobs already running are not interrupted.
    fn close(&self);

    /// Short name for logs.
    fn name(&self) -> &'static str;
}

/// Shorthand for the built-in strategies.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DispatchPolicy {
    /// Run handlers one by one in submission order.
    ///
    /// Use when every submission must execute and each must observe the
    /// effects of the previous one (e.g. appending to a persisted list).
    Sequential,

    /// Run every handler immediately, possibly interleaved.
    ///
    /// Use when handlers are independent (e.g. loading unrelated resources).
    #[default]
    Concurrent,

    /// Run one handler at a time and ignore submissions while busy.
    ///
    /// Use when repeated triggers are redundant (e.g. pull-to-refresh).
    Droppable,
}

impl DispatchPolicy {
    /// Builds the corresponding strategy object.
    pub fn into_strategy(self) -> Box<dyn DispatchStrategy> {
        match self {
            DispatchPolicy::Sequential => Box::new(Sequential::new()),
            DispatchPolicy::Concurrent => Box::new(Concurrent::new()),
            DispatchPolicy::Droppable => Box::new(Droppable::new()),
        }
    }
}

/// Handle of the ambient Tokio runtime, or `None` outside of one.
///
/// Strategies call this before touching any bookkeeping, so a submission that
/// cannot be spawned leaves no claimed slot or in-flight count behind.
pub(crate) fn runtime(handler: &str) -> Option<Handle> {
    match Handle::try_current() {
        Ok(handle) => Some(handle),
        Err(err) => {
            tracing::warn!(handler, error = %err, "no Tokio runtime, handler rejected");
            None
        }
    }
}

/// Locks `m`, recovering the data from a poisoned lock.
///
/// Jobs run outside of every lock, so poisoning can only come from a panic in
/// trivial bookkeeping; the protected state stays consistent.
pub(crate) fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}
