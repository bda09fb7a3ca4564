//! # Droppable strategy: one slot, drop when busy.
//!
//! ```text
//! Idle ──submit──► Busy      (handler runs)
//! Busy ──submit──► Busy      (handler dropped, never runs, no error)
//! Busy ──done────► Idle
//! ```
//!
//! The Idle → Busy transition is a single atomic claim, so of two submissions
//! racing for an idle slot exactly one is admitted.

use std::sync::Arc;

use futures::future::BoxFuture;
use tokio_util::sync::CancellationToken;

use super::{Activity, Admission, DispatchStrategy, Job, runtime};

/// Runs one handler at a time and drops submissions while busy.
pub struct Droppable {
    activity: Arc<Activity>,
    closed: CancellationToken,
}

impl Droppable {
    /// Creates an idle strategy.
    pub fn new() -> Self {
        Self {
            activity: Arc::new(Activity::new()),
            closed: CancellationToken::new(),
        }
    }
}

impl Default for Droppable {
    fn default() -> Self {
        Self::new()
    }
}

impl DispatchStrategy for Droppable {
    fn submit(&self, job: Job) -> Admission {
        if self.closed.is_cancelled() {
            return Admission::Rejected;
        }
        let Some(rt) = runtime(job.name()) else {
            return Admission::Rejected;
        };

        if !self.activity.try_claim() {
            tracing::debug!(handler = job.name(), "slot busy, handler dropped");
            return Admission::Dropped;
        }

        let activity = Arc::clone(&self.activity);
        rt.spawn(async move {
            job.run().await;
            activity.exit();
        });
        Admission::Started
    }

    fn is_processing(&self) -> bool {
        self.activity.is_active()
    }

    fn idle(&self) -> BoxFuture<'_, ()> {
        Box::pin(self.activity.idle())
    }

    fn close(&self) {
        self.closed.cancel();
    }

    fn name(&self) -> &'static str {
        "droppable"
    }
}
