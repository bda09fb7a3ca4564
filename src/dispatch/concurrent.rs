//! # Concurrent strategy: no admission control.
//!
//! Every submitted handler starts immediately on its own Tokio task. Handlers
//! may interleave arbitrarily; a failure in one never affects the others.

use std::sync::Arc;

use futures::future::BoxFuture;
use tokio_util::sync::CancellationToken;

use super::{Activity, Admission, DispatchStrategy, Job, runtime};

/// Runs every handler immediately.
pub struct Concurrent {
    activity: Arc<Activity>,
    closed: CancellationToken,
}

impl Concurrent {
    /// Creates an idle strategy.
    pub fn new() -> Self {
        Self {
            activity: Arc::new(Activity::new()),
            closed: CancellationToken::new(),
        }
    }
}

impl Default for Concurrent {
    fn default() -> Self {
        Self::new()
    }
}

impl DispatchStrategy for Concurrent {
    fn submit(&self, job: Job) -> Admission {
        if self.closed.is_cancelled() {
            return Admission::Rejected;
        }
        let Some(rt) = runtime(job.name()) else {
            return Admission::Rejected;
        };

        self.activity.enter();
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
        "concurrent"
    }
}
