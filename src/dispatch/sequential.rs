//! # Sequential strategy: one slot, FIFO queue.
//!
//! At most one handler executes at a time. Submissions arriving while the slot
//! is occupied are queued and run strictly in arrival order, after every
//! earlier handler completed (successfully or not).
//!
//! ## Slot state
//! ```text
//! Idle ──submit──► Running (spawn drain loop)
//! Running ──submit──► Running (queue.push_back)
//! Running ──job done, queue non-empty──► Running (pop_front, run)
//! Running ──job done, queue empty──────► Idle
//! ```
//!
//! Exactly one drain loop exists per running slot; the decision to start one
//! and the decision to stop it are both made under the slot lock.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use futures::future::BoxFuture;
use tokio_util::sync::CancellationToken;

use super::{Activity, Admission, DispatchStrategy, Job, lock, runtime};

/// Runs handlers one at a time in submission order.
pub struct Sequential {
    shared: Arc<Shared>,
}

struct Shared {
    slot: Mutex<Slot>,
    activity: Activity,
    closed: CancellationToken,
}

#[derive(Default)]
struct Slot {
    running: bool,
    queue: VecDeque<Job>,
}

impl Sequential {
    /// Creates an idle strategy.
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                slot: Mutex::new(Slot::default()),
                activity: Activity::new(),
                closed: CancellationToken::new(),
            }),
        }
    }
}

impl Default for Sequential {
    fn default() -> Self {
        Self::new()
    }
}

impl Shared {
    /// Runs `first`, then keeps popping the queue until it is empty.
    async fn drain(self: Arc<Self>, first: Job) {
        let mut next = Some(first);
        while let Some(job) = next {
            job.run().await;
            self.activity.exit();
            next = self.next_job();
        }
    }

    /// Pops the next job, or releases the slot.
    fn next_job(&self) -> Option<Job> {
        let mut slot = lock(&self.slot);
        let next = if self.closed.is_cancelled() {
            None
        } else {
            slot.queue.pop_front()
        };
        if next.is_none() {
            slot.running = false;
        }
        next
    }
}

impl DispatchStrategy for Sequential {
    fn submit(&self, job: Job) -> Admission {
        let Some(rt) = runtime(job.name()) else {
            return Admission::Rejected;
        };
        let mut slot = lock(&self.shared.slot);
        if self.shared.closed.is_cancelled() {
            return Admission::Rejected;
        }

        self.shared.activity.enter();
        if slot.running {
            tracing::trace!(handler = job.name(), depth = slot.queue.len() + 1, "handler queued");
            slot.queue.push_back(job);
            return Admission::Queued;
        }

        slot.running = true;
        drop(slot);

        rt.spawn(Arc::clone(&self.shared).drain(job));
        Admission::Started
    }

    fn is_processing(&self) -> bool {
        self.shared.activity.is_active()
    }

    fn idle(&self) -> BoxFuture<'_, ()> {
        Box::pin(self.shared.activity.idle())
    }

    fn close(&self) {
        let abandoned = {
            let mut slot = lock(&self.shared.slot);
            self.shared.closed.cancel();
            std::mem::take(&mut slot.queue)
        };

        if !abandoned.is_empty() {
            tracing::debug!(count = abandoned.len(), "abandoning queued handlers");
        }
        self.shared.activity.exit_many(abandoned.len());
    }

    fn name(&self) -> &'static str {
        "sequential"
    }
}
