use tokio::sync::watch;

/// Counter of admitted-but-not-completed jobs, with an awaitable idle state.
///
/// Backed by a [`watch`] channel: every update goes through the sender's
/// internal lock, which makes [`Activity::try_claim`] a single atomic
/// test-and-set.
#[derive(Debug)]
pub struct Activity {
    tx: watch::Sender<usize>,
}

impl Activity {
    /// Creates an idle counter.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(0);
        Self { tx }
    }

    /// Records one more admitted job.
    pub fn enter(&self) {
        self.tx.send_modify(|n| *n += 1);
    }

    /// Moves 0 → 1 and returns true, or returns false if anything is in flight.
    pub fn try_claim(&self) -> bool {
        self.tx.send_if_modified(|n| {
            if *n == 0 {
                *n = 1;
                true
            } else {
                false
            }
        })
    }

    /// Records one completed (or abandoned) job.
    pub fn exit(&self) {
        self.exit_many(1);
    }

    /// Records `count` completed (or abandoned) jobs at once.
    pub fn exit_many(&self, count: usize) {
        if count == 0 {
            return;
        }
        self.tx.send_modify(|n| *n = n.saturating_sub(count));
    }

    /// Number of admitted jobs not yet completed.
    pub fn in_flight(&self) -> usize {
        *self.tx.borrow()
    }

    /// True if at least one job is in flight.
    pub fn is_active(&self) -> bool {
        self.in_flight() > 0
    }

    /// Waits until the counter drops to zero.
    pub async fn idle(&self) {
        let mut rx = self.tx.subscribe();
        let _ = rx.wait_for(|n| *n == 0).await;
    }
}

impl Default for Activity {
    fn default() -> Self {
        Self::new()
    }
}
