use std::borrow::Cow;
use std::fmt::Debug;
use std::future::Future;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use futures::FutureExt;

use crate::{context::Metadata, dispatch::Admission, error::HandlerError};

use super::{
    builder::ControllerBuilder,
    core::Core,
    lifecycle::{ControllerId, Lifecycle},
    listeners::ListenerId,
};

/// Reactive holder of one state value `S`.
///
/// Business logic is submitted as asynchronous handlers through
/// [`handle`](Controller::handle); how handlers are admitted and ordered is
/// decided by the controller's [`DispatchStrategy`](crate::DispatchStrategy).
/// Listeners are notified whenever the state changes.
///
/// Handlers are spawned on the current Tokio runtime, so `handle` must be
/// called from within one.
///
/// ## Example
/// ```
/// use std::sync::Arc;
/// use statevisor::{Controller, DispatchPolicy, HandlerError};
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() {
///     let counter = Controller::builder(0u32)
///         .with_dispatch(DispatchPolicy::Sequential)
///         .build();
///
///     for _ in 0..3 {
///         let c = Arc::clone(&counter);
///         counter.handle(move || async move {
///             c.update(|n| *n += 1);
///             Ok::<(), HandlerError>(())
///         });
///     }
///
///     counter.wait_idle().await;
///     assert_eq!(counter.state(), 3);
///     counter.dispose();
/// }
/// ```
pub struct Controller<S> {
    core: Arc<Core>,
    state: RwLock<S>,
}

impl<S> Controller<S>
where
    S: Debug + Send + Sync + 'static,
{
    /// Starts building a controller holding `initial`.
    pub fn builder(initial: S) -> ControllerBuilder<S> {
        ControllerBuilder::new(initial)
    }

    pub(crate) fn from_parts(core: Arc<Core>, initial: S) -> Self {
        Self {
            core,
            state: RwLock::new(initial),
        }
    }

    // ---------------------------
    // Handlers
    // ---------------------------

    /// Submits an unnamed handler (fire-and-forget).
    ///
    /// Failures go to the error hook and the observer, never back to the caller.
    /// Returns how the dispatch strategy admitted the handler.
    pub fn handle<F, Fut>(&self, work: F) -> Admission
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
    {
        self.core
            .handle(None, Metadata::new(), Box::new(move || work().boxed()))
    }

    /// Submits a handler with a name and metadata, both visible through
    /// [`Context::current`](crate::Context::current) while it runs.
    pub fn handle_with<F, Fut>(
        &self,
        name: impl Into<Cow<'static, str>>,
        meta: Metadata,
        work: F,
    ) -> Admission
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
    {
        self.core
            .handle(Some(name.into()), meta, Box::new(move || work().boxed()))
    }

    /// Resolves once no handler is running or queued.
    pub async fn wait_idle(&self) {
        self.core.wait_idle().await;
    }

    // ---------------------------
    // State
    // ---------------------------

    fn read_lock(&self) -> RwLockReadGuard<'_, S> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_lock(&self) -> RwLockWriteGuard<'_, S> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> S
    where
        S: Clone,
    {
        self.read_lock().clone()
    }

    /// Runs `f` against the current state without cloning it.
    pub fn read<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        f(&*self.read_lock())
    }

    /// Replaces the state. Observer and listeners are notified if it changed.
    ///
    /// Returns whether the state changed. Always `false` after dispose.
    pub fn set_state(&self, next: S) -> bool
    where
        S: Clone + PartialEq,
    {
        let snapshot = next.clone();
        let prev = {
            let mut state = self.write_lock();
            if self.core.is_disposed() || *state == next {
                return false;
            }
            std::mem::replace(&mut *state, next)
        };
        self.core.state_changed(&prev, &snapshot);
        true
    }

    /// Mutates the state in place. Observer and listeners are notified if it changed.
    ///
    /// Returns whether the state changed. Always `false` after dispose.
    pub fn update(&self, f: impl FnOnce(&mut S)) -> bool
    where
        S: Clone + PartialEq,
    {
        let (prev, next) = {
            let mut state = self.write_lock();
            if self.core.is_disposed() {
                return false;
            }
            let prev = state.clone();
            f(&mut *state);
            if *state == prev {
                return false;
            }
            (prev, state.clone())
        };
        self.core.state_changed(&prev, &next);
        true
    }

    // ---------------------------
    // Listeners
    // ---------------------------

    /// Registers a change listener. `None` (and a reported violation) after dispose.
    pub fn add_listener(&self, listener: impl Fn() + Send + Sync + 'static) -> Option<ListenerId> {
        self.core.add_listener(Arc::new(listener))
    }

    /// Unregisters a listener. Tolerated silently after dispose.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.core.remove_listener(id)
    }

    /// Calls every listener. A reported violation after dispose.
    pub fn notify_listeners(&self) {
        self.core.notify_listeners();
    }

    // ---------------------------
    // Lifecycle
    // ---------------------------

    /// Disposes the controller: listeners are dropped, queued handlers are
    /// abandoned, the instance leaves the registry. Running handlers finish,
    /// but their failures and state writes are discarded.
    ///
    /// The disposal flag is flipped under the state lock: once `dispose`
    /// returns, no `set_state` or `update` can change the state any more.
    ///
    /// A second call is a reported violation.
    pub fn dispose(&self) {
        let first = {
            let _state = self.write_lock();
            self.core.mark_disposed()
        };
        self.core.finish_dispose(first);
    }

    /// Controller id.
    pub fn id(&self) -> ControllerId {
        self.core.id()
    }

    /// Controller label.
    pub fn label(&self) -> &str {
        self.core.label()
    }

    /// True once disposed.
    pub fn is_disposed(&self) -> bool {
        self.core.is_disposed()
    }

    /// True while at least one handler is running or queued.
    pub fn is_processing(&self) -> bool {
        self.core.is_processing()
    }

    /// Number of registered listeners (0 after dispose).
    pub fn subscribers(&self) -> usize {
        self.core.subscribers()
    }

    /// Name of the bound dispatch strategy.
    pub fn dispatch_name(&self) -> &'static str {
        self.core.dispatch_name()
    }
}

impl<S> Debug for Controller<S>
where
    S: Debug + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Controller")
            .field("id", &self.core.id())
            .field("label", &self.core.label())
            .field("disposed", &self.core.is_disposed())
            .field("processing", &self.core.is_processing())
            .finish_non_exhaustive()
    }
}
