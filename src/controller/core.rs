use std::backtrace::Backtrace;
use std::borrow::Cow;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use crate::{
    config::{ControllerConfig, ViolationPolicy},
    context::{Context, Metadata},
    dispatch::{Admission, BoxWork, DispatchStrategy, Job},
    error::{HandlerError, Violation},
    observers::{Observer, isolate},
    registry::Registry,
};

use super::{
    lifecycle::{ControllerId, Lifecycle},
    listeners::{Listener, ListenerId, Listeners},
};

/// Controller-specific error hook, called before the observer on handler failure
/// with the error and the stack trace of its origin.
pub type ErrorHook = Arc<dyn Fn(&HandlerError, &Backtrace) + Send + Sync>;

/// State-type independent part of a controller: disposal, listeners, dispatch
/// and telemetry routing.
pub(crate) struct Core {
    id: ControllerId,
    label: Arc<str>,
    config: ControllerConfig,
    disposed: AtomicBool,
    listeners: Listeners,
    dispatch: Box<dyn DispatchStrategy>,
    observer: Arc<dyn Observer>,
    registry: Arc<Registry>,
    on_error: Option<ErrorHook>,
    me: Weak<Core>,
}

pub(crate) struct CoreParts {
    pub config: ControllerConfig,
    pub label: Arc<str>,
    pub dispatch: Box<dyn DispatchStrategy>,
    pub observer: Arc<dyn Observer>,
    pub registry: Arc<Registry>,
    pub on_error: Option<ErrorHook>,
}

impl Core {
    /// Creates the core, registers it and announces it to the observer.
    pub(crate) fn start(parts: CoreParts) -> Arc<Self> {
        let core = Arc::new_cyclic(|me| Self {
            id: ControllerId::next(),
            label: parts.label,
            config: parts.config,
            disposed: AtomicBool::new(false),
            listeners: Listeners::default(),
            dispatch: parts.dispatch,
            observer: parts.observer,
            registry: parts.registry,
            on_error: parts.on_error,
            me: me.clone(),
        });

        let as_lifecycle: Arc<dyn Lifecycle> = core.clone();
        core.registry.insert(&as_lifecycle);
        tracing::debug!(
            controller = %core.id,
            label = %core.label,
            dispatch = core.dispatch.name(),
            "controller created"
        );
        isolate("observer.on_create", || core.observer.on_create(core.as_ref()));
        core
    }

    // ---------------------------
    // Dispatch entry point
    // ---------------------------

    pub(crate) fn handle(
        &self,
        name: Option<Cow<'static, str>>,
        meta: Metadata,
        work: BoxWork,
    ) -> Admission {
        if self.is_disposed() {
            self.violation(Violation::UseAfterDispose);
            return Admission::Rejected;
        }
        let Some(me) = self.me.upgrade() else {
            return Admission::Rejected;
        };

        let name = name.unwrap_or_else(|| self.config.default_handler_name.clone());
        let job = Job::new(me, name, meta, work);
        let admission = self.dispatch.submit(job);
        tracing::trace!(controller = %self.id, ?admission, "handler submitted");
        admission
    }

    pub(crate) fn dispatch_name(&self) -> &'static str {
        self.dispatch.name()
    }

    pub(crate) async fn wait_idle(&self) {
        self.dispatch.idle().await;
    }

    // ---------------------------
    // Job callbacks
    // ---------------------------

    pub(crate) fn handler_started(&self, ctx: &Context) {
        if self.is_disposed() {
            return;
        }
        tracing::debug!(controller = %self.id, handler = ctx.name(), "handler started");
        isolate("observer.on_handler", || self.observer.on_handler(ctx));
    }

    pub(crate) fn handler_completed(&self, ctx: &Context) {
        tracing::trace!(controller = %self.id, handler = ctx.name(), "handler completed");
    }

    /// Routes a failure to the error hook, then the observer. Never panics.
    pub(crate) fn handler_failed(&self, ctx: &Context, err: HandlerError) {
        if self.is_disposed() {
            tracing::debug!(
                controller = %self.id,
                handler = ctx.name(),
                error = %err,
                "discarding failure of handler abandoned by dispose"
            );
            return;
        }

        let backtrace = err.backtrace();
        tracing::warn!(
            controller = %self.id,
            label = %self.label,
            handler = ctx.name(),
            kind = err.as_label(),
            error = %err,
            "handler failed"
        );

        if let Some(hook) = &self.on_error {
            isolate("error hook", || (hook.as_ref())(&err, backtrace));
        }
        isolate("observer.on_error", || {
            self.observer.on_error(self, &err, backtrace)
        });
    }

    // ---------------------------
    // Listeners & state notifications
    // ---------------------------

    pub(crate) fn add_listener(&self, listener: Listener) -> Option<ListenerId> {
        let id = self.listeners.add(listener);
        if id.is_none() {
            self.violation(Violation::ListenerAfterDispose);
        }
        id
    }

    /// After dispose the list is empty, so removal is a silent `false`.
    pub(crate) fn remove_listener(&self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    pub(crate) fn notify_listeners(&self) {
        if self.is_disposed() {
            self.violation(Violation::NotifyAfterDispose);
            return;
        }
        self.broadcast();
    }

    /// Reports a state transition. Silently skipped once disposed, since
    /// abandoned in-flight handlers may still get here.
    pub(crate) fn state_changed(&self, prev: &dyn std::fmt::Debug, next: &dyn std::fmt::Debug) {
        if self.is_disposed() {
            return;
        }
        tracing::trace!(controller = %self.id, "state changed");
        isolate("observer.on_state_changed", || {
            self.observer.on_state_changed(self, prev, next)
        });
        self.broadcast();
    }

    fn broadcast(&self) {
        for listener in self.listeners.snapshot() {
            isolate("listener", || (*listener)());
        }
    }

    // ---------------------------
    // Disposal
    // ---------------------------

    /// Flips the disposal flag; true for the first call only.
    ///
    /// Split from [`Core::finish_dispose`] so the owner can flip it while
    /// holding its state lock.
    pub(crate) fn mark_disposed(&self) -> bool {
        !self.disposed.swap(true, Ordering::AcqRel)
    }

    /// Releases everything after [`Core::mark_disposed`], or reports the
    /// repeated call.
    pub(crate) fn finish_dispose(&self, first: bool) {
        if !first {
            self.violation(Violation::DoubleDispose);
            return;
        }

        let listeners = self.listeners.close();
        self.dispatch.close();
        self.registry.remove(self.id);
        tracing::debug!(
            controller = %self.id,
            label = %self.label,
            listeners,
            "controller disposed"
        );
        isolate("observer.on_dispose", || self.observer.on_dispose(self));
    }

    /// Logs and observes `v`, then applies the configured policy.
    fn violation(&self, v: Violation) {
        tracing::error!(
            controller = %self.id,
            label = %self.label,
            violation = v.as_label(),
            "{v}"
        );
        isolate("observer.on_violation", || self.observer.on_violation(self, v));

        if self.config.violation_policy == ViolationPolicy::Panic {
            panic!("{v} ({} '{}')", self.id, self.label);
        }
    }
}

impl Lifecycle for Core {
    fn id(&self) -> ControllerId {
        self.id
    }

    fn label(&self) -> &str {
        &self.label
    }

    fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    fn is_processing(&self) -> bool {
        self.dispatch.is_processing()
    }

    fn subscribers(&self) -> usize {
        self.listeners.len()
    }
}

impl Drop for Core {
    fn drop(&mut self) {
        if !*self.disposed.get_mut() {
            self.registry.remove(self.id);
        }
    }
}
