use std::backtrace::Backtrace;
use std::borrow::Cow;
use std::fmt::Debug;
use std::sync::Arc;

use crate::{
    config::{ControllerConfig, ViolationPolicy},
    dispatch::{DispatchPolicy, DispatchStrategy},
    error::HandlerError,
    observers::{NoopObserver, Observer},
    registry::Registry,
};

use super::{
    core::{Core, CoreParts, ErrorHook},
    instance::Controller,
};

/// Builder for constructing a [`Controller`] with optional collaborators.
///
/// Defaults: [`DispatchPolicy::Concurrent`], [`NoopObserver`],
/// [`Registry::global`], no error hook, [`ControllerConfig::default`].
pub struct ControllerBuilder<S> {
    initial: S,
    config: ControllerConfig,
    dispatch: Option<Box<dyn DispatchStrategy>>,
    observer: Option<Arc<dyn Observer>>,
    registry: Option<Arc<Registry>>,
    on_error: Option<ErrorHook>,
}

impl<S> ControllerBuilder<S>
where
    S: Debug + Send + Sync + 'static,
{
    /// Creates a builder with the given initial state.
    pub fn new(initial: S) -> Self {
        Self {
            initial,
            config: ControllerConfig::default(),
            dispatch: None,
            observer: None,
            registry: None,
            on_error: None,
        }
    }

    /// Replaces the whole configuration.
    pub fn with_config(mut self, config: ControllerConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the label used in logs, the registry and observer events.
    pub fn with_label(mut self, label: impl Into<Cow<'static, str>>) -> Self {
        self.config.label = Some(label.into());
        self
    }

    /// Sets how contract violations are surfaced.
    pub fn with_violation_policy(mut self, policy: ViolationPolicy) -> Self {
        self.config.violation_policy = policy;
        self
    }

    /// Selects one of the built-in dispatch strategies.
    pub fn with_dispatch(mut self, policy: DispatchPolicy) -> Self {
        self.dispatch = Some(policy.into_strategy());
        self
    }

    /// Installs a custom dispatch strategy.
    pub fn with_strategy(mut self, strategy: impl DispatchStrategy) -> Self {
        self.dispatch = Some(Box::new(strategy));
        self
    }

    /// Installs the observer receiving lifecycle, state and error events.
    pub fn with_observer(mut self, observer: Arc<dyn Observer>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Registers the controller in `registry` instead of the global one.
    pub fn with_registry(mut self, registry: Arc<Registry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Sets the controller's own error hook, called before the observer.
    pub fn on_error(
        mut self,
        hook: impl Fn(&HandlerError, &Backtrace) + Send + Sync + 'static,
    ) -> Self {
        self.on_error = Some(Arc::new(hook));
        self
    }

    /// Builds the controller, registers it and reports `on_create`.
    pub fn build(self) -> Arc<Controller<S>> {
        let label: Arc<str> = Arc::from(self.config.label_or(std::any::type_name::<S>()));
        let core = Core::start(CoreParts {
            config: self.config,
            label,
            dispatch: self
                .dispatch
                .unwrap_or_else(|| DispatchPolicy::default().into_strategy()),
            observer: self.observer.unwrap_or_else(|| Arc::new(NoopObserver)),
            registry: self.registry.unwrap_or_else(Registry::global),
            on_error: self.on_error,
        });

        Arc::new(Controller::from_parts(core, self.initial))
    }
}
