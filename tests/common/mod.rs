#![allow(dead_code)]

use std::backtrace::Backtrace;
use std::fmt::Debug;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use statevisor::{
    Context, Controller, ControllerBuilder, DispatchPolicy, HandlerError, Lifecycle, Observer,
    Registry, Violation, ViolationPolicy,
};

/// Observer that records every event as a short string.
#[derive(Default)]
pub struct Recorder {
    events: Mutex<Vec<String>>,
    violations: Mutex<Vec<Violation>>,
}

impl Recorder {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.events()
            .iter()
            .filter(|e| e.starts_with(prefix))
            .count()
    }

    pub fn violations(&self) -> Vec<Violation> {
        self.violations.lock().unwrap().clone()
    }

    fn push(&self, event: String) {
        self.events.lock().unwrap().push(event);
    }
}

impl Observer for Recorder {
    fn on_create(&self, c: &dyn Lifecycle) {
        self.push(format!("create:{}", c.label()));
    }

    fn on_dispose(&self, c: &dyn Lifecycle) {
        self.push(format!("dispose:{}", c.label()));
    }

    fn on_handler(&self, ctx: &Context) {
        self.push(format!("handler:{}", ctx.name()));
    }

    fn on_state_changed(&self, _c: &dyn Lifecycle, prev: &dyn Debug, next: &dyn Debug) {
        self.push(format!("state:{prev:?}->{next:?}"));
    }

    fn on_error(&self, _c: &dyn Lifecycle, error: &HandlerError, _bt: &Backtrace) {
        self.push(format!("error:{}", error.as_label()));
    }

    fn on_violation(&self, _c: &dyn Lifecycle, violation: Violation) {
        self.violations.lock().unwrap().push(violation);
    }
}

/// Shared, ordered log written from inside handlers.
#[derive(Clone, Default)]
pub struct Trace(Arc<Mutex<Vec<String>>>);

impl Trace {
    pub fn push(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

/// Builder preconfigured for tests: private registry, recorder, no panics on violations.
pub fn builder<S>(initial: S, policy: DispatchPolicy, recorder: &Arc<Recorder>) -> ControllerBuilder<S>
where
    S: Debug + Send + Sync + 'static,
{
    Controller::builder(initial)
        .with_label("test")
        .with_dispatch(policy)
        .with_observer(recorder.clone())
        .with_registry(Registry::new())
        .with_violation_policy(ViolationPolicy::Ignore)
}

/// Waits for the controller to go idle, failing the test after 5s.
pub async fn settle<S>(ctrl: &Controller<S>)
where
    S: Debug + Send + Sync + 'static,
{
    tokio::time::timeout(Duration::from_secs(5), ctrl.wait_idle())
        .await
        .expect("controller did not go idle within 5s");
}

/// Handler body that panics with `msg`.
pub async fn explode(msg: &'static str) -> Result<(), HandlerError> {
    panic!("{msg}")
}
