//! # Example: counter
//!
//! Three counters, one per dispatch policy, hammered with the same burst of
//! handlers. Shows how the policy changes what ends up in the state.
//!
//! Demonstrates how to:
//! - Build a [`Controller`] with a label, a [`DispatchPolicy`] and a [`LogObserver`].
//! - Submit named handlers with metadata and read it back through [`Context::current`].
//! - React to changes with a listener.
//! - Handle failures through the controller's error hook.
//!
//! ## Flow
//! ```text
//! burst of 5 handle_with("increment", {step}) per counter
//!     ├─► sequential  → all 5 run, one after another       → 5
//!     ├─► concurrent  → all 5 run at once                  → 5
//!     └─► droppable   → first runs, the other 4 dropped     → 1
//! once idle, one failing handler per counter → error hook + LogObserver
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=debug cargo run --example counter
//! ```

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use statevisor::{
    Admission, Context, Controller, DispatchPolicy, HandlerError, LogObserver, Metadata,
};

async fn increment(counter: Arc<Controller<u64>>) -> Result<(), HandlerError> {
    let ctx = Context::current().ok_or_else(|| HandlerError::fail("no context"))?;
    let step = ctx.meta_value("step").and_then(|v| v.as_u64()).unwrap_or(1);

    tokio::time::sleep(Duration::from_millis(50)).await;
    counter.update(|n| *n += step);
    Ok(())
}

fn counter(policy: DispatchPolicy, label: &'static str) -> Arc<Controller<u64>> {
    let ctrl = Controller::builder(0u64)
        .with_label(label)
        .with_dispatch(policy)
        .with_observer(Arc::new(LogObserver::new()))
        .on_error(move |err, _backtrace| {
            let handler = Context::current().map(|c| c.name().to_string());
            println!("[{label}] hook: {} in {:?}", err.as_message(), handler);
        })
        .build();

    let weak = Arc::downgrade(&ctrl);
    ctrl.add_listener(move || {
        if let Some(c) = weak.upgrade() {
            println!("[{label}] changed -> {}", c.state());
        }
    });
    ctrl
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let counters = [
        counter(DispatchPolicy::Sequential, "sequential"),
        counter(DispatchPolicy::Concurrent, "concurrent"),
        counter(DispatchPolicy::Droppable, "droppable"),
    ];

    for ctrl in &counters {
        let mut admitted = 0;
        for _ in 0..5 {
            let c = Arc::clone(ctrl);
            let meta = Metadata::from([("step".to_string(), json!(1))]);
            if ctrl.handle_with("increment", meta, move || increment(c)) != Admission::Dropped {
                admitted += 1;
            }
        }
        println!("[{}] admitted {admitted}/5", ctrl.label());
    }

    for ctrl in &counters {
        ctrl.wait_idle().await;
        println!("[{}] final = {}", ctrl.label(), ctrl.state());

        ctrl.handle_with("broken", Metadata::new(), || async {
            let err = anyhow::anyhow!("upstream unavailable").context("refreshing");
            Err(HandlerError::from(err))
        });
        ctrl.wait_idle().await;
        ctrl.dispose();
    }
    Ok(())
}
