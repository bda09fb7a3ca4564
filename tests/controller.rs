mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::json;
use statevisor::{
    Context, Controller, DispatchPolicy, HandlerError, Metadata, ObserverSet, Registry, Violation,
};

use common::{Recorder, builder, explode, settle};

fn counting_listener(hits: &Arc<AtomicUsize>) -> impl Fn() + Send + Sync + 'static {
    let hits = Arc::clone(hits);
    move || {
        hits.fetch_add(1, Ordering::SeqCst);
    }
}

// ---------------------------
// Lifecycle
// ---------------------------

#[test]
fn create_and_dispose_are_observed_once() {
    let recorder = Recorder::new();
    let ctrl = builder(0u8, DispatchPolicy::Concurrent, &recorder).build();
    assert_eq!(recorder.events(), vec!["create:test"]);

    ctrl.dispose();
    ctrl.dispose();

    assert!(ctrl.is_disposed());
    assert_eq!(recorder.count("dispose:"), 1);
    assert_eq!(recorder.violations(), vec![Violation::DoubleDispose]);
    assert_eq!(ctrl.subscribers(), 0);
}

#[cfg(debug_assertions)]
#[test]
#[should_panic(expected = "already disposed")]
fn double_dispose_panics_under_the_debug_default() {
    let ctrl = Controller::builder(0u8)
        .with_registry(Registry::new())
        .build();
    ctrl.dispose();
    ctrl.dispose();
}

#[test]
fn label_defaults_to_the_state_type_name() {
    let ctrl = Controller::builder(0u8)
        .with_registry(Registry::new())
        .build();
    assert_eq!(ctrl.label(), "u8");
    assert_eq!(ctrl.dispatch_name(), "concurrent");
    ctrl.dispose();
}

#[test]
fn registry_tracks_live_instances() {
    let registry = Registry::new();
    let make = |label: &'static str| {
        Controller::builder(())
            .with_label(label)
            .with_registry(Arc::clone(&registry))
            .build()
    };

    let cart = make("cart");
    let profile = make("profile");
    let other_cart = make("cart");

    assert_eq!(registry.len(), 3);
    assert_eq!(registry.count_of("cart"), 2);
    assert_eq!(registry.labels(), vec!["cart", "cart", "profile"]);
    assert_eq!(
        registry.get(profile.id()).map(|c| c.label().to_string()),
        Some("profile".to_string())
    );

    cart.dispose();
    assert!(!registry.contains(cart.id()));
    assert_eq!(registry.count_of("cart"), 1);

    // Never disposed: dropping the last handle unregisters it.
    let id = other_cart.id();
    drop(other_cart);
    assert!(!registry.contains(id));

    profile.dispose();
    assert!(registry.is_empty());
}

// ---------------------------
// Listeners & state
// ---------------------------

#[test]
fn listener_count_is_net_of_removals() {
    let recorder = Recorder::new();
    let ctrl = builder(0u8, DispatchPolicy::Concurrent, &recorder).build();
    let hits = Arc::new(AtomicUsize::new(0));

    let a = ctrl.add_listener(counting_listener(&hits)).unwrap();
    let _b = ctrl.add_listener(counting_listener(&hits)).unwrap();
    let _c = ctrl.add_listener(counting_listener(&hits)).unwrap();
    assert_eq!(ctrl.subscribers(), 3);

    assert!(ctrl.remove_listener(a));
    assert!(!ctrl.remove_listener(a));
    assert_eq!(ctrl.subscribers(), 2);

    ctrl.notify_listeners();
    assert_eq!(hits.load(Ordering::SeqCst), 2);
}

#[test]
fn state_changes_notify_observer_then_listeners() {
    let recorder = Recorder::new();
    let ctrl = builder(0u32, DispatchPolicy::Concurrent, &recorder).build();
    let hits = Arc::new(AtomicUsize::new(0));
    ctrl.add_listener(counting_listener(&hits));

    assert!(ctrl.set_state(1));
    assert!(!ctrl.set_state(1));
    assert!(ctrl.update(|n| *n += 1));
    assert!(!ctrl.update(|_| {}));

    assert_eq!(ctrl.state(), 2);
    assert_eq!(ctrl.read(|n| n * 10), 20);
    assert_eq!(hits.load(Ordering::SeqCst), 2);
    assert_eq!(
        recorder.events()[1..].to_vec(),
        vec!["state:0->1", "state:1->2"]
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn no_state_write_lands_after_dispose_returns() {
    let recorder = Recorder::new();
    let ctrl = builder(0u64, DispatchPolicy::Concurrent, &recorder).build();

    let c = Arc::clone(&ctrl);
    ctrl.handle(move || async move {
        while c.update(|n| *n += 1) {
            tokio::task::yield_now().await;
        }
        Ok(())
    });

    while ctrl.state() < 100 {
        tokio::task::yield_now().await;
    }
    ctrl.dispose();
    let frozen = ctrl.state();

    settle(&ctrl).await;
    assert_eq!(ctrl.state(), frozen);
}

#[test]
fn panicking_listener_does_not_block_the_others() {
    let recorder = Recorder::new();
    let ctrl = builder(0u32, DispatchPolicy::Concurrent, &recorder).build();
    let hits = Arc::new(AtomicUsize::new(0));

    ctrl.add_listener(|| panic!("bad listener"));
    ctrl.add_listener(counting_listener(&hits));

    ctrl.set_state(5);
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[test]
fn listener_calls_after_dispose() {
    let recorder = Recorder::new();
    let ctrl = builder(0u32, DispatchPolicy::Concurrent, &recorder).build();
    let hits = Arc::new(AtomicUsize::new(0));
    let id = ctrl.add_listener(counting_listener(&hits)).unwrap();

    ctrl.dispose();
    assert_eq!(ctrl.subscribers(), 0);

    // Removal is tolerated silently.
    assert!(!ctrl.remove_listener(id));
    assert!(recorder.violations().is_empty());

    assert!(ctrl.add_listener(counting_listener(&hits)).is_none());
    ctrl.notify_listeners();
    assert!(!ctrl.set_state(9));

    assert_eq!(hits.load(Ordering::SeqCst), 0);
    assert_eq!(ctrl.state(), 0);
    assert_eq!(
        recorder.violations(),
        vec![Violation::ListenerAfterDispose, Violation::NotifyAfterDispose]
    );
}

// ---------------------------
// Context & errors
// ---------------------------

async fn current_user() -> Option<(String, serde_json::Value)> {
    tokio::time::sleep(Duration::from_millis(2)).await;
    let ctx = Context::current()?;
    let user = ctx.meta_value("userId").cloned()?;
    Some((ctx.name().to_string(), user))
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn handlers_see_their_own_ambient_context() {
    let recorder = Recorder::new();
    let ctrl = builder((), DispatchPolicy::Concurrent, &recorder).build();
    let seen = Arc::new(Mutex::new(Vec::new()));

    for (name, user) in [("refresh", 7), ("reload", 8)] {
        let seen = Arc::clone(&seen);
        let meta = Metadata::from([("userId".to_string(), json!(user))]);
        ctrl.handle_with(name, meta, move || async move {
            tokio::task::yield_now().await;
            let found = current_user().await;
            seen.lock().unwrap().push(found);
            Ok(())
        });
    }
    settle(&ctrl).await;

    let mut seen = seen.lock().unwrap().clone();
    seen.sort_by(|a, b| format!("{a:?}").cmp(&format!("{b:?}")));
    assert_eq!(
        seen,
        vec![
            Some(("refresh".to_string(), json!(7))),
            Some(("reload".to_string(), json!(8))),
        ]
    );
    assert!(Context::current().is_none());
}

#[tokio::test]
async fn context_links_back_to_the_controller() {
    let recorder = Recorder::new();
    let ctrl = builder((), DispatchPolicy::Sequential, &recorder).build();
    let seen = Arc::new(Mutex::new(None));

    let s = Arc::clone(&seen);
    ctrl.handle(move || async move {
        let ctx = Context::current().expect("inside a handler");
        let owner = ctx.owner().expect("controller alive");
        *s.lock().unwrap() = Some((
            ctx.name().to_string(),
            ctx.controller_id(),
            owner.is_processing(),
        ));
        Ok(())
    });
    settle(&ctrl).await;

    assert_eq!(
        *seen.lock().unwrap(),
        Some(("anonymous".to_string(), ctrl.id(), true))
    );
}

#[tokio::test]
async fn error_hook_runs_in_the_failing_handler_context() {
    let recorder = Recorder::new();
    let hooked = Arc::new(Mutex::new(Vec::new()));
    let h = Arc::clone(&hooked);
    let ctrl = builder((), DispatchPolicy::Sequential, &recorder)
        .on_error(move |err, _backtrace| {
            let name = Context::current().map(|c| c.name().to_string());
            h.lock().unwrap().push((name, err.as_label()));
        })
        .build();

    ctrl.handle_with("save", Metadata::new(), || async {
        Err(HandlerError::fail("disk full"))
    });
    ctrl.handle_with("load", Metadata::new(), || explode("corrupt file"));
    settle(&ctrl).await;

    assert_eq!(
        *hooked.lock().unwrap(),
        vec![
            (Some("save".to_string()), "handler_failed"),
            (Some("load".to_string()), "handler_panicked"),
        ]
    );
    assert_eq!(
        recorder.events(),
        vec![
            "create:test",
            "handler:save",
            "error:handler_failed",
            "handler:load",
            "error:handler_panicked",
        ]
    );
}

#[tokio::test]
async fn panicking_error_hook_still_reaches_the_observer() {
    let recorder = Recorder::new();
    let ctrl = builder((), DispatchPolicy::Sequential, &recorder)
        .on_error(|_, _| panic!("hook is broken"))
        .build();

    ctrl.handle(|| async { Err(HandlerError::fail("boom")) });
    settle(&ctrl).await;

    assert_eq!(recorder.count("error:handler_failed"), 1);
}

#[tokio::test]
async fn observer_sets_fan_out_every_event() {
    let first = Recorder::new();
    let second = Recorder::new();
    let ctrl = Controller::builder(0u8)
        .with_label("fan")
        .with_registry(Registry::new())
        .with_observer(Arc::new(
            ObserverSet::default()
                .with(first.clone())
                .with(second.clone()),
        ))
        .build();

    ctrl.handle(|| async { Ok(()) });
    settle(&ctrl).await;
    ctrl.dispose();

    let expected = vec!["create:fan", "handler:anonymous", "dispose:fan"];
    assert_eq!(first.events(), expected);
    assert_eq!(second.events(), expected);
}
