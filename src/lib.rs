//! # statevisor
//!
//! **Statevisor** is a small library of reactive state controllers for async
//! Rust.
//!
//! A [`Controller`] owns one piece of application state, runs asynchronous
//! business logic ("handlers") that mutate it, and notifies listeners when it
//! changes. How concurrent handlers interact is decided per controller by a
//! [`DispatchStrategy`]: run them one by one, all at once, or drop new ones
//! while one is busy.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   caller                       caller                       caller
//!     │ handle(work)               │ handle_with("refresh", meta, work)
//!     ▼                            ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Controller<S>                                                    │
//! │  - state: RwLock<S>        (set_state / update / read)            │
//! │  - Core                                                           │
//! │      - disposed flag       (monotonic)                            │
//! │      - Listeners           (subscriber count, notify)             │
//! │      - DispatchStrategy    (Sequential | Concurrent | Droppable)  │
//! │      - Observer            (injected, default NoopObserver)       │
//! │      - Registry            (injected, default Registry::global)   │
//! └──────┬────────────────────────────────────────────────────────────┘
//!        ▼
//!   strategy.submit(job) ──► Started | Queued | Dropped | Rejected
//!        │
//!        ▼ (tokio::spawn)
//!   job.run()
//!     ├─► Context::new(owner, name, meta)
//!     ├─► Observer::on_handler
//!     └─► Context::scope ──► work().await
//!              ├─ Ok       → done
//!              ├─ Err      → error hook → Observer::on_error
//!              └─ panic    → error hook → Observer::on_error
//! ```
//!
//! ### Dispose
//! ```text
//! dispose()
//!   ├─► listeners closed        (subscribers() == 0 from now on)
//!   ├─► strategy closed         (queued handlers abandoned)
//!   ├─► Registry::remove
//!   └─► Observer::on_dispose
//! still-running handlers finish; their errors and state writes are discarded
//! ```
//!
//! ## Features
//! | Area             | Description                                                  | Key types / traits                            |
//! |------------------|--------------------------------------------------------------|-----------------------------------------------|
//! | **Controllers**  | State holder, handler entry point, listeners, disposal.      | [`Controller`], [`ControllerBuilder`]         |
//! | **Dispatch**     | Admission and ordering of handlers.                          | [`DispatchStrategy`], [`DispatchPolicy`]      |
//! | **Context**      | Ambient per-handler name and metadata.                       | [`Context`], [`Metadata`]                     |
//! | **Observers**    | Telemetry hooks for lifecycle, state and errors.             | [`Observer`], [`ObserverSet`]                 |
//! | **Registry**     | Introspection of live controllers.                           | [`Registry`], [`Lifecycle`]                   |
//! | **Errors**       | Handler failures and contract violations.                    | [`HandlerError`], [`Violation`]               |
//! | **Configuration**| Labels, default handler name, violation policy.              | [`ControllerConfig`], [`ViolationPolicy`]     |
//!
//! ## Optional features
//! - `logging` _(default)_: exports [`LogObserver`], which renders events through `tracing`.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use serde_json::json;
//! use statevisor::{Context, Controller, DispatchPolicy, HandlerError, Metadata};
//!
//! #[derive(Clone, Debug, Default, PartialEq)]
//! struct Profile {
//!     name: String,
//!     loads: u32,
//! }
//!
//! async fn fetch_name(user_id: u64) -> Result<String, HandlerError> {
//!     // The invocation context is ambient: no need to pass it down.
//!     let ctx = Context::current().expect("called from a handler");
//!     assert_eq!(ctx.name(), "refresh");
//!     Ok(format!("user-{user_id}"))
//! }
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let profile = Controller::builder(Profile::default())
//!         .with_label("profile")
//!         .with_dispatch(DispatchPolicy::Droppable)
//!         .build();
//!
//!     profile.add_listener(|| println!("profile changed"));
//!
//!     let p = Arc::clone(&profile);
//!     let meta = Metadata::from([("userId".to_string(), json!(7))]);
//!     profile.handle_with("refresh", meta, move || async move {
//!         let name = fetch_name(7).await?;
//!         p.update(|s| {
//!             s.name = name;
//!             s.loads += 1;
//!         });
//!         Ok::<(), HandlerError>(())
//!     });
//!
//!     profile.wait_idle().await;
//!     assert_eq!(profile.state().name, "user-7");
//!     profile.dispose();
//! }
//! ```

mod config;
mod context;
mod controller;
mod dispatch;
mod error;
mod observers;
mod registry;

// ---- Public re-exports ----

pub use config::{ControllerConfig, ViolationPolicy};
pub use context::{Context, Metadata};
pub use controller::{
    Controller, ControllerBuilder, ControllerId, ErrorHook, Lifecycle, Listener, ListenerId,
};
pub use dispatch::{
    Activity, Admission, Concurrent, DispatchPolicy, DispatchStrategy, Droppable, Job, Sequential,
};
pub use error::{HandlerError, Origin, Violation};
pub use observers::{NoopObserver, Observer, ObserverSet};
pub use registry::Registry;

// Optional: a `tracing`-backed observer.
// Enabled by default; disable with `default-features = false`.
#[cfg(feature = "logging")]
pub use observers::LogObserver;
