//! # Invocation context: per-handler ambient metadata.
//!
//! Every handler runs inside a fresh [`Context`] carrying the operation name,
//! free-form [`Metadata`] and a weak back-reference to the owning controller.
//! Code running inside the handler (and anything it calls, including the error
//! hook on failure) can retrieve it with [`Context::current`] instead of
//! threading it through every signature.
//!
//! ## Scope rules
//! ```text
//! Job::run()
//!   └─► Context::scope(ctx, handler future)
//!          ├─ .await points inside the handler   → same ctx on resume
//!          ├─ nested fn calls                    → same ctx
//!          ├─ error hook / observer on failure   → same ctx
//!          └─ tokio::spawn(..) from the handler  → NO ctx (opt in with Context::scope)
//! ```
//!
//! The ambient slot is a Tokio task-local: it is bound only while the scoped
//! future is being polled, so concurrent handlers never observe each other's
//! context.

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Weak};

use crate::controller::{ControllerId, Lifecycle};

/// Key/value metadata attached to a handler invocation.
pub type Metadata = HashMap<String, serde_json::Value>;

tokio::task_local! {
    static CURRENT: Context;
}

/// Immutable per-invocation record. Cheap to clone.
#[derive(Clone)]
pub struct Context {
    inner: Arc<Inner>,
}

struct Inner {
    name: Cow<'static, str>,
    meta: Metadata,
    controller_id: ControllerId,
    controller_label: Arc<str>,
    owner: Weak<dyn Lifecycle>,
}

impl Context {
    /// Creates a context for one invocation on `owner`.
    ///
    /// Only a weak reference to the owner is kept.
    pub fn new(
        owner: &Arc<dyn Lifecycle>,
        name: impl Into<Cow<'static, str>>,
        meta: Metadata,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                name: name.into(),
                meta,
                controller_id: owner.id(),
                controller_label: Arc::from(owner.label()),
                owner: Arc::downgrade(owner),
            }),
        }
    }

    /// Returns the context of the handler currently executing on this task.
    ///
    /// `None` outside of any handler, or inside a task spawned by a handler
    /// that did not opt in through [`Context::scope`].
    pub fn current() -> Option<Context> {
        CURRENT.try_with(Context::clone).ok()
    }

    /// Runs `fut` with `ctx` as the ambient context.
    ///
    /// ## Example
    /// ```
    /// # use std::sync::Arc;
    /// # use statevisor::{Context, Controller};
    /// # #[tokio::main(flavor = "current_thread")]
    /// # async fn main() {
    /// # let ctrl = Controller::builder(()).build();
    /// # ctrl.handle_with("refresh", Default::default(), || async {
    /// // inside a handler: hand the context over to a spawned subtask
    /// let ctx = Context::current().expect("inside a handler");
    /// tokio::spawn(Context::scope(ctx, async {
    ///     assert_eq!(Context::current().unwrap().name(), "refresh");
    /// }));
    /// # Ok::<(), statevisor::HandlerError>(())
    /// # });
    /// # ctrl.wait_idle().await;
    /// # }
    /// ```
    pub async fn scope<F: Future>(ctx: Context, fut: F) -> F::Output {
        CURRENT.scope(ctx, fut).await
    }

    /// Operation name.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// All metadata attached to this invocation.
    pub fn meta(&self) -> &Metadata {
        &self.inner.meta
    }

    /// Single metadata value.
    pub fn meta_value(&self, key: &str) -> Option<&serde_json::Value> {
        self.inner.meta.get(key)
    }

    /// Id of the owning controller.
    pub fn controller_id(&self) -> ControllerId {
        self.inner.controller_id
    }

    /// Label of the owning controller.
    pub fn controller_label(&self) -> &str {
        &self.inner.controller_label
    }

    /// Upgrades the back-reference; `None` once the controller has been dropped.
    pub fn owner(&self) -> Option<Arc<dyn Lifecycle>> {
        self.inner.owner.upgrade()
    }

    /// True if both handles point at the same invocation.
    pub fn same_invocation(&self, other: &Context) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("name", &self.inner.name)
            .field("meta", &self.inner.meta)
            .field("controller", &self.inner.controller_id)
            .finish()
    }
}
