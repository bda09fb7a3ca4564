//! # One handler invocation, ready to run.
//!
//! Executes a single handler under a fresh [`Context`] and reports the outcome
//! back to the owning controller core.
//!
//! ## Flow
//! ```text
//! Job::run()
//!   ├─► Context::new(owner, name, meta)
//!   ├─► core.handler_started(ctx)          → Observer::on_handler
//!   └─► Context::scope(ctx):
//!         work() ──► Ok(())       → core.handler_completed(ctx)
//!                ──► Err(e)       → core.handler_failed(ctx, e)
//!                ──► panic        → core.handler_failed(ctx, Panicked + location)
//! ```
//!
//! ## Rules
//! - `run()` never panics and never returns an error: every failure is routed
//!   to the core, so strategies can release their bookkeeping unconditionally.
//! - Failure routing happens **inside** the context scope, so the error hook
//!   can still call [`Context::current`].

use std::borrow::Cow;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;

use crate::context::{Context, Metadata};
use crate::controller::{Core, Lifecycle};
use crate::error::{HandlerError, Origin, panic_message};

use super::panics;

/// Type-erased handler body.
pub(crate) type BoxWork =
    Box<dyn FnOnce() -> BoxFuture<'static, Result<(), HandlerError>> + Send>;

/// A submitted handler together with its name, metadata and owner.
///
/// Strategies only decide *when* to call [`Job::run`]; dropping a job without
/// running it abandons the handler.
pub struct Job {
    name: Cow<'static, str>,
    meta: Metadata,
    work: BoxWork,
    core: Arc<Core>,
}

impl Job {
    pub(crate) fn new(
        core: Arc<Core>,
        name: Cow<'static, str>,
        meta: Metadata,
        work: BoxWork,
    ) -> Self {
        Self {
            name,
            meta,
            work,
            core,
        }
    }

    /// Handler name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Handler metadata.
    pub fn meta(&self) -> &Metadata {
        &self.meta
    }

    /// Executes the handler to completion. Infallible by construction.
    pub fn run(self) -> BoxFuture<'static, ()> {
        let Job {
            name,
            meta,
            work,
            core,
        } = self;

        panics::install();
        async move {
            let owner: Arc<dyn Lifecycle> = core.clone();
            let ctx = Context::new(&owner, name, meta);
            core.handler_started(&ctx);

            Context::scope(ctx.clone(), async {
                let outcome = AssertUnwindSafe(async move { work().await })
                    .catch_unwind()
                    .await;

                match outcome {
                    Ok(Ok(())) => core.handler_completed(&ctx),
                    Ok(Err(err)) => core.handler_failed(&ctx, err),
                    Err(payload) => {
                        let mut info = panic_message(payload.as_ref());
                        let origin = match panics::take() {
                            Some(record) => {
                                if let Some(at) = record.location {
                                    info = format!("{info} at {at}");
                                }
                                record.origin
                            }
                            None => Origin::capture(),
                        };
                        core.handler_failed(&ctx, HandlerError::panicked(info, origin));
                    }
                }
            })
            .await;
        }
        .boxed()
    }
}

impl fmt::Debug for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Job")
            .field("name", &self.name)
            .field("meta", &self.meta)
            .finish_non_exhaustive()
    }
}
