//! Error types used by controllers and their handlers.
//!
//! This module defines two enums:
//!
//! - [`HandlerError`]: failures raised by a handler passed to
//!   [`Controller::handle`](crate::Controller::handle). They are captured by the
//!   dispatch core and routed to the error hook and the observer; they never
//!   reach the caller of `handle`.
//! - [`Violation`]: contract violations by calling code (use after dispose,
//!   double dispose, ...). Reported according to the configured
//!   [`ViolationPolicy`](crate::ViolationPolicy).
//!
//! Both types provide `as_label` for logs/metrics.

use std::any::Any;
use std::backtrace::Backtrace;
use std::fmt::{self, Display};
use std::sync::Arc;

use thiserror::Error;

/// Stack trace of the place where a handler failure originated.
///
/// Either captured directly (by [`HandlerError::fail`] or when a handler
/// panics) or borrowed from the [`anyhow::Error`] the failure was converted
/// from. Capturing follows the usual `RUST_BACKTRACE` / `RUST_LIB_BACKTRACE`
/// switches.
#[derive(Clone)]
pub struct Origin(Source);

#[derive(Clone)]
enum Source {
    Captured(Arc<Backtrace>),
    Anyhow(Arc<anyhow::Error>),
}

impl Origin {
    /// Captures the current stack.
    pub fn capture() -> Self {
        Self::from_backtrace(Backtrace::capture())
    }

    pub(crate) fn from_backtrace(backtrace: Backtrace) -> Self {
        Self(Source::Captured(Arc::new(backtrace)))
    }

    /// The origin stack trace (possibly disabled or unsupported).
    pub fn backtrace(&self) -> &Backtrace {
        match &self.0 {
            Source::Captured(bt) => bt,
            Source::Anyhow(err) => err.backtrace(),
        }
    }
}

impl fmt::Debug for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Origin")
            .field(&self.backtrace().status())
            .finish()
    }
}

/// # Errors produced by handler execution.
///
/// A handler fails either by returning `Err` or by panicking; panics are caught
/// at the dispatch boundary and converted into [`HandlerError::Panicked`].
/// Both variants carry the [`Origin`] of the failure, which is what the error
/// hook and [`Observer::on_error`](crate::Observer::on_error) receive as the
/// stack trace.
///
/// Equality compares kind and message only.
#[non_exhaustive]
#[derive(Error, Debug, Clone)]
pub enum HandlerError {
    /// Handler returned an error.
    #[error("handler failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
        /// Where the error was created.
        origin: Origin,
    },

    /// Handler panicked while running.
    #[error("handler panicked: {info}")]
    Panicked {
        /// Panic payload rendered as text, with the panic location when known.
        info: String,
        /// Where the panic was raised.
        origin: Origin,
    },
}

impl HandlerError {
    /// Builds a [`HandlerError::Fail`] from anything printable, capturing the
    /// caller's stack as its origin.
    ///
    /// # Example
    /// ```
    /// use statevisor::HandlerError;
    ///
    /// let err = HandlerError::fail("connection refused");
    /// assert_eq!(err.to_string(), "handler failed: connection refused");
    /// ```
    pub fn fail(error: impl Display) -> Self {
        HandlerError::Fail {
            error: error.to_string(),
            origin: Origin::capture(),
        }
    }

    pub(crate) fn panicked(info: String, origin: Origin) -> Self {
        HandlerError::Panicked { info, origin }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use statevisor::HandlerError;
    ///
    /// assert_eq!(HandlerError::fail("boom").as_label(), "handler_failed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            HandlerError::Fail { .. } => "handler_failed",
            HandlerError::Panicked { .. } => "handler_panicked",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            HandlerError::Fail { error, .. } => format!("error: {error}"),
            HandlerError::Panicked { info, .. } => format!("panic: {info}"),
        }
    }

    /// Where the failure originated.
    pub fn origin(&self) -> &Origin {
        match self {
            HandlerError::Fail { origin, .. } | HandlerError::Panicked { origin, .. } => origin,
        }
    }

    /// Stack trace of the failure origin.
    pub fn backtrace(&self) -> &Backtrace {
        self.origin().backtrace()
    }
}

impl PartialEq for HandlerError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (HandlerError::Fail { error: a, .. }, HandlerError::Fail { error: b, .. }) => a == b,
            (HandlerError::Panicked { info: a, .. }, HandlerError::Panicked { info: b, .. }) => {
                a == b
            }
            _ => false,
        }
    }
}

impl Eq for HandlerError {}

/// Keeps the whole context chain as the message and the error's own
/// backtrace as the origin.
impl From<anyhow::Error> for HandlerError {
    fn from(err: anyhow::Error) -> Self {
        HandlerError::Fail {
            error: format!("{err:#}"),
            origin: Origin(Source::Anyhow(Arc::new(err))),
        }
    }
}

/// # Contract violations by calling code.
///
/// These "should never happen" in correct code. They are always logged and
/// reported to [`Observer::on_violation`](crate::Observer::on_violation); whether
/// the offending call then panics is decided by
/// [`ViolationPolicy`](crate::ViolationPolicy).
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Violation {
    /// `handle` was called after `dispose`.
    #[error("handle() called on a disposed controller")]
    UseAfterDispose,

    /// `dispose` was called more than once.
    #[error("dispose() called on an already disposed controller")]
    DoubleDispose,

    /// `add_listener` was called after `dispose`.
    #[error("add_listener() called on a disposed controller")]
    ListenerAfterDispose,

    /// `notify_listeners` was called after `dispose`.
    #[error("notify_listeners() called on a disposed controller")]
    NotifyAfterDispose,
}

impl Violation {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use statevisor::Violation;
    ///
    /// assert_eq!(Violation::DoubleDispose.as_label(), "double_dispose");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            Violation::UseAfterDispose => "use_after_dispose",
            Violation::DoubleDispose => "double_dispose",
            Violation::ListenerAfterDispose => "listener_after_dispose",
            Violation::NotifyAfterDispose => "notify_after_dispose",
        }
    }
}

/// Renders a panic payload (`&str` or `String`, the common cases) as text.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
