//! Origin capture for handler panics.
//!
//! `catch_unwind` only hands back the payload; the location and stack of the
//! panic are gone by then. A process-wide panic hook, installed on first use,
//! records both for panics raised while a handler [`Context`] is active and
//! then chains to the previously installed hook. [`Job::run`](super::Job::run)
//! takes the record right after `catch_unwind` returns, on the same thread.
//!
//! If an application replaces the hook later, handler panics fall back to a
//! stack captured at the catch site.

use std::backtrace::Backtrace;
use std::cell::RefCell;
use std::sync::Once;

use crate::context::Context;
use crate::error::Origin;

/// Location and stack of the last handler panic on this thread.
pub(crate) struct PanicRecord {
    pub location: Option<String>,
    pub origin: Origin,
}

thread_local! {
    static LAST: RefCell<Option<PanicRecord>> = const { RefCell::new(None) };
}

static INSTALL: Once = Once::new();

pub(crate) fn install() {
    INSTALL.call_once(|| {
        let previous = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            if Context::current().is_some() {
                let record = PanicRecord {
                    location: info.location().map(ToString::to_string),
                    origin: Origin::from_backtrace(Backtrace::capture()),
                };
                LAST.with(|slot| *slot.borrow_mut() = Some(record));
            }
            previous(info);
        }));
    });
}

/// Takes the record left by the hook, if any.
pub(crate) fn take() -> Option<PanicRecord> {
    LAST.with(|slot| slot.borrow_mut().take())
}
