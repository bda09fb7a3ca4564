//! # Controller configuration.
//!
//! Provides [`ControllerConfig`], the per-instance settings consumed by
//! [`ControllerBuilder`](crate::ControllerBuilder), and [`ViolationPolicy`],
//! which decides how contract violations are surfaced.
//!
//! ## Defaults
//! - `label = None` → the state type name is used
//! - `default_handler_name = "anonymous"`
//! - `violation_policy = Panic` in debug builds, `Ignore` in release builds

use std::borrow::Cow;

/// How a contract violation (see [`Violation`](crate::Violation)) is surfaced
/// after it has been logged and reported to the observer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViolationPolicy {
    /// Panic at the offending call site (fail fast).
    Panic,

    /// Degrade to a no-op; the violation is only logged and observed.
    Ignore,
}

impl Default for ViolationPolicy {
    /// `Panic` when `debug_assertions` are enabled, `Ignore` otherwise.
    fn default() -> Self {
        if cfg!(debug_assertions) {
            ViolationPolicy::Panic
        } else {
            ViolationPolicy::Ignore
        }
    }
}

/// Configuration for a single controller instance.
///
/// ## Field semantics
/// - `label`: name used in logs, the registry and observer events (`None` = state type name)
/// - `default_handler_name`: context name for handlers submitted without one
/// - `violation_policy`: fail-fast or no-op on contract violations
#[derive(Clone, Debug)]
pub struct ControllerConfig {
    /// Human-readable label for the controller.
    pub label: Option<Cow<'static, str>>,

    /// Name given to the [`Context`](crate::Context) of unnamed handlers.
    pub default_handler_name: Cow<'static, str>,

    /// What happens after a contract violation has been reported.
    pub violation_policy: ViolationPolicy,
}

impl ControllerConfig {
    /// Returns the configured label, or `fallback` when none is set.
    #[inline]
    pub fn label_or(&self, fallback: &'static str) -> &str {
        self.label.as_deref().unwrap_or(fallback)
    }
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            label: None,
            default_handler_name: Cow::Borrowed("anonymous"),
            violation_policy: ViolationPolicy::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_falls_back_when_unset() {
        let mut cfg = ControllerConfig::default();
        assert_eq!(cfg.label_or("counter::State"), "counter::State");

        cfg.label = Some("cart".into());
        assert_eq!(cfg.label_or("counter::State"), "cart");
    }

    #[test]
    fn violation_policy_follows_build_profile() {
        let expected = if cfg!(debug_assertions) {
            ViolationPolicy::Panic
        } else {
            ViolationPolicy::Ignore
        };
        assert_eq!(ControllerConfig::default().violation_policy, expected);
    }
}
