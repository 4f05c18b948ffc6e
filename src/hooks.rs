//! Interception points evaluated around a dispatch.
//!
//! The chain runs in a fixed order once a 200 response is in hand:
//!
//! 1. the client-wide global filter may reject the raw body,
//! 2. the request's success callback is notified with the raw body,
//! 3. the request's validator may reject the body.
//!
//! The error callback is only invoked for unhandled failures (transport
//! errors and panicking hooks), never for non-200 statuses or rejections.

use crate::Error;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

/// Client-wide predicate over a raw response body. Returning `false` aborts.
pub type ResponseFilter = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// Per-request predicate over a response body. Returning `false` aborts.
pub type ResponseValidator = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// Per-request notification with the raw body of a 200 response.
pub type SuccessCallback = Arc<dyn Fn(&str) + Send + Sync>;

/// Per-request notification for failures that were captured into an envelope.
pub type ErrorCallback = Arc<dyn Fn(&Error) + Send + Sync>;

/// Error message used when the global filter rejects a response.
pub const GLOBAL_FILTER_REJECTION: &str = "Request aborted by user in global filter";

/// Error message used when a request's validator rejects a response.
pub const VALIDATOR_REJECTION: &str = "Request aborted by user in validator()";

/// The optional hooks attached to a single request.
#[derive(Clone, Default)]
pub struct RequestHooks {
    pub(crate) on_success: Option<SuccessCallback>,
    pub(crate) on_unhandled_error: Option<ErrorCallback>,
    pub(crate) validator: Option<ResponseValidator>,
}

impl std::fmt::Debug for RequestHooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestHooks")
            .field("on_success", &self.on_success.is_some())
            .field("on_unhandled_error", &self.on_unhandled_error.is_some())
            .field("validator", &self.validator.is_some())
            .finish()
    }
}

/// Why the chain stopped a response from becoming a success.
#[derive(Debug)]
pub(crate) enum HookOutcome {
    /// Every installed hook accepted the response.
    Accepted,
    /// A filter or validator returned `false`; carries the envelope message.
    Rejected(&'static str),
    /// A hook panicked.
    Panicked(Error),
}

/// The hooks in effect for one dispatch: the client's global filter plus the
/// request's own hooks.
pub(crate) struct HookChain<'a> {
    global_filter: Option<&'a ResponseFilter>,
    hooks: &'a RequestHooks,
}

impl<'a> HookChain<'a> {
    pub(crate) fn new(global_filter: Option<&'a ResponseFilter>, hooks: &'a RequestHooks) -> Self {
        Self {
            global_filter,
            hooks,
        }
    }

    /// Runs filter, success callback and validator against a 200 body.
    pub(crate) fn evaluate(&self, body: &str) -> HookOutcome {
        if let Some(filter) = self.global_filter {
            match guarded("global filter", || filter(body)) {
                Ok(true) => {}
                Ok(false) => return HookOutcome::Rejected(GLOBAL_FILTER_REJECTION),
                Err(e) => return HookOutcome::Panicked(e),
            }
        }

        if let Some(on_success) = &self.hooks.on_success {
            if let Err(e) = guarded("success callback", || on_success(body)) {
                return HookOutcome::Panicked(e);
            }
        }

        if let Some(validator) = &self.hooks.validator {
            match guarded("validator", || validator(body)) {
                Ok(true) => {}
                Ok(false) => return HookOutcome::Rejected(VALIDATOR_REJECTION),
                Err(e) => return HookOutcome::Panicked(e),
            }
        }

        HookOutcome::Accepted
    }

    /// Notifies the error callback, if any. A panic here is logged and dropped.
    pub(crate) fn notify_error(&self, error: &Error) {
        if let Some(on_error) = &self.hooks.on_unhandled_error {
            if let Err(e) = guarded("error callback", || on_error(error)) {
                tracing::warn!(error = %e, "Error callback panicked");
            }
        }
    }
}

/// Runs a user hook, converting a panic into [`Error::HookPanicked`].
fn guarded<R>(name: &str, hook: impl FnOnce() -> R) -> crate::Result<R> {
    catch_unwind(AssertUnwindSafe(hook)).map_err(|payload| {
        let detail = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        Error::HookPanicked(format!("{}: {}", name, detail))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_no_hooks_accepts() {
        let hooks = RequestHooks::default();
        let chain = HookChain::new(None, &hooks);
        assert!(matches!(chain.evaluate("[]"), HookOutcome::Accepted));
    }

    #[test]
    fn test_filter_rejection_skips_callback_and_validator() {
        let calls = Arc::new(AtomicUsize::new(0));
        let success_calls = calls.clone();
        let validator_calls = calls.clone();

        let filter: ResponseFilter = Arc::new(|_: &str| false);
        let hooks = RequestHooks {
            on_success: Some(Arc::new(move |_: &str| {
                success_calls.fetch_add(1, Ordering::SeqCst);
            })),
            on_unhandled_error: None,
            validator: Some(Arc::new(move |_: &str| {
                validator_calls.fetch_add(1, Ordering::SeqCst);
                true
            })),
        };

        let chain = HookChain::new(Some(&filter), &hooks);
        match chain.evaluate("{}") {
            HookOutcome::Rejected(message) => assert_eq!(message, GLOBAL_FILTER_REJECTION),
            other => panic!("Expected rejection, got {:?}", other),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_callback_runs_before_validator_rejection() {
        let seen = Arc::new(AtomicUsize::new(0));
        let seen_clone = seen.clone();

        let hooks = RequestHooks {
            on_success: Some(Arc::new(move |_: &str| {
                seen_clone.fetch_add(1, Ordering::SeqCst);
            })),
            on_unhandled_error: None,
            validator: Some(Arc::new(|body: &str| body.contains("expected"))),
        };

        let chain = HookChain::new(None, &hooks);
        match chain.evaluate("something else") {
            HookOutcome::Rejected(message) => assert_eq!(message, VALIDATOR_REJECTION),
            other => panic!("Expected rejection, got {:?}", other),
        }
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_panicking_validator_is_captured() {
        let hooks = RequestHooks {
            on_success: None,
            on_unhandled_error: None,
            validator: Some(Arc::new(|_: &str| -> bool { panic!("bad payload") })),
        };

        let chain = HookChain::new(None, &hooks);
        match chain.evaluate("{}") {
            HookOutcome::Panicked(Error::HookPanicked(message)) => {
                assert!(message.contains("validator"));
                assert!(message.contains("bad payload"));
            }
            other => panic!("Expected panic capture, got {:?}", other),
        }
    }
}
