//! # Listener Callback Surface
//!
//! Synchronous callback traits for registry change notification, plus the
//! dispatch bookkeeping used to isolate and aggregate per-listener failures.
//!
//! Notifications are direct same-thread calls from the mutator into each
//! listener. A failing listener is logged and skipped; it never aborts the
//! fan-out or the mutation that triggered it.

use crate::properties::ServiceProperties;

/// Result type for listener callbacks. Errors are caught and isolated by the
/// dispatching side.
pub type CallbackResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// Consumer of property-change and removal events for tracked registries
pub trait RegistryPropertyListener: Send + Sync {
    /// A tracked registry's properties were overwritten with a new snapshot
    fn on_properties_changed(
        &self,
        service_id: u64,
        display_name: &str,
        properties: &ServiceProperties,
    ) -> CallbackResult;

    /// A tracked registry disappeared; its snapshot and all subscriptions for
    /// its id are gone by the time this returns
    fn on_service_removed(&self, service_id: u64, display_name: &str) -> CallbackResult;

    /// Get listener name for diagnostics
    fn listener_name(&self) -> &str {
        "unnamed_listener"
    }
}

/// One listener's failure during a fan-out, kept for diagnostics
#[derive(Debug, Clone, thiserror::Error)]
#[error("listener '{listener}' failed handling {event} for service {service_id}: {message}")]
pub struct DispatchFailure {
    pub listener: String,
    pub event: String,
    pub service_id: u64,
    pub message: String,
}

/// Outcome of one synchronous fan-out: how many listeners were invoked and
/// which of them failed
#[derive(Debug, Clone, Default)]
pub struct DispatchOutcome {
    pub notified: usize,
    pub failures: Vec<DispatchFailure>,
}

impl DispatchOutcome {
    pub fn record_success(&mut self) {
        self.notified += 1;
    }

    pub fn record_failure(&mut self, failure: DispatchFailure) {
        self.notified += 1;
        self.failures.push(failure);
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_accounting() {
        let mut outcome = DispatchOutcome::default();
        outcome.record_success();
        outcome.record_failure(DispatchFailure {
            listener: "l".to_string(),
            event: "properties_changed".to_string(),
            service_id: 7,
            message: "boom".to_string(),
        });

        assert_eq!(outcome.notified, 2);
        assert_eq!(outcome.failed(), 1);
        assert!(!outcome.is_clean());
    }

    #[test]
    fn test_failure_display() {
        let failure = DispatchFailure {
            listener: "monitor".to_string(),
            event: "service_removed".to_string(),
            service_id: 42,
            message: "disconnected".to_string(),
        };
        let rendered = failure.to_string();
        assert!(rendered.contains("monitor"));
        assert!(rendered.contains("42"));
    }
}
