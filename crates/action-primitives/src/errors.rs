//! Error types for action primitives

use thiserror::Error;

/// Errors reported by a [`crate::Driver`] implementation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DriverError {
    /// Element reference is no longer attached to the DOM
    #[error("stale element reference: {0}")]
    StaleElement(String),

    /// No element matched the locator
    #[error("no such element: {0}")]
    NoSuchElement(String),

    /// Element exists but cannot be interacted with right now
    #[error("element not interactable: {0}")]
    NotInteractable(String),

    /// The page navigated or reloaded while the command ran
    #[error("navigation in progress: {0}")]
    Navigating(String),

    #[error("no such window: {0}")]
    NoSuchWindow(String),

    /// Script raised or returned an unusable value
    #[error("javascript error: {0}")]
    JavaScript(String),

    /// Session is gone or the wire protocol failed
    #[error("session error: {0}")]
    Session(String),
}

impl DriverError {
    /// Transient errors are worth one more attempt against a fresh lookup.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            DriverError::StaleElement(_)
                | DriverError::NoSuchElement(_)
                | DriverError::NotInteractable(_)
                | DriverError::Navigating(_)
        )
    }
}

/// Comprehensive error types for interaction and wait operations
#[derive(Debug, Error, Clone)]
pub enum ActionError {
    /// Driver call failed
    #[error("Driver error: {0}")]
    Driver(#[from] DriverError),

    /// Wait budget exhausted
    #[error("Timed out after {timeout_ms}ms waiting for {reason}{}", last_cause(.cause))]
    HardTimeout {
        reason: String,
        timeout_ms: u64,
        cause: Option<String>,
    },

    /// Element was located but failed the requested operation
    #[error("Element '{element}' rejected {operation}: {reason}")]
    Rejected {
        element: String,
        operation: String,
        reason: String,
    },

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

fn last_cause(cause: &Option<String>) -> String {
    cause
        .as_ref()
        .map(|c| format!(" (last error: {})", c))
        .unwrap_or_default()
}

impl ActionError {
    pub fn timeout(reason: impl Into<String>, timeout_ms: u64, cause: Option<String>) -> Self {
        ActionError::HardTimeout {
            reason: reason.into(),
            timeout_ms,
            cause,
        }
    }

    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(self, ActionError::Driver(err) if err.is_transient())
    }

    /// Element could not be found even after the retry.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ActionError::Driver(DriverError::NoSuchElement(_)))
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, ActionError::HardTimeout { .. })
    }

    /// Get error severity level (0=low, 1=medium, 2=high, 3=critical)
    pub fn severity(&self) -> u8 {
        match self {
            ActionError::Internal(_) => 3,
            ActionError::Driver(DriverError::Session(_)) | ActionError::HardTimeout { .. } => 2,
            ActionError::Driver(err) if !err.is_transient() => 2,
            ActionError::Rejected { .. } => 1,
            _ => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_driver_errors_are_retryable() {
        let stale: ActionError = DriverError::StaleElement("q".into()).into();
        let session: ActionError = DriverError::Session("closed".into()).into();
        assert!(stale.is_retryable());
        assert!(!session.is_retryable());
        assert!(!ActionError::timeout("ready", 100, None).is_retryable());
    }

    #[test]
    fn timeout_message_carries_last_cause() {
        let err = ActionError::timeout("q displayed", 2000, Some("stale element".into()));
        assert_eq!(
            err.to_string(),
            "Timed out after 2000ms waiting for q displayed (last error: stale element)"
        );
        assert_eq!(err.severity(), 2);
    }
}
