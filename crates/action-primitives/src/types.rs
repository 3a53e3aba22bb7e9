//! Policy views consumed by the interactor and the wait engine

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Interaction behaviour derived from process settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionPolicy {
    /// Capture a screenshot after every successful named action
    pub capture_screenshots: bool,

    /// Inline CSS applied while an element is highlighted
    pub highlight_style: String,

    /// How long a highlight stays visible (milliseconds)
    pub highlight_ms: u64,

    /// Pause after script-driven actions such as scrolling (milliseconds)
    pub throttle_ms: u64,
}

impl InteractionPolicy {
    pub fn highlight_duration(&self) -> Duration {
        Duration::from_millis(self.highlight_ms)
    }

    pub fn throttle(&self) -> Duration {
        Duration::from_millis(self.throttle_ms)
    }
}

impl Default for InteractionPolicy {
    fn default() -> Self {
        Self {
            capture_screenshots: false,
            highlight_style: "background: yellow; border: 2px solid gold;".to_string(),
            highlight_ms: 0,
            throttle_ms: 200,
        }
    }
}

/// Timing knobs for [`crate::WaitEngine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitPolicy {
    /// Budget used when a caller does not supply one (milliseconds)
    pub default_timeout_ms: u64,

    /// Sleep between retries after a transient failure (milliseconds)
    pub throttle_ms: u64,

    /// Interval between condition evaluations inside one attempt (milliseconds)
    pub poll_interval_ms: u64,
}

impl WaitPolicy {
    pub fn default_timeout(&self) -> Duration {
        Duration::from_millis(self.default_timeout_ms)
    }

    pub fn throttle(&self) -> Duration {
        Duration::from_millis(self.throttle_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self {
            default_timeout_ms: 10_000,
            throttle_ms: 200,
            poll_interval_ms: 250,
        }
    }
}
