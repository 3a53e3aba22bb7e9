//! Error types for the post-action gate

use action_primitives::ActionError;
use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum GateError {
    /// Condition wait or driver call failed
    #[error(transparent)]
    Action(#[from] ActionError),

    /// `<element>/<action>/wait` is not a number of seconds
    #[error("Invalid wait '{value}' bound at {key}")]
    InvalidWait { key: String, value: String },

    /// `<element>/<action>/condition` names a condition with no script
    #[error("Condition '{condition}' has no script bound at {key}")]
    ConditionNotBound { condition: String, key: String },
}

impl GateError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, GateError::Action(err) if err.is_retryable())
    }

    /// Get error severity (0=low, 1=medium, 2=high, 3=critical)
    pub fn severity(&self) -> u8 {
        match self {
            GateError::Action(err) => err.severity(),
            GateError::InvalidWait { .. } | GateError::ConditionNotBound { .. } => 2,
        }
    }
}
