//! Error types for binding resolution

use action_primitives::{ActionError, DriverError};
use thiserror::Error;

/// Failure to resolve a locator or attribute binding.
#[derive(Debug, Error, Clone)]
pub enum BindingError {
    /// `<element>/locator` or `<element>/locator/<strategy>` is not bound
    #[error("Locator binding not found for '{element}': {key} is not bound")]
    LocatorBindingNotFound { element: String, key: String },

    /// No value could be resolved through any source
    #[error("Unbound attribute: {0}")]
    UnboundAttribute(String),

    /// A file binding points at a missing file
    #[error("Resource not found for '{name}': {path}")]
    ResourceNotFound { name: String, path: String },

    /// Nested resolution went deeper than the configured limit
    #[error("Binding depth limit of {limit} exceeded while resolving '{name}'")]
    InterpolationDepthExceeded { name: String, limit: usize },

    /// An evaluator rejected the bound expression
    #[error("Failed to evaluate {kind} binding of '{name}': {reason}")]
    Evaluation {
        name: String,
        kind: String,
        reason: String,
    },

    /// Live element interaction failed
    #[error(transparent)]
    Action(#[from] ActionError),
}

impl BindingError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, BindingError::Action(err) if err.is_retryable())
    }

    pub fn is_unbound(&self) -> bool {
        matches!(
            self,
            BindingError::UnboundAttribute(_) | BindingError::LocatorBindingNotFound { .. }
        )
    }

    /// Get error severity (0=low, 1=medium, 2=high, 3=critical)
    pub fn severity(&self) -> u8 {
        match self {
            BindingError::Action(err) => err.severity(),
            BindingError::InterpolationDepthExceeded { .. } => 3,
            BindingError::ResourceNotFound { .. } | BindingError::Evaluation { .. } => 2,
            BindingError::LocatorBindingNotFound { .. } | BindingError::UnboundAttribute(_) => 1,
        }
    }
}

/// Failure reported by an [`crate::Evaluators`] implementation.
#[derive(Debug, Error, Clone)]
pub enum EvalError {
    #[error("{0}")]
    Failed(String),

    #[error("file not found: {0}")]
    FileNotFound(String),

    #[error(transparent)]
    Action(#[from] ActionError),
}

impl From<DriverError> for EvalError {
    fn from(err: DriverError) -> Self {
        EvalError::Action(err.into())
    }
}

impl EvalError {
    /// Attach the binding name and kind this evaluation belonged to.
    pub fn for_binding(self, name: &str, kind: &str) -> BindingError {
        match self {
            EvalError::Failed(reason) => BindingError::Evaluation {
                name: name.to_string(),
                kind: kind.to_string(),
                reason,
            },
            EvalError::FileNotFound(path) => BindingError::ResourceNotFound {
                name: name.to_string(),
                path,
            },
            EvalError::Action(err) => BindingError::Action(err),
        }
    }
}
