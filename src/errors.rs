//! Error handling module

use action_gate::GateError;
use action_locator::BindingError;
use action_primitives::ActionError;
use thiserror::Error;
use webbind_core_types::ParseError;
use webbind_scope_store::ScopeError;

use crate::config::ConfigError;

/// Step-level failure reported by a [`crate::WebSession`] operation.
#[derive(Debug, Error)]
pub enum WebbindError {
    #[error(transparent)]
    Binding(#[from] BindingError),

    #[error(transparent)]
    Action(#[from] ActionError),

    #[error(transparent)]
    Gate(#[from] GateError),

    #[error(transparent)]
    Scope(#[from] ScopeError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl WebbindError {
    /// Wait budget ran out.
    pub fn is_timeout(&self) -> bool {
        match self {
            WebbindError::Action(err) => err.is_timeout(),
            WebbindError::Gate(GateError::Action(err)) => err.is_timeout(),
            WebbindError::Binding(BindingError::Action(err)) => err.is_timeout(),
            _ => false,
        }
    }

    /// No locator or value is bound for the name.
    pub fn is_unbound(&self) -> bool {
        matches!(self, WebbindError::Binding(err) if err.is_unbound())
    }

    /// Get error severity (0=low, 1=medium, 2=high, 3=critical)
    pub fn severity(&self) -> u8 {
        match self {
            WebbindError::Binding(err) => err.severity(),
            WebbindError::Action(err) => err.severity(),
            WebbindError::Gate(err) => err.severity(),
            WebbindError::Scope(_) | WebbindError::Parse(_) => 1,
            WebbindError::Config(_) => 2,
        }
    }
}
