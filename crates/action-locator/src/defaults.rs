//! Fallback sources consulted when no binding is in scope

use std::collections::HashMap;
use tracing::debug;

/// Base-level values looked up after the scope scan finds nothing.
pub trait DefaultResolver: Send + Sync {
    fn resolve(&self, name: &str) -> Option<String>;
}

/// Resolver that never supplies a value.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDefaults;

impl DefaultResolver for NoDefaults {
    fn resolve(&self, _name: &str) -> Option<String> {
        None
    }
}

/// Configured base properties, then process environment variables.
#[derive(Debug, Clone, Default)]
pub struct EnvDefaults {
    properties: HashMap<String, String>,
}

impl EnvDefaults {
    pub fn new(properties: HashMap<String, String>) -> Self {
        Self { properties }
    }

    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }
}

fn valid_env_name(name: &str) -> bool {
    !name.is_empty() && !name.contains(['=', '\0'])
}

impl DefaultResolver for EnvDefaults {
    fn resolve(&self, name: &str) -> Option<String> {
        if let Some(value) = self.properties.get(name) {
            debug!(name, "resolved from base properties");
            return Some(value.clone());
        }
        if !valid_env_name(name) {
            return None;
        }
        let value = std::env::var(name).ok()?;
        debug!(name, "resolved from environment");
        Some(value)
    }
}
