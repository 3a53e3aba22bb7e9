//! Scoped binding store.
//!
//! Bindings live in a stack of named scopes. The bottom `global` scope is
//! permanent; feature and page scopes are pushed, reset and popped at
//! well-defined lifecycle points by the owning session.

use std::collections::VecDeque;
use std::fmt;

use parking_lot::Mutex;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ScopeError {
    #[error("unbound key: {0}")]
    Unbound(String),
    #[error("no {0} scope on the stack")]
    NoSuchScope(ScopeKind),
    #[error("the global scope cannot be popped")]
    GlobalScope,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum ScopeKind {
    Global,
    Feature,
    Page,
}

impl fmt::Display for ScopeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScopeKind::Global => "global",
            ScopeKind::Feature => "feature",
            ScopeKind::Page => "page",
        };
        f.write_str(name)
    }
}

/// One layer of bindings. Entries are kept most-recently-set first.
#[derive(Clone, Debug, PartialEq)]
pub struct Scope {
    pub kind: ScopeKind,
    pub name: String,
    entries: VecDeque<(String, String)>,
}

impl Scope {
    pub fn new(kind: ScopeKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            entries: VecDeque::new(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    fn set(&mut self, key: &str, value: &str) {
        if let Some(pos) = self.entries.iter().position(|(k, _)| k == key) {
            self.entries.remove(pos);
        }
        self.entries.push_front((key.to_string(), value.to_string()));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Store contract consumed by the resolver, interactor and gate.
pub trait ScopedStore: Send + Sync {
    /// Look a key up through every visible scope, innermost first.
    fn get(&self, key: &str) -> Result<String, ScopeError> {
        self.get_opt(key)
            .ok_or_else(|| ScopeError::Unbound(key.to_string()))
    }

    fn get_opt(&self, key: &str) -> Option<String>;

    /// Bind `key` in the innermost scope.
    fn set(&self, key: &str, value: &str);

    /// Bind `key` in the innermost scope of `kind`, even when inner scopes
    /// sit above it.
    fn set_in(&self, kind: ScopeKind, key: &str, value: &str) -> Result<(), ScopeError>;

    /// Visible entries whose key starts with `prefix`, innermost scope first
    /// and most recently set first within a scope. Shadowed entries of outer
    /// scopes are included after the inner ones.
    fn visible_entries_with_prefix(&self, prefix: &str) -> Vec<(String, String)>;

    fn current_scope(&self) -> (ScopeKind, String);

    fn push_scope(&self, kind: ScopeKind, name: &str);

    /// Pop scopes up to and including the innermost scope of `kind`.
    fn pop_scope(&self, kind: ScopeKind) -> Result<Vec<Scope>, ScopeError>;

    /// Drop every binding of the innermost scope of `kind`.
    fn reset_scope(&self, kind: ScopeKind) -> Result<(), ScopeError>;
}

/// In-memory scope stack guarded by a mutex; one per execution context.
pub struct ScopeStack {
    scopes: Mutex<Vec<Scope>>,
}

impl ScopeStack {
    pub fn new() -> Self {
        Self {
            scopes: Mutex::new(vec![Scope::new(ScopeKind::Global, "global")]),
        }
    }

    /// Number of scopes on the stack, including the global scope.
    pub fn depth(&self) -> usize {
        self.scopes.lock().len()
    }
}

impl Default for ScopeStack {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopedStore for ScopeStack {
    fn get_opt(&self, key: &str) -> Option<String> {
        let scopes = self.scopes.lock();
        scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(key))
            .map(str::to_string)
    }

    fn set(&self, key: &str, value: &str) {
        let mut scopes = self.scopes.lock();
        if let Some(scope) = scopes.last_mut() {
            debug!(scope = %scope.kind, key, "binding value");
            scope.set(key, value);
        }
    }

    fn set_in(&self, kind: ScopeKind, key: &str, value: &str) -> Result<(), ScopeError> {
        let mut scopes = self.scopes.lock();
        let scope = scopes
            .iter_mut()
            .rev()
            .find(|scope| scope.kind == kind)
            .ok_or(ScopeError::NoSuchScope(kind))?;
        debug!(scope = %kind, key, "binding value");
        scope.set(key, value);
        Ok(())
    }

    fn visible_entries_with_prefix(&self, prefix: &str) -> Vec<(String, String)> {
        let scopes = self.scopes.lock();
        scopes
            .iter()
            .rev()
            .flat_map(|scope| scope.entries.iter())
            .filter(|(key, _)| key.starts_with(prefix))
            .cloned()
            .collect()
    }

    fn current_scope(&self) -> (ScopeKind, String) {
        let scopes = self.scopes.lock();
        scopes
            .last()
            .map(|scope| (scope.kind, scope.name.clone()))
            .unwrap_or((ScopeKind::Global, "global".to_string()))
    }

    fn push_scope(&self, kind: ScopeKind, name: &str) {
        debug!(scope = %kind, name, "pushing scope");
        self.scopes.lock().push(Scope::new(kind, name));
    }

    fn pop_scope(&self, kind: ScopeKind) -> Result<Vec<Scope>, ScopeError> {
        if kind == ScopeKind::Global {
            return Err(ScopeError::GlobalScope);
        }
        let mut scopes = self.scopes.lock();
        let pos = scopes
            .iter()
            .rposition(|scope| scope.kind == kind)
            .ok_or(ScopeError::NoSuchScope(kind))?;
        let popped: Vec<Scope> = scopes.drain(pos..).rev().collect();
        debug!(scope = %kind, popped = popped.len(), "popped scopes");
        Ok(popped)
    }

    fn reset_scope(&self, kind: ScopeKind) -> Result<(), ScopeError> {
        let mut scopes = self.scopes.lock();
        let scope = scopes
            .iter_mut()
            .rev()
            .find(|scope| scope.kind == kind)
            .ok_or(ScopeError::NoSuchScope(kind))?;
        debug!(scope = %kind, cleared = scope.len(), "resetting scope");
        scope.entries.clear();
        Ok(())
    }
}
