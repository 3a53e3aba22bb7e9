//! webbind - attribute binding and resilient element interaction for
//! declarative browser tests
//!
//! A [`WebSession`] ties together one browser session and one binding
//! store. Steps name elements and values; the session resolves how to find
//! them, performs interactions with one retry on transient driver errors,
//! binds results back into scope and honours post-action waits.

pub mod config;
pub mod errors;
pub mod logging;
pub mod session;

pub use config::{load_settings, ConfigError, LoadedSettings, Settings};
pub use errors::WebbindError;
pub use logging::init_logging;
pub use session::{WebSession, WebSessionBuilder};

pub use action_gate::{BindAndWait, GateError};
pub use action_locator::{
    BindingError, BindingResolver, DefaultEvaluators, DefaultResolver, EnvDefaults, EvalError,
    Evaluators, NoDefaults, TargetType,
};
pub use action_primitives::{
    ActionError, Driver, DriverError, ElementInteractor, ScreenshotPort, ScriptArg, WaitEngine,
    WebElement,
};
pub use webbind_core_types::{
    keys, ElementId, ElementState, LocatorBinding, LocatorStrategy, SelectBy, SelectionKind,
    WindowHandle, CURRENT_URL,
};
pub use webbind_scope_store::{ScopeKind, ScopeStack, ScopedStore};

#[cfg(feature = "test-util")]
pub use action_primitives::fake;
