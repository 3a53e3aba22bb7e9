//! Driver port - the narrow interface to a live browser session

use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use webbind_core_types::{ElementId, LocatorStrategy, SelectBy, SelectionKind, WindowHandle};

use crate::errors::DriverError;

/// Argument passed to an injected script.
#[derive(Clone, Debug, PartialEq)]
pub enum ScriptArg {
    Element(ElementId),
    Value(Value),
}

impl From<&str> for ScriptArg {
    fn from(value: &str) -> Self {
        ScriptArg::Value(Value::String(value.to_string()))
    }
}

impl From<String> for ScriptArg {
    fn from(value: String) -> Self {
        ScriptArg::Value(Value::String(value))
    }
}

/// Scoped access to one live browser session.
///
/// Implementations must serialize concurrent calls; the engine itself only
/// issues one call at a time per session.
#[async_trait]
pub trait Driver: Send + Sync {
    /// Find a single element, optionally searching beneath `within`.
    async fn find_element(
        &self,
        strategy: LocatorStrategy,
        expression: &str,
        within: Option<&ElementId>,
    ) -> Result<ElementId, DriverError>;

    async fn current_window(&self) -> Result<WindowHandle, DriverError>;

    /// Select a top-level window; this also leaves any selected frame.
    async fn switch_to_window(&self, handle: &WindowHandle) -> Result<(), DriverError>;

    async fn switch_to_frame(&self, frame: &ElementId) -> Result<(), DriverError>;

    async fn tag_name(&self, element: &ElementId) -> Result<String, DriverError>;

    async fn text(&self, element: &ElementId) -> Result<String, DriverError>;

    async fn attribute(
        &self,
        element: &ElementId,
        name: &str,
    ) -> Result<Option<String>, DriverError>;

    async fn send_keys(&self, element: &ElementId, keys: &str) -> Result<(), DriverError>;

    async fn clear(&self, element: &ElementId) -> Result<(), DriverError>;

    async fn click(&self, element: &ElementId) -> Result<(), DriverError>;

    async fn submit(&self, element: &ElementId) -> Result<(), DriverError>;

    async fn is_selected(&self, element: &ElementId) -> Result<bool, DriverError>;

    async fn is_displayed(&self, element: &ElementId) -> Result<bool, DriverError>;

    async fn is_enabled(&self, element: &ElementId) -> Result<bool, DriverError>;

    async fn select_option(&self, element: &ElementId, by: &SelectBy) -> Result<(), DriverError>;

    /// Text or value of the first selected option, if any is selected.
    async fn selected_option(
        &self,
        element: &ElementId,
        kind: SelectionKind,
    ) -> Result<Option<String>, DriverError>;

    async fn execute_script(&self, script: &str, args: &[ScriptArg]) -> Result<Value, DriverError>;

    async fn current_url(&self) -> Result<String, DriverError>;

    async fn navigate_to(&self, url: &str) -> Result<(), DriverError>;
}

/// Key sequence that presses Enter in WebDriver encoding.
pub const ENTER_KEY: &str = "\u{E007}";

/// Located element paired with the session that owns it.
#[derive(Clone)]
pub struct WebElement {
    id: ElementId,
    driver: Arc<dyn Driver>,
}

impl WebElement {
    pub fn new(id: ElementId, driver: Arc<dyn Driver>) -> Self {
        Self { id, driver }
    }

    pub fn id(&self) -> &ElementId {
        &self.id
    }

    pub fn driver(&self) -> &Arc<dyn Driver> {
        &self.driver
    }

    pub async fn tag_name(&self) -> Result<String, DriverError> {
        self.driver.tag_name(&self.id).await
    }

    pub async fn text(&self) -> Result<String, DriverError> {
        self.driver.text(&self.id).await
    }

    pub async fn attribute(&self, name: &str) -> Result<Option<String>, DriverError> {
        self.driver.attribute(&self.id, name).await
    }

    pub async fn send_keys(&self, keys: &str) -> Result<(), DriverError> {
        self.driver.send_keys(&self.id, keys).await
    }

    pub async fn clear(&self) -> Result<(), DriverError> {
        self.driver.clear(&self.id).await
    }

    pub async fn click(&self) -> Result<(), DriverError> {
        self.driver.click(&self.id).await
    }

    pub async fn submit(&self) -> Result<(), DriverError> {
        self.driver.submit(&self.id).await
    }

    pub async fn is_selected(&self) -> Result<bool, DriverError> {
        self.driver.is_selected(&self.id).await
    }

    pub async fn is_displayed(&self) -> Result<bool, DriverError> {
        self.driver.is_displayed(&self.id).await
    }

    pub async fn is_enabled(&self) -> Result<bool, DriverError> {
        self.driver.is_enabled(&self.id).await
    }

    pub async fn is_frame(&self) -> Result<bool, DriverError> {
        let tag = self.tag_name().await?;
        Ok(matches!(tag.to_ascii_lowercase().as_str(), "iframe" | "frame"))
    }

    /// Run `script` with this element bound to `arguments[0]`.
    pub async fn execute(&self, script: &str, mut extra: Vec<ScriptArg>) -> Result<Value, DriverError> {
        let mut args = vec![ScriptArg::Element(self.id.clone())];
        args.append(&mut extra);
        self.driver.execute_script(script, &args).await
    }
}

impl fmt::Debug for WebElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebElement").field("id", &self.id).finish()
    }
}

/// Stringify a script result the way bound values expect it.
pub fn script_value_to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Truthiness of a predicate script result.
pub fn script_value_is_true(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) => s.trim().eq_ignore_ascii_case("true"),
        _ => false,
    }
}
