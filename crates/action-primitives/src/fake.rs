//! In-memory driver for tests
//!
//! Elements are registered up front with the locator that finds them.
//! Failures can be queued per operation name and script results can be
//! scripted by fragment, so retry and wait behaviour is deterministic.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use webbind_core_types::{ElementId, LocatorStrategy, SelectBy, SelectionKind, WindowHandle};

use crate::driver::{Driver, ScriptArg, ENTER_KEY};
use crate::errors::DriverError;

#[derive(Debug, Clone)]
struct FakeElement {
    id: ElementId,
    strategy: LocatorStrategy,
    expression: String,
    parent: Option<ElementId>,
    tag: String,
    text: String,
    attributes: HashMap<String, String>,
    displayed: bool,
    enabled: bool,
    selected: bool,
    options: Vec<(String, String)>,
    selected_option: Option<usize>,
    removed: bool,
}

#[derive(Debug)]
struct ScriptRule {
    fragment: String,
    results: VecDeque<Value>,
    last: Value,
}

#[derive(Debug, Default)]
struct FakeState {
    elements: Vec<FakeElement>,
    failures: HashMap<String, VecDeque<DriverError>>,
    calls: Vec<String>,
    scripts: Vec<(String, Vec<ScriptArg>)>,
    rules: Vec<ScriptRule>,
    url: String,
    window: String,
    frame: Option<ElementId>,
}

/// Deterministic stand-in for a browser session.
#[derive(Debug)]
pub struct FakeDriver {
    state: Mutex<FakeState>,
}

impl Default for FakeDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeDriver {
    pub fn new() -> Self {
        let state = FakeState {
            url: "about:blank".to_string(),
            window: "main".to_string(),
            ..FakeState::default()
        };
        Self {
            state: Mutex::new(state),
        }
    }

    /// Register a top-level element found by `strategy`/`expression`.
    pub fn add_element(&self, strategy: LocatorStrategy, expression: &str, tag: &str) -> ElementId {
        self.insert(None, strategy, expression, tag)
    }

    /// Register an element that is only found when searching within `parent`.
    pub fn add_child(
        &self,
        parent: &ElementId,
        strategy: LocatorStrategy,
        expression: &str,
        tag: &str,
    ) -> ElementId {
        self.insert(Some(parent.clone()), strategy, expression, tag)
    }

    fn insert(
        &self,
        parent: Option<ElementId>,
        strategy: LocatorStrategy,
        expression: &str,
        tag: &str,
    ) -> ElementId {
        let mut state = self.state.lock();
        let id = ElementId(format!("el-{}", state.elements.len() + 1));
        state.elements.push(FakeElement {
            id: id.clone(),
            strategy,
            expression: expression.to_string(),
            parent,
            tag: tag.to_string(),
            text: String::new(),
            attributes: HashMap::new(),
            displayed: true,
            enabled: true,
            selected: false,
            options: Vec::new(),
            selected_option: None,
            removed: false,
        });
        id
    }

    fn update(&self, id: &ElementId, f: impl FnOnce(&mut FakeElement)) {
        let mut state = self.state.lock();
        if let Some(el) = state.elements.iter_mut().find(|el| &el.id == id) {
            f(el);
        }
    }

    pub fn set_text(&self, id: &ElementId, text: &str) {
        self.update(id, |el| el.text = text.to_string());
    }

    pub fn set_attribute(&self, id: &ElementId, name: &str, value: &str) {
        self.update(id, |el| {
            el.attributes.insert(name.to_string(), value.to_string());
        });
    }

    pub fn set_displayed(&self, id: &ElementId, displayed: bool) {
        self.update(id, |el| el.displayed = displayed);
    }

    pub fn set_enabled(&self, id: &ElementId, enabled: bool) {
        self.update(id, |el| el.enabled = enabled);
    }

    pub fn set_selected(&self, id: &ElementId, selected: bool) {
        self.update(id, |el| el.selected = selected);
    }

    pub fn add_option(&self, id: &ElementId, text: &str, value: &str) {
        self.update(id, |el| el.options.push((text.to_string(), value.to_string())));
    }

    /// Detach the element: lookups miss it and held references go stale.
    pub fn remove_element(&self, id: &ElementId) {
        self.update(id, |el| el.removed = true);
    }

    pub fn value_of(&self, id: &ElementId) -> Option<String> {
        let state = self.state.lock();
        state
            .elements
            .iter()
            .find(|el| &el.id == id)
            .and_then(|el| el.attributes.get("value").cloned())
    }

    pub fn is_selected_now(&self, id: &ElementId) -> bool {
        let state = self.state.lock();
        state.elements.iter().any(|el| &el.id == id && el.selected)
    }

    /// Queue an error returned by the next call of `op`.
    pub fn fail_next(&self, op: &str, err: DriverError) {
        self.state
            .lock()
            .failures
            .entry(op.to_string())
            .or_default()
            .push_back(err);
    }

    /// Scripts containing `fragment` return `values` in order, repeating the last.
    pub fn on_script(&self, fragment: &str, values: Vec<Value>) {
        let mut results: VecDeque<Value> = values.into();
        let last = results.back().cloned().unwrap_or(Value::Null);
        if results.len() == 1 {
            results.clear();
        }
        self.state.lock().rules.push(ScriptRule {
            fragment: fragment.to_string(),
            results,
            last,
        });
    }

    pub fn set_url(&self, url: &str) {
        self.state.lock().url = url.to_string();
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().calls.clone()
    }

    pub fn count_calls(&self, op: &str) -> usize {
        self.state.lock().calls.iter().filter(|c| *c == op).count()
    }

    pub fn scripts(&self) -> Vec<String> {
        self.state
            .lock()
            .scripts
            .iter()
            .map(|(script, _)| script.clone())
            .collect()
    }

    pub fn script_args(&self) -> Vec<Vec<ScriptArg>> {
        self.state
            .lock()
            .scripts
            .iter()
            .map(|(_, args)| args.clone())
            .collect()
    }

    pub fn active_frame(&self) -> Option<ElementId> {
        self.state.lock().frame.clone()
    }

    fn enter(&self, op: &str) -> Result<(), DriverError> {
        let mut state = self.state.lock();
        state.calls.push(op.to_string());
        match state.failures.get_mut(op).and_then(|q| q.pop_front()) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn with_element<T>(
        &self,
        op: &str,
        id: &ElementId,
        f: impl FnOnce(&mut FakeElement) -> Result<T, DriverError>,
    ) -> Result<T, DriverError> {
        self.enter(op)?;
        let mut state = self.state.lock();
        match state.elements.iter_mut().find(|el| &el.id == id) {
            Some(el) if !el.removed => f(el),
            _ => Err(DriverError::StaleElement(id.0.clone())),
        }
    }
}

fn is_checkable(el: &FakeElement) -> bool {
    matches!(
        el.attributes.get("type").map(String::as_str),
        Some("checkbox") | Some("radio")
    )
}

#[async_trait]
impl Driver for FakeDriver {
    async fn find_element(
        &self,
        strategy: LocatorStrategy,
        expression: &str,
        within: Option<&ElementId>,
    ) -> Result<ElementId, DriverError> {
        self.enter("find_element")?;
        let state = self.state.lock();
        state
            .elements
            .iter()
            .find(|el| {
                !el.removed
                    && el.strategy == strategy
                    && el.expression == expression
                    && el.parent.as_ref() == within
            })
            .map(|el| el.id.clone())
            .ok_or_else(|| DriverError::NoSuchElement(format!("{}: {}", strategy, expression)))
    }

    async fn current_window(&self) -> Result<WindowHandle, DriverError> {
        self.enter("current_window")?;
        Ok(WindowHandle(self.state.lock().window.clone()))
    }

    async fn switch_to_window(&self, handle: &WindowHandle) -> Result<(), DriverError> {
        self.enter("switch_to_window")?;
        let mut state = self.state.lock();
        state.window = handle.0.clone();
        state.frame = None;
        Ok(())
    }

    async fn switch_to_frame(&self, frame: &ElementId) -> Result<(), DriverError> {
        self.enter("switch_to_frame")?;
        self.state.lock().frame = Some(frame.clone());
        Ok(())
    }

    async fn tag_name(&self, element: &ElementId) -> Result<String, DriverError> {
        self.with_element("tag_name", element, |el| Ok(el.tag.clone()))
    }

    async fn text(&self, element: &ElementId) -> Result<String, DriverError> {
        self.with_element("text", element, |el| Ok(el.text.clone()))
    }

    async fn attribute(
        &self,
        element: &ElementId,
        name: &str,
    ) -> Result<Option<String>, DriverError> {
        self.with_element("attribute", element, |el| Ok(el.attributes.get(name).cloned()))
    }

    async fn send_keys(&self, element: &ElementId, keys: &str) -> Result<(), DriverError> {
        self.with_element("send_keys", element, |el| {
            if !el.enabled {
                return Err(DriverError::NotInteractable(el.id.0.clone()));
            }
            let typed = keys.replace(ENTER_KEY, "");
            el.attributes.entry("value".to_string()).or_default().push_str(&typed);
            Ok(())
        })
    }

    async fn clear(&self, element: &ElementId) -> Result<(), DriverError> {
        self.with_element("clear", element, |el| {
            el.attributes.insert("value".to_string(), String::new());
            Ok(())
        })
    }

    async fn click(&self, element: &ElementId) -> Result<(), DriverError> {
        self.with_element("click", element, |el| {
            if !el.displayed || !el.enabled {
                return Err(DriverError::NotInteractable(el.id.0.clone()));
            }
            if is_checkable(el) {
                el.selected = !el.selected;
            }
            Ok(())
        })
    }

    async fn submit(&self, element: &ElementId) -> Result<(), DriverError> {
        self.with_element("submit", element, |_| Ok(()))
    }

    async fn is_selected(&self, element: &ElementId) -> Result<bool, DriverError> {
        self.with_element("is_selected", element, |el| Ok(el.selected))
    }

    async fn is_displayed(&self, element: &ElementId) -> Result<bool, DriverError> {
        self.with_element("is_displayed", element, |el| Ok(el.displayed))
    }

    async fn is_enabled(&self, element: &ElementId) -> Result<bool, DriverError> {
        self.with_element("is_enabled", element, |el| Ok(el.enabled))
    }

    async fn select_option(&self, element: &ElementId, by: &SelectBy) -> Result<(), DriverError> {
        self.with_element("select_option", element, |el| {
            let index = match by {
                SelectBy::Text(text) => el.options.iter().position(|(t, _)| t == text),
                SelectBy::Value(value) => el.options.iter().position(|(_, v)| v == value),
                SelectBy::Index(index) => (*index < el.options.len()).then_some(*index),
            };
            match index {
                Some(index) => {
                    el.selected_option = Some(index);
                    Ok(())
                }
                None => Err(DriverError::NoSuchElement(format!("option {:?}", by))),
            }
        })
    }

    async fn selected_option(
        &self,
        element: &ElementId,
        kind: SelectionKind,
    ) -> Result<Option<String>, DriverError> {
        self.with_element("selected_option", element, |el| {
            Ok(el
                .selected_option
                .and_then(|i| el.options.get(i))
                .map(|(text, value)| match kind {
                    SelectionKind::Text => text.clone(),
                    SelectionKind::Value => value.clone(),
                }))
        })
    }

    async fn execute_script(&self, script: &str, args: &[ScriptArg]) -> Result<Value, DriverError> {
        self.enter("execute_script")?;
        let mut state = self.state.lock();
        state.scripts.push((script.to_string(), args.to_vec()));
        let rule = state
            .rules
            .iter_mut()
            .find(|rule| script.contains(&rule.fragment));
        Ok(match rule {
            Some(rule) => rule.results.pop_front().unwrap_or_else(|| rule.last.clone()),
            None => Value::Null,
        })
    }

    async fn current_url(&self) -> Result<String, DriverError> {
        self.enter("current_url")?;
        Ok(self.state.lock().url.clone())
    }

    async fn navigate_to(&self, url: &str) -> Result<(), DriverError> {
        self.enter("navigate_to")?;
        let mut state = self.state.lock();
        state.url = url.to_string();
        state.frame = None;
        Ok(())
    }
}
