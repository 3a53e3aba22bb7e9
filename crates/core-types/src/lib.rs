#![allow(dead_code)]

use std::fmt;

use thiserror::Error;

pub mod keys;

pub use keys::CURRENT_URL;

/// Raised when a textual token does not name a known variant.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("unknown locator strategy: {0}")]
    Strategy(String),
    #[error("unknown element state: {0}")]
    State(String),
    #[error("unknown selection kind: {0}")]
    Selection(String),
}

/// Opaque reference to an element held by the live driver session.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct ElementId(pub String);

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct WindowHandle(pub String);

impl fmt::Display for WindowHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Method used by the driver to find a page element.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum LocatorStrategy {
    Id,
    Name,
    TagName,
    CssSelector,
    XPath,
    ClassName,
    LinkText,
    PartialLinkText,
    JavaScript,
}

impl LocatorStrategy {
    /// Canonical name, as used in `<element>/locator` bindings.
    pub fn name(&self) -> &'static str {
        match self {
            LocatorStrategy::Id => "id",
            LocatorStrategy::Name => "name",
            LocatorStrategy::TagName => "tag name",
            LocatorStrategy::CssSelector => "css selector",
            LocatorStrategy::XPath => "xpath",
            LocatorStrategy::ClassName => "class name",
            LocatorStrategy::LinkText => "link text",
            LocatorStrategy::PartialLinkText => "partial link text",
            LocatorStrategy::JavaScript => "javascript",
        }
    }

    pub fn parse(raw: &str) -> Result<Self, ParseError> {
        let normalized = raw.trim().to_ascii_lowercase();
        let strategy = match normalized.as_str() {
            "id" => LocatorStrategy::Id,
            "name" => LocatorStrategy::Name,
            "tag name" | "tag" => LocatorStrategy::TagName,
            "css selector" | "css" => LocatorStrategy::CssSelector,
            "xpath" => LocatorStrategy::XPath,
            "class name" | "class" => LocatorStrategy::ClassName,
            "link text" => LocatorStrategy::LinkText,
            "partial link text" => LocatorStrategy::PartialLinkText,
            "javascript" | "js" => LocatorStrategy::JavaScript,
            _ => return Err(ParseError::Strategy(raw.to_string())),
        };
        Ok(strategy)
    }
}

impl fmt::Display for LocatorStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How to find a page element: strategy, interpolated expression and an
/// optional enclosing element whose window or frame context must be
/// selected first.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LocatorBinding {
    pub element: String,
    pub locator_strategy: LocatorStrategy,
    pub expression: String,
    pub container: Option<Box<LocatorBinding>>,
}

impl LocatorBinding {
    pub fn new(
        element: impl Into<String>,
        locator_strategy: LocatorStrategy,
        expression: impl Into<String>,
    ) -> Self {
        Self {
            element: element.into(),
            locator_strategy,
            expression: expression.into(),
            container: None,
        }
    }

    pub fn within(mut self, container: LocatorBinding) -> Self {
        self.container = Some(Box::new(container));
        self
    }
}

impl fmt::Display for LocatorBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}: {}]",
            self.element, self.locator_strategy, self.expression
        )?;
        if let Some(container) = &self.container {
            write!(f, " in {}", container)?;
        }
        Ok(())
    }
}

/// Which facet of a dropdown's current selection to read.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum SelectionKind {
    Text,
    Value,
}

impl SelectionKind {
    /// Suffix under which a computed selection is bound back into scope.
    pub fn binding_suffix(&self) -> &'static str {
        match self {
            SelectionKind::Text => "selectedText",
            SelectionKind::Value => "selectedValue",
        }
    }

    pub fn parse(raw: &str) -> Result<Self, ParseError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "text" | "selected text" => Ok(SelectionKind::Text),
            "value" | "selected value" => Ok(SelectionKind::Value),
            _ => Err(ParseError::Selection(raw.to_string())),
        }
    }
}

/// Option selector for dropdown elements.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SelectBy {
    Text(String),
    Value(String),
    Index(usize),
}

impl SelectBy {
    /// Value recorded by bind-and-wait once the selection is made.
    pub fn bound_value(&self) -> String {
        match self {
            SelectBy::Text(text) => text.clone(),
            SelectBy::Value(value) => value.clone(),
            SelectBy::Index(index) => index.to_string(),
        }
    }
}

/// Observable element states that steps may check or wait for.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum ElementState {
    Displayed,
    Hidden,
    Checked,
    Unchecked,
    Enabled,
    Disabled,
}

impl ElementState {
    pub fn name(&self) -> &'static str {
        match self {
            ElementState::Displayed => "displayed",
            ElementState::Hidden => "hidden",
            ElementState::Checked => "checked",
            ElementState::Unchecked => "unchecked",
            ElementState::Enabled => "enabled",
            ElementState::Disabled => "disabled",
        }
    }

    pub fn parse(raw: &str) -> Result<Self, ParseError> {
        let state = match raw.trim().to_ascii_lowercase().as_str() {
            "displayed" | "visible" => ElementState::Displayed,
            "hidden" | "invisible" => ElementState::Hidden,
            "checked" | "ticked" => ElementState::Checked,
            "unchecked" | "unticked" => ElementState::Unchecked,
            "enabled" => ElementState::Enabled,
            "disabled" => ElementState::Disabled,
            _ => return Err(ParseError::State(raw.to_string())),
        };
        Ok(state)
    }

    /// The state whose truth value is the negation of this one.
    pub fn opposite(&self) -> ElementState {
        match self {
            ElementState::Displayed => ElementState::Hidden,
            ElementState::Hidden => ElementState::Displayed,
            ElementState::Checked => ElementState::Unchecked,
            ElementState::Unchecked => ElementState::Checked,
            ElementState::Enabled => ElementState::Disabled,
            ElementState::Disabled => ElementState::Enabled,
        }
    }
}

impl fmt::Display for ElementState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strategy_parse_accepts_aliases() {
        assert_eq!(LocatorStrategy::parse("css").unwrap(), LocatorStrategy::CssSelector);
        assert_eq!(
            LocatorStrategy::parse(" Tag Name ").unwrap(),
            LocatorStrategy::TagName
        );
        assert_eq!(LocatorStrategy::parse("name").unwrap().name(), "name");
        assert!(LocatorStrategy::parse("shadow").is_err());
    }

    #[test]
    fn binding_display_includes_container() {
        let frame = LocatorBinding::new("frame", LocatorStrategy::Id, "main");
        let binding = LocatorBinding::new("q", LocatorStrategy::Name, "q").within(frame);
        assert_eq!(binding.to_string(), "q [name: q] in frame [id: main]");
    }

    #[test]
    fn element_state_opposites_round_trip() {
        for state in [
            ElementState::Displayed,
            ElementState::Checked,
            ElementState::Enabled,
        ] {
            assert_eq!(state.opposite().opposite(), state);
        }
        assert_eq!(ElementState::parse("ticked").unwrap(), ElementState::Checked);
    }
}
