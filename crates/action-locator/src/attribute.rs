//! Bound attribute kinds and the key grammar that selects them

use std::fmt;
use std::str::FromStr;

/// Kind of binding selected by a key's suffix.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum AttributeKind {
    Literal,
    Text,
    JavaScript,
    XPath,
    Regex,
    JsonPath,
    SysProc,
    File,
}

impl AttributeKind {
    /// Kind selected by `key` for binding `name`, or `None` when the key
    /// is not one of `N`, `N/text`, `N/javascript`, `N/xpath/*`,
    /// `N/regex/*`, `N/json path/*`, `N/sysproc` or `N/file`.
    pub fn match_key(name: &str, key: &str) -> Option<AttributeKind> {
        let rest = key.strip_prefix(name)?;
        if rest.is_empty() {
            return Some(AttributeKind::Literal);
        }
        let suffix = rest.strip_prefix('/')?;
        let kind = match suffix {
            "text" => AttributeKind::Text,
            "javascript" => AttributeKind::JavaScript,
            "sysproc" => AttributeKind::SysProc,
            "file" => AttributeKind::File,
            s if has_field(s, "xpath/") => AttributeKind::XPath,
            s if has_field(s, "regex/") => AttributeKind::Regex,
            s if has_field(s, "json path/") => AttributeKind::JsonPath,
            _ => return None,
        };
        Some(kind)
    }

    pub fn name(&self) -> &'static str {
        match self {
            AttributeKind::Literal => "literal",
            AttributeKind::Text => "text",
            AttributeKind::JavaScript => "javascript",
            AttributeKind::XPath => "xpath",
            AttributeKind::Regex => "regex",
            AttributeKind::JsonPath => "json path",
            AttributeKind::SysProc => "sysproc",
            AttributeKind::File => "file",
        }
    }
}

fn has_field(suffix: &str, kind: &str) -> bool {
    suffix.len() > kind.len() && suffix.starts_with(kind)
}

impl fmt::Display for AttributeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What an XPath binding returns.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum TargetType {
    /// String value of the result
    Text,
    /// Markup of the first matching node
    Node,
    /// Markup of every matching node, one per line
    NodeSet,
}

impl TargetType {
    pub fn name(&self) -> &'static str {
        match self {
            TargetType::Text => "text",
            TargetType::Node => "node",
            TargetType::NodeSet => "nodeset",
        }
    }
}

impl FromStr for TargetType {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(TargetType::Text),
            "node" => Ok(TargetType::Node),
            "nodeset" | "node set" => Ok(TargetType::NodeSet),
            other => Err(format!("unknown xpath target type '{}'", other)),
        }
    }
}

/// A binding found in scope, with every field it needs read out of the
/// store. Sources are binding names; expressions and paths are templates
/// still to be interpolated.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum BoundAttribute {
    Literal(String),
    Script(String),
    XPath {
        source: String,
        expression: String,
        target_type: String,
    },
    Regex {
        source: String,
        expression: String,
    },
    JsonPath {
        source: String,
        expression: String,
    },
    SysProc(String),
    File(String),
}

impl BoundAttribute {
    pub fn kind(&self) -> AttributeKind {
        match self {
            BoundAttribute::Literal(_) => AttributeKind::Literal,
            BoundAttribute::Script(_) => AttributeKind::JavaScript,
            BoundAttribute::XPath { .. } => AttributeKind::XPath,
            BoundAttribute::Regex { .. } => AttributeKind::Regex,
            BoundAttribute::JsonPath { .. } => AttributeKind::JsonPath,
            BoundAttribute::SysProc(_) => AttributeKind::SysProc,
            BoundAttribute::File(_) => AttributeKind::File,
        }
    }
}
