//! Attribute-key grammar shared by the store, resolver and gate.
//!
//! Keys are flat strings; `/` is only a human-readable separator.

/// Reserved binding name for the live page URL.
pub const CURRENT_URL: &str = "the current URL";

pub fn locator(element: &str) -> String {
    format!("{}/locator", element)
}

pub fn locator_expression(element: &str, strategy: &str) -> String {
    format!("{}/locator/{}", element, strategy)
}

pub fn locator_container(element: &str, strategy: &str) -> String {
    format!("{}/locator/{}/container", element, strategy)
}

pub fn action(element: &str, action: &str) -> String {
    format!("{}/{}", element, action)
}

pub fn action_wait(element: &str, action: &str) -> String {
    format!("{}/{}/wait", element, action)
}

pub fn action_condition(element: &str, action: &str) -> String {
    format!("{}/{}/condition", element, action)
}

pub fn text(name: &str) -> String {
    format!("{}/text", name)
}

pub fn javascript(name: &str) -> String {
    format!("{}/javascript", name)
}

pub fn xpath_field(name: &str, field: &str) -> String {
    format!("{}/xpath/{}", name, field)
}

pub fn regex_field(name: &str, field: &str) -> String {
    format!("{}/regex/{}", name, field)
}

pub fn json_path_field(name: &str, field: &str) -> String {
    format!("{}/json path/{}", name, field)
}

pub fn selection(name: &str, kind: crate::SelectionKind) -> String {
    format!("{}/{}", name, kind.binding_suffix())
}
