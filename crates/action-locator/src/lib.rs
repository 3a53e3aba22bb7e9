//! Binding resolution
//!
//! This crate turns symbolic names into something usable against a page:
//! - `LocatorBinding`s read from `<element>/locator` keys
//! - attribute values dispatched over literal, script, XPath, regex,
//!   JSON path, process and file bindings
//! - `$[name]` interpolation with a recursion-depth guard
//! - fallback through a default resolver and then the live element text

mod attribute;
pub mod defaults;
pub mod errors;
pub mod evaluators;
mod interpolate;
pub mod json_path;
pub mod resolver;

pub use attribute::*;
pub use defaults::*;
pub use errors::*;
pub use evaluators::*;
pub use interpolate::*;
pub use resolver::*;
