//! Post-action gate
//!
//! After every state-changing element action the session hands the result
//! to [`BindAndWait`], which:
//! - binds the value under `<element>/<action>`
//! - sleeps for `<element>/<action>/wait` seconds when configured
//! - polls the script named by `<element>/<action>/condition` until it holds

pub mod errors;
mod gate;

pub use errors::*;
pub use gate::*;
