//! Action primitives - resilient element interaction against a live driver
//!
//! This crate provides the interaction half of the binding engine:
//! - `Driver` port through which every browser call is made
//! - `attempt` retry combinator shared by interaction and waiting
//! - `ElementInteractor`: locate, apply, re-locate once on transient failure
//! - `WaitEngine`: polling waits bounded by a wall-clock budget
//! - Element primitives (type, click, select, scroll, state checks)

pub mod driver;
pub mod errors;
mod interactor;
pub mod primitives;
pub mod retry;
pub mod types;
mod waiting;

#[cfg(any(test, feature = "test-util"))]
pub mod fake;

pub use driver::*;
pub use errors::*;
pub use interactor::*;
pub use retry::*;
pub use types::*;
pub use waiting::*;
