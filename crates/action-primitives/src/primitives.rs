//! Element primitives
//!
//! Operations applied to an already located [`crate::WebElement`]. Each is
//! meant to run inside [`crate::ElementInteractor::with_element`], which
//! owns lookup, retry and window restore:
//! 1. type_text / clear_text - keyboard input into fields
//! 2. click / submit / set_checked - pointer and form actions
//! 3. select_option / selected_option - dropdowns
//! 4. scroll_into_view / highlight - script-driven presentation
//! 5. has_state - displayed, checked and enabled checks
//! 6. read_text - visible text with input value fallback

mod click;
mod read;
mod scroll;
mod select;
mod state;
mod type_text;

pub use click::*;
pub use read::*;
pub use scroll::*;
pub use select::*;
pub use state::*;
pub use type_text::*;
