//! Type text primitive - keyboard input into editable elements

use tracing::debug;

use crate::driver::{WebElement, ENTER_KEY};
use crate::errors::ActionError;

/// Type `text` into the element.
///
/// With `clear_first` the current content is cleared before typing. With
/// `send_enter` an Enter key press follows the text.
pub async fn type_text(
    element: &WebElement,
    text: &str,
    clear_first: bool,
    send_enter: bool,
) -> Result<(), ActionError> {
    if clear_first {
        element.clear().await?;
    }

    debug!(element = %element.id().0, chars = text.chars().count(), "typing text");
    element.send_keys(text).await?;

    if send_enter {
        element.send_keys(ENTER_KEY).await?;
    }
    Ok(())
}

pub async fn clear_text(element: &WebElement) -> Result<(), ActionError> {
    element.clear().await?;
    Ok(())
}
