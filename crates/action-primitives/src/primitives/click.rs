//! Click primitives - pointer and form actions

use tracing::debug;

use crate::driver::WebElement;
use crate::errors::ActionError;

pub async fn click(element: &WebElement) -> Result<(), ActionError> {
    element.click().await?;
    Ok(())
}

pub async fn submit(element: &WebElement) -> Result<(), ActionError> {
    element.submit().await?;
    Ok(())
}

/// Bring a checkbox or radio into the `checked` state.
///
/// Clicks only when the current state differs; returns whether a click
/// was made.
pub async fn set_checked(element: &WebElement, checked: bool) -> Result<bool, ActionError> {
    if element.is_selected().await? == checked {
        debug!(element = %element.id().0, checked, "already in target state");
        return Ok(false);
    }
    element.click().await?;
    Ok(true)
}
