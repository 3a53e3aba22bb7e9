//! Element state checks

use webbind_core_types::ElementState;

use crate::driver::WebElement;
use crate::errors::ActionError;

/// Whether the located element is currently in `state`.
pub async fn has_state(element: &WebElement, state: ElementState) -> Result<bool, ActionError> {
    let holds = match state {
        ElementState::Displayed => element.is_displayed().await?,
        ElementState::Hidden => !element.is_displayed().await?,
        ElementState::Checked => element.is_selected().await?,
        ElementState::Unchecked => !element.is_selected().await?,
        ElementState::Enabled => element.is_enabled().await?,
        ElementState::Disabled => !element.is_enabled().await?,
    };
    Ok(holds)
}
