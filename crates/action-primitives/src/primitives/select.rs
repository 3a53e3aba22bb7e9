//! Select primitives - dropdown option selection

use tracing::debug;
use webbind_core_types::{SelectBy, SelectionKind};

use crate::driver::WebElement;
use crate::errors::ActionError;

pub async fn select_option(element: &WebElement, by: &SelectBy) -> Result<(), ActionError> {
    debug!(element = %element.id().0, option = ?by, "selecting option");
    element.driver().select_option(element.id(), by).await?;
    Ok(())
}

/// Text or value of the first selected option; `None` when nothing is selected.
pub async fn selected_option(
    element: &WebElement,
    kind: SelectionKind,
) -> Result<Option<String>, ActionError> {
    Ok(element.driver().selected_option(element.id(), kind).await?)
}
