//! Read primitive - live text of an element

use crate::driver::WebElement;
use crate::errors::ActionError;

/// Visible text of the element, or its `value` attribute when the element
/// renders no text (inputs and textareas).
pub async fn read_text(element: &WebElement) -> Result<String, ActionError> {
    let text = element.text().await?;
    if !text.is_empty() {
        return Ok(text);
    }
    Ok(element.attribute("value").await?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::FakeDriver;
    use std::sync::Arc;
    use webbind_core_types::LocatorStrategy;

    #[tokio::test]
    async fn falls_back_to_value_attribute() {
        let driver = Arc::new(FakeDriver::new());
        let heading = driver.add_element(LocatorStrategy::TagName, "h1", "h1");
        driver.set_text(&heading, "Welcome");
        let input = driver.add_element(LocatorStrategy::Name, "q", "input");
        driver.set_attribute(&input, "value", "cats");

        let heading = WebElement::new(heading, driver.clone());
        let input = WebElement::new(input, driver.clone());

        assert_eq!(read_text(&heading).await.unwrap(), "Welcome");
        assert_eq!(read_text(&input).await.unwrap(), "cats");
    }
}
