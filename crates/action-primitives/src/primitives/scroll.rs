//! Scroll and highlight primitives - script-driven presentation

use serde_json::Value;
use std::time::Duration;
use tokio::time::sleep;
use tracing::debug;

use crate::driver::{ScriptArg, WebElement};
use crate::errors::ActionError;

const SCROLL_INTO_VIEW: &str = "arguments[0].scrollIntoView(true);";

const APPLY_STYLE: &str = "var previous = arguments[0].getAttribute('style'); \
     arguments[0].setAttribute('style', arguments[1]); \
     return previous;";

const RESTORE_STYLE: &str = "if (arguments[1] === null) { arguments[0].removeAttribute('style'); } \
     else { arguments[0].setAttribute('style', arguments[1]); }";

/// Scroll the element into view, then pause for `throttle`.
pub async fn scroll_into_view(element: &WebElement, throttle: Duration) -> Result<(), ActionError> {
    element.execute(SCROLL_INTO_VIEW, Vec::new()).await?;
    if !throttle.is_zero() {
        sleep(throttle).await;
    }
    Ok(())
}

/// Apply `style` inline for `duration`, then put the original style back.
pub async fn highlight(
    element: &WebElement,
    style: &str,
    duration: Duration,
) -> Result<(), ActionError> {
    debug!(element = %element.id().0, style, "highlighting element");
    let previous = element.execute(APPLY_STYLE, vec![style.into()]).await?;
    sleep(duration).await;
    let previous = match previous {
        Value::String(_) => previous,
        _ => Value::Null,
    };
    element
        .execute(RESTORE_STYLE, vec![ScriptArg::Value(previous)])
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::FakeDriver;
    use serde_json::json;
    use std::sync::Arc;
    use webbind_core_types::LocatorStrategy;

    #[tokio::test(start_paused = true)]
    async fn highlight_restores_previous_style() {
        let driver = Arc::new(FakeDriver::new());
        let id = driver.add_element(LocatorStrategy::Name, "q", "input");
        driver.on_script("getAttribute('style')", vec![json!("color: red")]);
        let element = WebElement::new(id, driver.clone());

        highlight(&element, "background: yellow;", Duration::from_millis(500))
            .await
            .unwrap();

        let args = driver.script_args();
        assert_eq!(args.len(), 2);
        assert_eq!(args[0][1], ScriptArg::from("background: yellow;"));
        assert_eq!(args[1][1], ScriptArg::from("color: red"));
    }

    #[tokio::test(start_paused = true)]
    async fn scroll_pauses_for_throttle() {
        let driver = Arc::new(FakeDriver::new());
        let id = driver.add_element(LocatorStrategy::Name, "q", "input");
        let element = WebElement::new(id, driver.clone());
        let started = tokio::time::Instant::now();

        scroll_into_view(&element, Duration::from_millis(200)).await.unwrap();

        assert!(started.elapsed() >= Duration::from_millis(200));
        assert!(driver.scripts()[0].contains("scrollIntoView"));
    }
}
