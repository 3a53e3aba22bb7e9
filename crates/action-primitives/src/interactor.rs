//! Resilient element interaction
//!
//! Every element read or write goes through [`ElementInteractor::with_element`]:
//! locate, apply, and on a transient driver failure locate again and apply
//! once more. Container-scoped interactions run inside a [`WindowScope`] so
//! the active window after the call equals the one before it.

use async_recursion::async_recursion;
use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info, warn};
use webbind_core_types::{LocatorBinding, WindowHandle};

use crate::driver::{Driver, WebElement};
use crate::errors::{ActionError, DriverError};
use crate::retry::{attempt, RetryPolicy};
use crate::types::InteractionPolicy;

/// Receives a capture request after a successful named action.
#[async_trait]
pub trait ScreenshotPort: Send + Sync {
    async fn capture(&self, action: &str, element: &str) -> Result<(), ActionError>;
}

/// Saved window handle, switched back to on [`WindowScope::restore`].
pub struct WindowScope {
    driver: Arc<dyn Driver>,
    handle: WindowHandle,
    restored: bool,
}

impl WindowScope {
    pub async fn capture(driver: Arc<dyn Driver>) -> Result<Self, DriverError> {
        let handle = driver.current_window().await?;
        debug!(window = %handle.0, "captured window handle");
        Ok(Self {
            driver,
            handle,
            restored: false,
        })
    }

    pub fn handle(&self) -> &WindowHandle {
        &self.handle
    }

    /// Return to the saved window without ending the scope.
    pub async fn reenter(&self) -> Result<(), DriverError> {
        self.driver.switch_to_window(&self.handle).await
    }

    pub async fn restore(mut self) -> Result<(), DriverError> {
        self.restored = true;
        debug!(window = %self.handle.0, "restoring window handle");
        self.driver.switch_to_window(&self.handle).await
    }
}

impl Drop for WindowScope {
    fn drop(&mut self) {
        if !self.restored {
            warn!(window = %self.handle.0, "window scope dropped without restore");
        }
    }
}

/// Locates elements and applies operations to them with one retry.
#[derive(Clone)]
pub struct ElementInteractor {
    driver: Arc<dyn Driver>,
    policy: InteractionPolicy,
    screenshots: Option<Arc<dyn ScreenshotPort>>,
}

impl ElementInteractor {
    pub fn new(driver: Arc<dyn Driver>, policy: InteractionPolicy) -> Self {
        Self {
            driver,
            policy,
            screenshots: None,
        }
    }

    pub fn with_screenshots(mut self, port: Arc<dyn ScreenshotPort>) -> Self {
        self.screenshots = Some(port);
        self
    }

    pub fn driver(&self) -> &Arc<dyn Driver> {
        &self.driver
    }

    pub fn policy(&self) -> &InteractionPolicy {
        &self.policy
    }

    /// Run `apply` against the element described by `binding`.
    ///
    /// A transient failure while locating or applying triggers exactly one
    /// fresh lookup and a second application; the second failure is
    /// returned. When `action` is set and screenshots are enabled, a capture
    /// is requested after success.
    pub async fn with_element<T, F, Fut>(
        &self,
        action: Option<&str>,
        binding: &LocatorBinding,
        apply: F,
    ) -> Result<T, ActionError>
    where
        F: Fn(WebElement) -> Fut + Send + Sync,
        Fut: Future<Output = Result<T, ActionError>> + Send,
        T: Send,
    {
        let scope = match binding.container {
            Some(_) => Some(WindowScope::capture(self.driver.clone()).await?),
            None => None,
        };

        let scope_ref = scope.as_ref();
        let apply = &apply;
        let result = attempt(&RetryPolicy::once(), move |ctx| async move {
            if ctx.is_retry() {
                debug!(element = %binding.element, "re-locating element");
                if let Some(scope) = scope_ref {
                    scope.reenter().await?;
                }
            }
            let element = self.locate(binding).await?;
            apply(element).await
        })
        .await;

        let restored = match scope {
            Some(scope) => scope.restore().await,
            None => Ok(()),
        };

        let value = match (result, restored) {
            (Ok(value), Ok(())) => value,
            (Ok(_), Err(err)) => return Err(err.into()),
            (Err(err), Ok(())) => return Err(err),
            (Err(err), Err(restore_err)) => {
                warn!(element = %binding.element, error = %restore_err, "failed to restore window after error");
                return Err(err);
            }
        };

        if let Some(action) = action {
            info!(element = %binding.element, action, "element action completed");
            self.capture(action, &binding.element).await;
        }
        Ok(value)
    }

    /// Locate the element, descending through containers. Frame containers
    /// are switched into; other containers bound the search.
    #[async_recursion]
    async fn locate(&self, binding: &LocatorBinding) -> Result<WebElement, ActionError> {
        let within = match &binding.container {
            Some(container) => {
                let parent = self.locate(container).await?;
                if parent.is_frame().await? {
                    debug!(frame = %container.element, "switching to frame");
                    self.driver.switch_to_frame(parent.id()).await?;
                    None
                } else {
                    Some(parent.id().clone())
                }
            }
            None => None,
        };

        debug!(
            element = %binding.element,
            strategy = %binding.locator_strategy,
            expression = %binding.expression,
            "locating element"
        );
        let id = self
            .driver
            .find_element(binding.locator_strategy, &binding.expression, within.as_ref())
            .await?;
        Ok(WebElement::new(id, self.driver.clone()))
    }

    async fn capture(&self, action: &str, element: &str) {
        if !self.policy.capture_screenshots {
            return;
        }
        let Some(port) = &self.screenshots else {
            return;
        };
        if let Err(err) = port.capture(action, element).await {
            warn!(element, action, error = %err, "screenshot capture failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::FakeDriver;
    use parking_lot::Mutex;
    use webbind_core_types::LocatorStrategy;

    fn q() -> LocatorBinding {
        LocatorBinding::new("q", LocatorStrategy::Name, "q")
    }

    #[derive(Default)]
    struct RecordingScreens(Mutex<Vec<String>>);

    #[async_trait]
    impl ScreenshotPort for RecordingScreens {
        async fn capture(&self, action: &str, element: &str) -> Result<(), ActionError> {
            self.0.lock().push(format!("{element}:{action}"));
            Ok(())
        }
    }

    #[tokio::test]
    async fn transient_failure_is_retried_exactly_once() {
        let driver = Arc::new(FakeDriver::new());
        driver.add_element(LocatorStrategy::Name, "q", "input");
        driver.fail_next("click", DriverError::StaleElement("q".into()));
        let interactor = ElementInteractor::new(driver.clone(), InteractionPolicy::default());

        interactor
            .with_element(Some("click"), &q(), |el| async move { Ok(el.click().await?) })
            .await
            .unwrap();

        assert_eq!(driver.count_calls("find_element"), 2);
        assert_eq!(driver.count_calls("click"), 2);
    }

    #[tokio::test]
    async fn second_transient_failure_propagates() {
        let driver = Arc::new(FakeDriver::new());
        driver.add_element(LocatorStrategy::Name, "q", "input");
        driver.fail_next("click", DriverError::StaleElement("q".into()));
        driver.fail_next("click", DriverError::StaleElement("q".into()));
        driver.fail_next("click", DriverError::StaleElement("q".into()));
        let interactor = ElementInteractor::new(driver.clone(), InteractionPolicy::default());

        let err = interactor
            .with_element(None, &q(), |el| async move { Ok(el.click().await?) })
            .await
            .unwrap_err();

        assert!(err.is_retryable());
        assert_eq!(driver.count_calls("click"), 2);
    }

    #[tokio::test]
    async fn returns_second_attempt_result() {
        let driver = Arc::new(FakeDriver::new());
        let id = driver.add_element(LocatorStrategy::Name, "q", "input");
        driver.set_text(&id, "cats");
        driver.fail_next("text", DriverError::Navigating("reload".into()));
        let interactor = ElementInteractor::new(driver.clone(), InteractionPolicy::default());

        let text = interactor
            .with_element(None, &q(), |el| async move { Ok(el.text().await?) })
            .await
            .unwrap();

        assert_eq!(text, "cats");
        assert_eq!(driver.count_calls("text"), 2);
    }

    #[tokio::test]
    async fn missing_element_fails_after_one_retry() {
        let driver = Arc::new(FakeDriver::new());
        let interactor = ElementInteractor::new(driver.clone(), InteractionPolicy::default());

        let err = interactor
            .with_element(None, &q(), |el| async move { Ok(el.click().await?) })
            .await
            .unwrap_err();

        assert!(err.is_not_found());
        assert_eq!(driver.count_calls("find_element"), 2);
    }

    #[tokio::test]
    async fn frame_container_restores_window_on_success_and_failure() {
        let driver = Arc::new(FakeDriver::new());
        driver.add_element(LocatorStrategy::Id, "main", "iframe");
        driver.add_element(LocatorStrategy::Name, "q", "input");
        let binding = q().within(LocatorBinding::new("frame", LocatorStrategy::Id, "main"));
        let interactor = ElementInteractor::new(driver.clone(), InteractionPolicy::default());

        interactor
            .with_element(None, &binding, |el| async move { Ok(el.click().await?) })
            .await
            .unwrap();
        assert_eq!(driver.count_calls("switch_to_frame"), 1);
        assert_eq!(driver.active_frame(), None);

        driver.fail_next("click", DriverError::Session("lost".into()));
        let err = interactor
            .with_element(None, &binding, |el| async move { Ok(el.click().await?) })
            .await
            .unwrap_err();
        assert!(matches!(err, ActionError::Driver(DriverError::Session(_))));
        assert_eq!(driver.active_frame(), None);
        assert_eq!(driver.count_calls("switch_to_window"), 2);
    }

    #[tokio::test]
    async fn frame_retry_returns_to_window_before_relocating() {
        let driver = Arc::new(FakeDriver::new());
        driver.add_element(LocatorStrategy::Id, "main", "iframe");
        driver.add_element(LocatorStrategy::Name, "q", "input");
        driver.fail_next("click", DriverError::StaleElement("q".into()));
        let binding = q().within(LocatorBinding::new("frame", LocatorStrategy::Id, "main"));
        let interactor = ElementInteractor::new(driver.clone(), InteractionPolicy::default());

        interactor
            .with_element(None, &binding, |el| async move { Ok(el.click().await?) })
            .await
            .unwrap();

        assert_eq!(driver.count_calls("click"), 2);
        assert_eq!(driver.count_calls("switch_to_frame"), 2);
        // one re-entry before the second lookup, one final restore
        assert_eq!(driver.count_calls("switch_to_window"), 2);
        assert_eq!(driver.active_frame(), None);
    }

    #[tokio::test]
    async fn non_frame_container_scopes_search() {
        let driver = Arc::new(FakeDriver::new());
        let form = driver.add_element(LocatorStrategy::Id, "form", "form");
        driver.add_child(&form, LocatorStrategy::Name, "q", "input");
        let binding = q().within(LocatorBinding::new("form", LocatorStrategy::Id, "form"));
        let interactor = ElementInteractor::new(driver.clone(), InteractionPolicy::default());

        interactor
            .with_element(None, &binding, |el| async move { Ok(el.click().await?) })
            .await
            .unwrap();

        assert_eq!(driver.count_calls("switch_to_frame"), 0);
        // unscoped lookup misses the nested element
        let err = interactor
            .with_element(None, &q(), |el| async move { Ok(el.click().await?) })
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn screenshots_follow_policy() {
        let driver = Arc::new(FakeDriver::new());
        driver.add_element(LocatorStrategy::Name, "q", "input");
        let screens = Arc::new(RecordingScreens::default());
        let policy = InteractionPolicy {
            capture_screenshots: true,
            ..InteractionPolicy::default()
        };
        let interactor =
            ElementInteractor::new(driver.clone(), policy).with_screenshots(screens.clone());

        interactor
            .with_element(Some("click"), &q(), |el| async move { Ok(el.click().await?) })
            .await
            .unwrap();
        interactor
            .with_element(None, &q(), |el| async move { Ok(el.text().await?) })
            .await
            .unwrap();

        assert_eq!(screens.0.lock().clone(), vec!["q:click".to_string()]);
    }
}
