//! Web session - the explicit context every step runs against
//!
//! One session owns one driver, one binding store and the engines built on
//! them. Scope lifecycle is explicit: the session starts with a page scope
//! above the global one, `begin_feature`/`end_feature` bracket a feature
//! scope, and navigation resets the page scope.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument, warn};

use action_gate::BindAndWait;
use action_locator::{
    dry_value, BindingResolver, DefaultEvaluators, DefaultResolver, Evaluators,
};
use action_primitives::primitives::{
    clear_text, click, has_state, highlight, read_text, scroll_into_view, select_option,
    set_checked, submit, type_text,
};
use action_primitives::{
    ActionError, Driver, ElementInteractor, ScreenshotPort, WaitEngine, WebElement,
};
use webbind_core_types::{keys, ElementState, LocatorBinding, SelectBy, SelectionKind};
use webbind_scope_store::{ScopeError, ScopeKind, ScopeStack, ScopedStore};

use crate::config::Settings;
use crate::errors::WebbindError;

const PAGE_SCOPE: &str = "page";

pub struct WebSessionBuilder {
    driver: Arc<dyn Driver>,
    settings: Settings,
    store: Option<Arc<dyn ScopedStore>>,
    evaluators: Option<Arc<dyn Evaluators>>,
    defaults: Option<Arc<dyn DefaultResolver>>,
    screenshots: Option<Arc<dyn ScreenshotPort>>,
}

impl WebSessionBuilder {
    pub fn new(driver: Arc<dyn Driver>) -> Self {
        Self {
            driver,
            settings: Settings::default(),
            store: None,
            evaluators: None,
            defaults: None,
            screenshots: None,
        }
    }

    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_store(mut self, store: Arc<dyn ScopedStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_evaluators(mut self, evaluators: Arc<dyn Evaluators>) -> Self {
        self.evaluators = Some(evaluators);
        self
    }

    pub fn with_defaults(mut self, defaults: Arc<dyn DefaultResolver>) -> Self {
        self.defaults = Some(defaults);
        self
    }

    pub fn with_screenshots(mut self, port: Arc<dyn ScreenshotPort>) -> Self {
        self.screenshots = Some(port);
        self
    }

    pub fn build(self) -> WebSession {
        let settings = self.settings;
        let driver = self.driver;

        let store = self.store.unwrap_or_else(|| Arc::new(ScopeStack::new()));
        if store.current_scope().0 != ScopeKind::Page {
            store.push_scope(ScopeKind::Page, PAGE_SCOPE);
        }

        let evaluators = self
            .evaluators
            .unwrap_or_else(|| Arc::new(DefaultEvaluators::new(driver.clone())));
        let defaults = self
            .defaults
            .unwrap_or_else(|| Arc::new(settings.env_defaults()));

        let mut interactor = ElementInteractor::new(driver.clone(), settings.interaction_policy());
        if let Some(port) = self.screenshots {
            interactor = interactor.with_screenshots(port);
        }

        let waits = WaitEngine::new(settings.wait_policy());
        let resolver = BindingResolver::new(
            store.clone(),
            interactor.clone(),
            evaluators.clone(),
            defaults,
            settings.resolver_options(),
        );
        let gate = BindAndWait::new(store.clone(), driver.clone(), waits);

        WebSession {
            settings,
            store,
            driver,
            evaluators,
            interactor,
            resolver,
            gate,
            waits,
        }
    }
}

/// Context object threaded through every step of one scenario.
pub struct WebSession {
    settings: Settings,
    store: Arc<dyn ScopedStore>,
    driver: Arc<dyn Driver>,
    evaluators: Arc<dyn Evaluators>,
    interactor: ElementInteractor,
    resolver: BindingResolver,
    gate: BindAndWait,
    waits: WaitEngine,
}

impl WebSession {
    pub fn builder(driver: Arc<dyn Driver>) -> WebSessionBuilder {
        WebSessionBuilder::new(driver)
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn store(&self) -> &Arc<dyn ScopedStore> {
        &self.store
    }

    pub fn driver(&self) -> &Arc<dyn Driver> {
        &self.driver
    }

    pub fn resolver(&self) -> &BindingResolver {
        &self.resolver
    }

    fn dry_run(&self) -> bool {
        self.settings.dry_run
    }

    // ---- bindings and scopes ----

    /// Bind `key` in the current (innermost) scope.
    pub fn bind(&self, key: &str, value: &str) {
        self.store.set(key, value);
    }

    /// Bind `key` in the innermost scope of `kind`.
    pub fn bind_in(&self, kind: ScopeKind, key: &str, value: &str) -> Result<(), WebbindError> {
        Ok(self.store.set_in(kind, key, value)?)
    }

    pub fn begin_feature(&self, name: &str) {
        info!(feature = name, "beginning feature");
        if let Err(err) = self.store.pop_scope(ScopeKind::Page) {
            warn!(error = %err, "no page scope to close before feature");
        }
        self.store.push_scope(ScopeKind::Feature, name);
        self.store.push_scope(ScopeKind::Page, PAGE_SCOPE);
    }

    /// Close the innermost feature scope and any page scope above it.
    pub fn end_feature(&self) -> Result<(), WebbindError> {
        let popped = self.store.pop_scope(ScopeKind::Feature)?;
        if let Some(feature) = popped.iter().find(|scope| scope.kind == ScopeKind::Feature) {
            info!(feature = %feature.name, "ended feature");
        }
        self.store.push_scope(ScopeKind::Page, PAGE_SCOPE);
        Ok(())
    }

    pub fn reset_page_scope(&self) -> Result<(), WebbindError> {
        self.resolver.forget_live_text();
        match self.store.reset_scope(ScopeKind::Page) {
            Ok(()) => Ok(()),
            Err(ScopeError::NoSuchScope(_)) => {
                self.store.push_scope(ScopeKind::Page, PAGE_SCOPE);
                Ok(())
            }
            Err(err) => Err(err.into()),
        }
    }

    // ---- resolution ----

    pub async fn locator_binding(&self, element: &str) -> Result<LocatorBinding, WebbindError> {
        Ok(self.resolver.locator_binding(element).await?)
    }

    pub async fn get_attribute(&self, name: &str) -> Result<String, WebbindError> {
        Ok(self.resolver.get_attribute(name).await?)
    }

    pub async fn get_bound_reference_value(&self, name: &str) -> Result<String, WebbindError> {
        Ok(self.resolver.get_bound_reference_value(name).await?)
    }

    pub async fn interpolate(&self, template: &str) -> Result<String, WebbindError> {
        Ok(self.resolver.interpolate(template).await?)
    }

    pub async fn get_element_selection(
        &self,
        name: &str,
        kind: SelectionKind,
    ) -> Result<String, WebbindError> {
        Ok(self.resolver.get_element_selection(name, kind).await?)
    }

    // ---- interaction ----

    /// Run `apply` against the named element through the interactor.
    pub async fn with_element<T, F, Fut>(
        &self,
        action: Option<&str>,
        element: &str,
        apply: F,
    ) -> Result<T, WebbindError>
    where
        F: Fn(WebElement) -> Fut + Send + Sync,
        Fut: Future<Output = Result<T, ActionError>> + Send,
        T: Send,
    {
        let binding = self.resolver.locator_binding(element).await?;
        Ok(self.interactor.with_element(action, &binding, apply).await?)
    }

    pub async fn bind_and_wait(
        &self,
        element: &str,
        action: &str,
        value: &str,
    ) -> Result<(), WebbindError> {
        if self.dry_run() {
            self.gate.bind(element, action, value);
            return Ok(());
        }
        Ok(self.gate.bind_and_wait(element, action, value).await?)
    }

    /// Resolve the binding, run the state-changing `apply`, drop cached
    /// text for the element and every earlier live read, then bind and wait.
    async fn perform<F, Fut>(
        &self,
        element: &str,
        action: &str,
        value: &str,
        apply: F,
    ) -> Result<(), WebbindError>
    where
        F: Fn(WebElement) -> Fut + Send + Sync,
        Fut: Future<Output = Result<(), ActionError>> + Send,
    {
        let binding = self.resolver.locator_binding(element).await?;
        if self.dry_run() {
            info!(binding = %binding, action, "dry run: skipping element action");
        } else {
            self.interactor
                .with_element(Some(action), &binding, apply)
                .await?;
            self.invalidate_text(element);
        }
        self.bind_and_wait(element, action, value).await
    }

    /// Blank cached text so the next read of it goes to the page.
    fn invalidate_text(&self, element: &str) {
        self.resolver.forget_live_text();
        let key = keys::text(element);
        if self
            .store
            .get_opt(&key)
            .is_some_and(|cached| !cached.is_empty())
        {
            self.store.set(&key, "");
        }
    }

    #[instrument(skip(self, value), fields(chars = value.chars().count()))]
    pub async fn send_keys(
        &self,
        element: &str,
        value: &str,
        clear_first: bool,
        send_enter: bool,
    ) -> Result<(), WebbindError> {
        self.perform(element, "type", value, move |el| async move {
            type_text(&el, value, clear_first, send_enter).await
        })
        .await
    }

    pub async fn clear_text(&self, element: &str) -> Result<(), WebbindError> {
        self.perform(element, "clear", "true", |el| async move { clear_text(&el).await })
            .await
    }

    #[instrument(skip(self))]
    pub async fn click(&self, element: &str) -> Result<(), WebbindError> {
        self.perform(element, "click", "true", |el| async move { click(&el).await })
            .await
    }

    pub async fn submit(&self, element: &str) -> Result<(), WebbindError> {
        self.perform(element, "submit", "true", |el| async move { submit(&el).await })
            .await
    }

    /// Tick a checkbox; no click is made when it is already ticked.
    pub async fn check(&self, element: &str) -> Result<(), WebbindError> {
        self.perform(element, "check", "true", |el| async move {
            set_checked(&el, true).await.map(|_| ())
        })
        .await
    }

    pub async fn uncheck(&self, element: &str) -> Result<(), WebbindError> {
        self.perform(element, "uncheck", "true", |el| async move {
            set_checked(&el, false).await.map(|_| ())
        })
        .await
    }

    pub async fn select_by_text(&self, element: &str, text: &str) -> Result<(), WebbindError> {
        self.select(element, SelectBy::Text(text.to_string())).await
    }

    pub async fn select_by_value(&self, element: &str, value: &str) -> Result<(), WebbindError> {
        self.select(element, SelectBy::Value(value.to_string())).await
    }

    pub async fn select_by_index(&self, element: &str, index: usize) -> Result<(), WebbindError> {
        self.select(element, SelectBy::Index(index)).await
    }

    #[instrument(skip(self))]
    async fn select(&self, element: &str, by: SelectBy) -> Result<(), WebbindError> {
        let bound = by.bound_value();
        let by = &by;
        self.perform(element, "select", &bound, move |el| async move {
            select_option(&el, by).await
        })
        .await
    }

    /// Scroll the element into view; nothing is bound.
    pub async fn move_to(&self, element: &str) -> Result<(), WebbindError> {
        let binding = self.resolver.locator_binding(element).await?;
        if self.dry_run() {
            info!(binding = %binding, "dry run: skipping move to");
            return Ok(());
        }
        let throttle = self.interactor.policy().throttle();
        self.interactor
            .with_element(None, &binding, move |el| async move {
                scroll_into_view(&el, throttle).await
            })
            .await?;
        Ok(())
    }

    /// Apply the configured highlight style for the configured duration.
    pub async fn highlight(&self, element: &str) -> Result<(), WebbindError> {
        let binding = self.resolver.locator_binding(element).await?;
        if self.dry_run() {
            return Ok(());
        }
        let style = self.settings.highlight_style.as_str();
        let duration = Duration::from_millis(self.settings.highlight_ms);
        self.interactor
            .with_element(None, &binding, move |el| async move {
                highlight(&el, style, duration).await
            })
            .await?;
        Ok(())
    }

    // ---- state and waits ----

    async fn state_of(&self, binding: &LocatorBinding, state: ElementState) -> Result<bool, ActionError> {
        let checked = self
            .interactor
            .with_element(None, binding, move |el| async move { has_state(&el, state).await })
            .await;
        match checked {
            Err(err) if err.is_not_found() && state == ElementState::Hidden => Ok(true),
            Err(err) if err.is_not_found() && state == ElementState::Displayed => Ok(false),
            other => other,
        }
    }

    /// Whether the element is currently in `state`. An element that cannot
    /// be located counts as hidden.
    pub async fn check_element_state(
        &self,
        element: &str,
        state: ElementState,
    ) -> Result<bool, WebbindError> {
        let binding = self.resolver.locator_binding(element).await?;
        if self.dry_run() {
            return Ok(true);
        }
        Ok(self.state_of(&binding, state).await?)
    }

    #[instrument(skip(self))]
    pub async fn wait_for_element_state(
        &self,
        element: &str,
        state: ElementState,
    ) -> Result<(), WebbindError> {
        let binding = self.resolver.locator_binding(element).await?;
        if self.dry_run() {
            return Ok(());
        }
        let reason = format!("{} to be {}", element, state);
        let binding = &binding;
        self.waits
            .wait_until_default(Some(&reason), move || async move {
                self.state_of(binding, state).await
            })
            .await?;
        Ok(())
    }

    /// Wait until the element shows non-empty text.
    pub async fn wait_for_text(&self, element: &str) -> Result<(), WebbindError> {
        let binding = self.resolver.locator_binding(element).await?;
        if self.dry_run() {
            return Ok(());
        }
        let reason = format!("text in {}", element);
        let binding = &binding;
        self.waits
            .wait_until_default(Some(&reason), move || async move {
                let text = self
                    .interactor
                    .with_element(None, binding, |el| async move { read_text(&el).await })
                    .await?;
                Ok(!text.trim().is_empty())
            })
            .await?;
        Ok(())
    }

    /// Poll `condition` for up to `timeout_secs`, tolerating transient
    /// driver errors.
    pub async fn wait_until<F, Fut>(
        &self,
        reason: Option<&str>,
        timeout_secs: u64,
        condition: F,
    ) -> Result<(), WebbindError>
    where
        F: Fn() -> Fut + Send + Sync,
        Fut: Future<Output = Result<bool, ActionError>> + Send,
    {
        self.waits
            .wait_until(reason, Duration::from_secs(timeout_secs), condition)
            .await?;
        Ok(())
    }

    // ---- page ----

    /// Navigate and start a fresh page scope.
    #[instrument(skip(self))]
    pub async fn navigate_to(&self, url: &str) -> Result<(), WebbindError> {
        let url = self.resolver.interpolate(url).await?;
        if self.dry_run() {
            info!(url = %url, "dry run: skipping navigation");
        } else {
            self.driver
                .navigate_to(&url)
                .await
                .map_err(ActionError::from)?;
        }
        self.reset_page_scope()
    }

    /// Interpolate and run `script`, returning its string result.
    pub async fn execute_script(&self, script: &str) -> Result<String, WebbindError> {
        let script = self.resolver.interpolate(script).await?;
        if self.dry_run() {
            return Ok(dry_value("javascript"));
        }
        self.evaluators
            .execute_script(&script, &[])
            .await
            .map_err(|err| WebbindError::from(err.for_binding("script", "javascript")))
    }
}
