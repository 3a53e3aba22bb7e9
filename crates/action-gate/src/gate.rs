//! Bind-and-wait coordinator

use action_primitives::{script_value_is_true, Driver, WaitEngine};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};
use webbind_core_types::keys;
use webbind_scope_store::ScopedStore;

use crate::errors::GateError;

/// Writes action results into scope and honours post-action waits.
#[derive(Clone)]
pub struct BindAndWait {
    store: Arc<dyn ScopedStore>,
    driver: Arc<dyn Driver>,
    waits: WaitEngine,
}

impl BindAndWait {
    pub fn new(store: Arc<dyn ScopedStore>, driver: Arc<dyn Driver>, waits: WaitEngine) -> Self {
        Self {
            store,
            driver,
            waits,
        }
    }

    /// Bind `value` under `<element>/<action>` without any waiting.
    pub fn bind(&self, element: &str, action: &str, value: &str) {
        self.store.set(&keys::action(element, action), value);
    }

    pub async fn bind_and_wait(
        &self,
        element: &str,
        action: &str,
        value: &str,
    ) -> Result<(), GateError> {
        self.bind(element, action, value);

        let wait_key = keys::action_wait(element, action);
        if let Some(raw) = self
            .store
            .get_opt(&wait_key)
            .filter(|raw| !raw.trim().is_empty())
        {
            let duration = parse_wait(&wait_key, &raw)?;
            self.waits
                .pause(&format!("{} {} wait", element, action), duration)
                .await;
        }

        let condition_key = keys::action_condition(element, action);
        if let Some(condition) = self
            .store
            .get_opt(&condition_key)
            .filter(|condition| !condition.trim().is_empty())
        {
            self.wait_for_condition(element, action, &condition).await?;
        }
        Ok(())
    }

    async fn wait_for_condition(
        &self,
        element: &str,
        action: &str,
        condition: &str,
    ) -> Result<(), GateError> {
        let script_key = keys::javascript(condition);
        let script = self
            .store
            .get_opt(&script_key)
            .filter(|script| !script.trim().is_empty())
            .ok_or_else(|| GateError::ConditionNotBound {
                condition: condition.to_string(),
                key: script_key.clone(),
            })?;
        let predicate = predicate_script(&script);
        debug!(element, action, condition, "waiting for post-action condition");

        let driver = &self.driver;
        let predicate = predicate.as_str();
        self.waits
            .wait_until_default(Some(condition), || async move {
                let value = driver.execute_script(predicate, &[]).await?;
                Ok(script_value_is_true(&value))
            })
            .await?;

        info!(element, action, condition, "post-action condition met");
        Ok(())
    }
}

/// Seconds bound at a wait key; fractions are allowed.
fn parse_wait(key: &str, raw: &str) -> Result<Duration, GateError> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|secs| secs.is_finite() && *secs >= 0.0)
        .map(Duration::from_secs_f64)
        .ok_or_else(|| GateError::InvalidWait {
            key: key.to_string(),
            value: raw.to_string(),
        })
}

/// Wrap a condition so it evaluates to a boolean in the page.
pub fn predicate_script(script: &str) -> String {
    let trimmed = script.trim();
    if trimmed.starts_with("return") {
        trimmed.to_string()
    } else {
        format!("return {}", trimmed)
    }
}
