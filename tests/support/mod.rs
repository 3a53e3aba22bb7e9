#![allow(dead_code)]

use std::sync::Arc;

use action_primitives::fake::FakeDriver;
use async_trait::async_trait;
use parking_lot::Mutex;
use webbind::{EvalError, Evaluators, ScriptArg, Settings, TargetType, WebSession};

/// Session over an in-memory driver with the default evaluators.
pub fn session(settings: Settings) -> (Arc<FakeDriver>, WebSession) {
    let driver = Arc::new(FakeDriver::new());
    let session = WebSession::builder(driver.clone())
        .with_settings(settings)
        .build();
    (driver, session)
}

/// Session whose evaluators are recorded instead of run.
pub fn scripted_session(settings: Settings) -> (Arc<FakeDriver>, Arc<ScriptedEvaluators>, WebSession) {
    let driver = Arc::new(FakeDriver::new());
    let evaluators = Arc::new(ScriptedEvaluators::default());
    let session = WebSession::builder(driver.clone())
        .with_settings(settings)
        .with_evaluators(evaluators.clone())
        .build();
    (driver, evaluators, session)
}

/// Bind `<element>/locator` and its expression in the current scope.
pub fn locate(session: &WebSession, element: &str, strategy: &str, expression: &str) {
    session.bind(&format!("{}/locator", element), strategy);
    session.bind(&format!("{}/locator/{}", element, strategy), expression);
}

#[derive(Default)]
pub struct ScriptedEvaluators {
    calls: Mutex<Vec<String>>,
}

impl ScriptedEvaluators {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().push(call);
    }
}

#[async_trait]
impl Evaluators for ScriptedEvaluators {
    async fn execute_script(&self, script: &str, _args: &[ScriptArg]) -> Result<String, EvalError> {
        self.record(format!("javascript: {}", script));
        Ok(format!("evaluated({})", script))
    }

    async fn evaluate_xpath(
        &self,
        expression: &str,
        source: &str,
        target: TargetType,
    ) -> Result<String, EvalError> {
        self.record(format!("xpath: {} on {} as {}", expression, source, target.name()));
        Ok(format!("xpath({})", expression))
    }

    async fn extract_by_regex(&self, expression: &str, source: &str) -> Result<String, EvalError> {
        self.record(format!("regex: {} on {}", expression, source));
        Ok(format!("regex({})", expression))
    }

    async fn evaluate_json_path(&self, expression: &str, source: &str) -> Result<String, EvalError> {
        self.record(format!("json path: {} on {}", expression, source));
        Ok(format!("json({})", expression))
    }

    async fn run_process(&self, command: &str) -> Result<String, EvalError> {
        self.record(format!("sysproc: {}", command));
        Ok(format!("ran({})", command))
    }

    async fn read_file(&self, path: &str) -> Result<String, EvalError> {
        self.record(format!("file: {}", path));
        Err(EvalError::FileNotFound(path.to_string()))
    }
}
