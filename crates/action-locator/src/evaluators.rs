//! Expression evaluators behind attribute bindings

use action_primitives::{script_value_to_string, Driver, ScriptArg};
use async_trait::async_trait;
use regex::Regex;
use serde_json::Value;
use std::io::ErrorKind;
use std::sync::Arc;
use tokio::process::Command;
use tracing::debug;

use crate::attribute::TargetType;
use crate::errors::EvalError;
use crate::json_path;

/// Pluggable evaluation of bound expressions.
///
/// Inputs are already interpolated; results are the string forms bound
/// values take.
#[async_trait]
pub trait Evaluators: Send + Sync {
    async fn execute_script(&self, script: &str, args: &[ScriptArg]) -> Result<String, EvalError>;

    async fn evaluate_xpath(
        &self,
        expression: &str,
        source: &str,
        target: TargetType,
    ) -> Result<String, EvalError>;

    async fn extract_by_regex(&self, expression: &str, source: &str) -> Result<String, EvalError>;

    async fn evaluate_json_path(&self, expression: &str, source: &str) -> Result<String, EvalError>;

    async fn run_process(&self, command: &str) -> Result<String, EvalError>;

    async fn read_file(&self, path: &str) -> Result<String, EvalError>;
}

/// Prefix `return ` so a bare expression yields its value.
pub fn return_script(script: &str) -> String {
    let trimmed = script.trim();
    if trimmed.starts_with("return ") || trimmed.starts_with("return;") {
        trimmed.to_string()
    } else {
        format!("return {}", trimmed)
    }
}

// Parses `arguments[0]` as XML when it carries a declaration, HTML
// otherwise, then applies `arguments[1]` shaped by `arguments[2]`.
const XPATH_SCRIPT: &str = r#"
var source = arguments[0], expression = arguments[1], target = arguments[2];
var type = source.trim().indexOf('<?xml') === 0 ? 'application/xml' : 'text/html';
var doc = new DOMParser().parseFromString(source, type);
var serialize = function (node) {
  return node.nodeType === 1 ? new XMLSerializer().serializeToString(node) : node.textContent;
};
if (target === 'text') {
  return doc.evaluate(expression, doc, null, XPathResult.STRING_TYPE, null).stringValue;
}
if (target === 'node') {
  var node = doc.evaluate(expression, doc, null, XPathResult.FIRST_ORDERED_NODE_TYPE, null).singleNodeValue;
  return node === null ? null : serialize(node);
}
var nodes = doc.evaluate(expression, doc, null, XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null);
var out = [];
for (var i = 0; i < nodes.snapshotLength; i++) { out.push(serialize(nodes.snapshotItem(i))); }
return out.join('\n');
"#;

/// Evaluators backed by the live session, the `regex` crate, an in-crate
/// JSON path subset, the shell and the filesystem.
#[derive(Clone)]
pub struct DefaultEvaluators {
    driver: Arc<dyn Driver>,
}

impl DefaultEvaluators {
    pub fn new(driver: Arc<dyn Driver>) -> Self {
        Self { driver }
    }
}

#[async_trait]
impl Evaluators for DefaultEvaluators {
    async fn execute_script(&self, script: &str, args: &[ScriptArg]) -> Result<String, EvalError> {
        let value = self.driver.execute_script(script, args).await?;
        Ok(script_value_to_string(&value))
    }

    async fn evaluate_xpath(
        &self,
        expression: &str,
        source: &str,
        target: TargetType,
    ) -> Result<String, EvalError> {
        let args = [
            ScriptArg::from(source),
            ScriptArg::from(expression),
            ScriptArg::from(target.name()),
        ];
        let value = self.driver.execute_script(XPATH_SCRIPT, &args).await?;
        match value {
            Value::Null => Err(EvalError::Failed(format!(
                "xpath '{}' matched no node",
                expression
            ))),
            other => Ok(script_value_to_string(&other)),
        }
    }

    async fn extract_by_regex(&self, expression: &str, source: &str) -> Result<String, EvalError> {
        let regex = Regex::new(expression)
            .map_err(|err| EvalError::Failed(format!("invalid regex '{}': {}", expression, err)))?;
        let captures = regex
            .captures(source)
            .ok_or_else(|| EvalError::Failed(format!("regex '{}' did not match", expression)))?;
        let matched = captures.get(1).or_else(|| captures.get(0));
        Ok(matched.map(|m| m.as_str().to_string()).unwrap_or_default())
    }

    async fn evaluate_json_path(&self, expression: &str, source: &str) -> Result<String, EvalError> {
        let root: Value = serde_json::from_str(source)
            .map_err(|err| EvalError::Failed(format!("source is not JSON: {}", err)))?;
        let matches = json_path::select(&root, expression).map_err(EvalError::Failed)?;
        match matches.as_slice() {
            [] => Err(EvalError::Failed(format!(
                "json path '{}' matched nothing",
                expression
            ))),
            [single] => Ok(script_value_to_string(single)),
            many => Ok(Value::Array(many.iter().map(|v| (*v).clone()).collect()).to_string()),
        }
    }

    async fn run_process(&self, command: &str) -> Result<String, EvalError> {
        debug!(command, "running process");
        let output = shell(command)
            .output()
            .await
            .map_err(|err| EvalError::Failed(format!("failed to start '{}': {}", command, err)))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(EvalError::Failed(format!(
                "'{}' exited with {}: {}",
                command,
                output.status,
                stderr.trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    async fn read_file(&self, path: &str) -> Result<String, EvalError> {
        match tokio::fs::read_to_string(path).await {
            Ok(contents) => Ok(contents),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                Err(EvalError::FileNotFound(path.to_string()))
            }
            Err(err) => Err(EvalError::Failed(format!("cannot read '{}': {}", path, err))),
        }
    }
}

#[cfg(windows)]
fn shell(command: &str) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.args(["/C", command]);
    cmd
}

#[cfg(not(windows))]
fn shell(command: &str) -> Command {
    let mut cmd = Command::new("sh");
    cmd.args(["-c", command]);
    cmd
}

#[cfg(test)]
mod tests {
    use super::*;
    use action_primitives::fake::FakeDriver;
    use serde_json::json;
    use std::io::Write;

    fn evaluators() -> (Arc<FakeDriver>, DefaultEvaluators) {
        let driver = Arc::new(FakeDriver::new());
        (driver.clone(), DefaultEvaluators::new(driver))
    }

    #[test]
    fn return_prefix_is_added_once() {
        assert_eq!(return_script("1 + 1"), "return 1 + 1");
        assert_eq!(return_script(" return document.title"), "return document.title");
    }

    #[tokio::test]
    async fn regex_prefers_first_group() {
        let (_, eval) = evaluators();
        assert_eq!(
            eval.extract_by_regex(r"order (\d+)", "your order 4411 shipped").await.unwrap(),
            "4411"
        );
        assert_eq!(eval.extract_by_regex(r"\d+", "abc 42").await.unwrap(), "42");
        assert!(eval.extract_by_regex(r"\d+", "none").await.is_err());
        assert!(eval.extract_by_regex(r"(", "x").await.is_err());
    }

    #[tokio::test]
    async fn json_path_stringifies_results() {
        let (_, eval) = evaluators();
        let source = r#"{"user": {"name": "ann", "ids": [3, 5]}}"#;
        assert_eq!(eval.evaluate_json_path("$.user.name", source).await.unwrap(), "ann");
        assert_eq!(eval.evaluate_json_path("$.user.ids[*]", source).await.unwrap(), "[3,5]");
        assert!(eval.evaluate_json_path("$.user.age", source).await.is_err());
        assert!(eval.evaluate_json_path("$.a", "not json").await.is_err());
    }

    #[tokio::test]
    async fn xpath_runs_in_the_page() {
        let (driver, eval) = evaluators();
        driver.on_script("DOMParser", vec![json!("Dune")]);

        let value = eval
            .evaluate_xpath("//title", "<?xml version=\"1.0\"?><b><title>Dune</title></b>", TargetType::Text)
            .await
            .unwrap();

        assert_eq!(value, "Dune");
        assert_eq!(driver.script_args()[0][2], ScriptArg::from("text"));
    }

    #[tokio::test]
    async fn xpath_without_match_fails() {
        let (_, eval) = evaluators();
        assert!(eval
            .evaluate_xpath("//x", "<a/>", TargetType::Node)
            .await
            .is_err());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn process_output_is_trimmed_and_failures_reported() {
        let (_, eval) = evaluators();
        assert_eq!(eval.run_process("echo '  hi  '").await.unwrap(), "hi");
        assert!(eval.run_process("exit 3").await.is_err());
    }

    #[tokio::test]
    async fn files_are_read_or_reported_missing() {
        let (_, eval) = evaluators();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "payload").unwrap();

        let path = file.path().to_string_lossy().to_string();
        assert_eq!(eval.read_file(&path).await.unwrap(), "payload");

        let missing = eval.read_file("definitely/missing.txt").await.unwrap_err();
        assert!(matches!(missing, EvalError::FileNotFound(_)));
    }
}
