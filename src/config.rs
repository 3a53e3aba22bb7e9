//! Process settings
//!
//! Settings are read once at startup: built-in defaults, then an optional
//! YAML file, then `WEBBIND__<FIELD>` environment overlays.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

use action_locator::{EnvDefaults, ResolverOptions};
use action_primitives::{InteractionPolicy, WaitPolicy};

const ENV_PREFIX: &str = "WEBBIND__";
const LOCAL_CONFIG: &str = "config/webbind.yaml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read settings file {path}: {reason}")]
    Io { path: String, reason: String },

    #[error("Invalid settings: {0}")]
    Invalid(String),
}

/// Typed, read-only process settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Default budget for waits, in seconds
    pub wait_timeout_secs: u64,

    /// Sleep between wait retries and after script actions (milliseconds)
    pub throttle_ms: u64,

    /// Interval between condition evaluations (milliseconds)
    pub poll_interval_ms: u64,

    pub capture_screenshots: bool,

    /// Inline CSS applied by `highlight`
    pub highlight_style: String,

    /// How long a highlight stays on (milliseconds)
    pub highlight_ms: u64,

    /// Validate bindings without touching the browser
    pub dry_run: bool,

    /// Deepest nesting of binding lookups
    pub max_binding_depth: usize,

    /// Base properties consulted before environment variables
    pub properties: BTreeMap<String, String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            wait_timeout_secs: 10,
            throttle_ms: 200,
            poll_interval_ms: 250,
            capture_screenshots: false,
            highlight_style: "background: yellow; border: 2px solid gold;".to_string(),
            highlight_ms: 0,
            dry_run: false,
            max_binding_depth: 16,
            properties: BTreeMap::new(),
        }
    }
}

impl Settings {
    pub fn interaction_policy(&self) -> InteractionPolicy {
        InteractionPolicy {
            capture_screenshots: self.capture_screenshots,
            highlight_style: self.highlight_style.clone(),
            highlight_ms: self.highlight_ms,
            throttle_ms: self.throttle_ms,
        }
    }

    pub fn wait_policy(&self) -> WaitPolicy {
        WaitPolicy {
            default_timeout_ms: self.wait_timeout_secs.saturating_mul(1000),
            throttle_ms: self.throttle_ms,
            poll_interval_ms: self.poll_interval_ms,
        }
    }

    pub fn resolver_options(&self) -> ResolverOptions {
        ResolverOptions {
            dry_run: self.dry_run,
            max_depth: self.max_binding_depth,
        }
    }

    pub fn env_defaults(&self) -> EnvDefaults {
        EnvDefaults::new(self.properties.clone().into_iter().collect())
    }
}

pub struct LoadedSettings {
    pub settings: Settings,
    /// File the settings were read from, when one existed
    pub path: Option<PathBuf>,
}

/// Load settings: defaults, then the YAML file, then environment overlays.
///
/// Without an explicit path, `config/webbind.yaml` is tried first and then
/// `<config dir>/webbind/webbind.yaml`. A missing file is not an error.
pub fn load_settings(path: Option<&Path>) -> Result<LoadedSettings, ConfigError> {
    let candidate = match path {
        Some(path) => Some(path.to_path_buf()),
        None => default_path(),
    };

    let mut merged = serde_json::to_value(Settings::default())
        .map_err(|err| ConfigError::Invalid(err.to_string()))?;

    let mut source = None;
    if let Some(candidate) = candidate.filter(|p| p.exists()) {
        let file = read_file(&candidate)?;
        merge(&mut merged, file);
        info!("Loaded settings from: {}", candidate.display());
        source = Some(candidate);
    }

    for (path, value) in overlays_from_env(env::vars()) {
        debug!(setting = %path.join("."), "applying environment overlay");
        apply_overlay(&mut merged, &path, value);
    }

    let settings = serde_json::from_value(merged)
        .map_err(|err| ConfigError::Invalid(err.to_string()))?;
    Ok(LoadedSettings {
        settings,
        path: source,
    })
}

fn default_path() -> Option<PathBuf> {
    let local = PathBuf::from(LOCAL_CONFIG);
    if local.exists() {
        return Some(local);
    }
    let mut path = dirs::config_dir()?;
    path.push("webbind");
    path.push("webbind.yaml");
    Some(path)
}

fn read_file(path: &Path) -> Result<Value, ConfigError> {
    let content = fs::read_to_string(path).map_err(|err| ConfigError::Io {
        path: path.display().to_string(),
        reason: err.to_string(),
    })?;
    if content.trim().is_empty() {
        return Ok(Value::Object(Map::new()));
    }
    let yaml: serde_yaml::Value =
        serde_yaml::from_str(&content).map_err(|err| ConfigError::Invalid(err.to_string()))?;
    serde_json::to_value(yaml).map_err(|err| ConfigError::Invalid(err.to_string()))
}

/// Recursively merge `overlay` objects into `base`; other values replace.
fn merge(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base), Value::Object(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => merge(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

fn overlays_from_env(vars: impl Iterator<Item = (String, String)>) -> Vec<(Vec<String>, Value)> {
    let mut overlays = Vec::new();
    for (key, raw) in vars {
        let Some(stripped) = key.strip_prefix(ENV_PREFIX) else {
            continue;
        };
        let mut segments: Vec<String> = stripped
            .split("__")
            .filter(|segment| !segment.is_empty())
            .map(str::to_string)
            .collect();
        if segments.is_empty() {
            continue;
        }
        // field names are case-insensitive; property names keep their case
        segments[0] = segments[0].to_ascii_lowercase();
        let value = if segments[0] == "properties" {
            Value::String(raw)
        } else {
            parse_env_value(&raw)
        };
        overlays.push((segments, value));
    }
    overlays
}

fn apply_overlay(root: &mut Value, path: &[String], value: Value) {
    let Some((last, parents)) = path.split_last() else {
        return;
    };
    let mut current = root;
    for segment in parents {
        if !current.is_object() {
            *current = Value::Object(Map::new());
        }
        current = match current {
            Value::Object(map) => map
                .entry(segment.clone())
                .or_insert_with(|| Value::Object(Map::new())),
            _ => return,
        };
    }
    if !current.is_object() {
        *current = Value::Object(Map::new());
    }
    if let Value::Object(map) = current {
        map.insert(last.clone(), value);
    }
}

fn parse_env_value(raw: &str) -> Value {
    if raw.is_empty() {
        return Value::String(String::new());
    }
    if let Ok(parsed) = serde_json::from_str::<Value>(raw) {
        return parsed;
    }
    if let Ok(boolean) = raw.parse::<bool>() {
        return Value::Bool(boolean);
    }
    if let Ok(int_val) = raw.parse::<i64>() {
        return Value::Number(int_val.into());
    }
    Value::String(raw.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;

    #[test]
    fn defaults_match_documented_values() {
        let settings = Settings::default();
        assert_eq!(settings.wait_policy().default_timeout_ms, 10_000);
        assert_eq!(settings.interaction_policy().throttle_ms, 200);
        assert_eq!(settings.resolver_options().max_depth, 16);
        assert!(!settings.resolver_options().dry_run);
    }

    #[test]
    fn env_overlays_parse_values_and_paths() {
        let vars = vec![
            ("WEBBIND__DRY_RUN".to_string(), "true".to_string()),
            ("WEBBIND__WAIT_TIMEOUT_SECS".to_string(), "3".to_string()),
            ("WEBBIND__PROPERTIES__Base.Url".to_string(), "42".to_string()),
            ("OTHER".to_string(), "x".to_string()),
            ("WEBBIND__".to_string(), "ignored".to_string()),
        ];
        let overlays = overlays_from_env(vars.into_iter());

        assert_eq!(overlays.len(), 3);
        assert_eq!(overlays[0], (vec!["dry_run".to_string()], Value::Bool(true)));
        assert_eq!(
            overlays[2],
            (
                vec!["properties".to_string(), "Base.Url".to_string()],
                Value::String("42".to_string())
            )
        );
    }

    #[test]
    #[serial]
    fn file_then_env_layering() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "wait_timeout_secs: 5\nhighlight_ms: 300\nproperties:\n  base url: https://example.test"
        )
        .unwrap();
        env::set_var("WEBBIND__HIGHLIGHT_MS", "750");

        let loaded = load_settings(Some(file.path())).unwrap();
        env::remove_var("WEBBIND__HIGHLIGHT_MS");

        assert_eq!(loaded.path.as_deref(), Some(file.path()));
        assert_eq!(loaded.settings.wait_timeout_secs, 5);
        assert_eq!(loaded.settings.highlight_ms, 750);
        assert_eq!(loaded.settings.throttle_ms, 200);
        assert_eq!(
            loaded.settings.properties.get("base url").map(String::as_str),
            Some("https://example.test")
        );
    }

    #[test]
    #[serial]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = load_settings(Some(&dir.path().join("absent.yaml"))).unwrap();

        assert!(loaded.path.is_none());
        assert_eq!(loaded.settings, Settings::default());
    }

    #[test]
    #[serial]
    fn malformed_file_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "wait_timeout_secs: [not, a, number]").unwrap();

        assert!(matches!(
            load_settings(Some(file.path())),
            Err(ConfigError::Invalid(_))
        ));
    }
}
