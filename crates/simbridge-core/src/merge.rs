//! Combining configuration sources into one [`EngineConfig`].
//!
//! Sources apply in a fixed precedence order, later ones overwriting earlier
//! ones key-by-key (a shallow overlay, not a deep merge):
//!
//! 1. the caller-supplied base (defaults plus CLI-derived values)
//! 2. the attribute-derived config file
//! 3. the rule-level config file
//! 4. the launch-options file, which is not a full config: it only replaces
//!    `environmentVariables` wholesale and, when its `tests_to_run` list is
//!    non-empty, sets the test-inclusion list
//!
//! The rule config always wins over the attribute config; that ordering is
//! load-bearing for callers. File sources use the engine's serialized key
//! spelling (see [`crate::config`]); keys the model does not know are
//! ignored. The merger never writes the result to disk.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::config::EngineConfig;

/// Errors from reading or combining configuration sources.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A referenced config source does not exist.
    #[error("config source not found: {0}")]
    Missing(PathBuf),

    /// A config source could not be read.
    #[error("failed to read config source {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A config source is not valid JSON.
    #[error("invalid JSON in config source {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// A config source parsed, but is not a JSON object.
    #[error("config source {0} is not a JSON object")]
    NotAnObject(PathBuf),

    /// Re-serialization of the merged configuration failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// The framework-standard launch-options file.
///
/// Independent of the engine's own config format: only environment variables
/// and a test-inclusion list.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LaunchOptions {
    /// Environment injected into the app under test.
    #[serde(default)]
    pub env_vars: BTreeMap<String, String>,

    /// Test identifiers to run; empty means "run everything".
    #[serde(default)]
    pub tests_to_run: Vec<String>,
}

/// Merge the optional file sources into `base` under the fixed precedence
/// order. Every source path that is present must exist and parse.
pub fn merge(
    base: EngineConfig,
    attr_config: Option<&Path>,
    rule_config: Option<&Path>,
    launch_options: Option<&Path>,
) -> Result<EngineConfig, ConfigError> {
    let mut value = serde_json::to_value(&base)?;

    if let Some(path) = attr_config {
        overlay(&mut value, path)?;
    }
    if let Some(path) = rule_config {
        overlay(&mut value, path)?;
    }

    let mut config: EngineConfig = serde_json::from_value(value)?;

    if let Some(path) = launch_options {
        let options = load_launch_options(path)?;
        tracing::debug!(
            path = %path.display(),
            env_vars = options.env_vars.len(),
            tests_to_run = options.tests_to_run.len(),
            "applying launch options"
        );
        config.environment_variables = options.env_vars;
        if !options.tests_to_run.is_empty() {
            config.include = Some(options.tests_to_run);
        }
    }

    Ok(config)
}

/// Overwrite keys of `base` with the top-level keys of the JSON object at
/// `path`. Keys absent from the file keep their current value.
fn overlay(base: &mut Value, path: &Path) -> Result<(), ConfigError> {
    let object = load_object(path)?;
    // `base` is the serialization of a struct, so it is always an object.
    if let Value::Object(target) = base {
        for (key, value) in object {
            tracing::debug!(source = %path.display(), key = %key, "config override");
            target.insert(key, value);
        }
    }
    Ok(())
}

fn load_object(path: &Path) -> Result<serde_json::Map<String, Value>, ConfigError> {
    let value: Value = serde_json::from_slice(&read_source(path)?).map_err(|source| {
        ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        }
    })?;
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(ConfigError::NotAnObject(path.to_path_buf())),
    }
}

fn load_launch_options(path: &Path) -> Result<LaunchOptions, ConfigError> {
    serde_json::from_slice(&read_source(path)?).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn read_source(path: &Path) -> Result<Vec<u8>, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::Missing(path.to_path_buf()));
    }
    std::fs::read(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn write_source(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn no_sources_returns_base() {
        let mut base = EngineConfig::default();
        base.device = "iPhone 15".to_string();
        base.environment_variables
            .insert("KEEP".to_string(), "1".to_string());

        let merged = merge(base.clone(), None, None, None).unwrap();
        assert_eq!(merged, base);
    }

    #[test]
    fn rule_config_overrides_attr_config_key_by_key() {
        let dir = TempDir::new().unwrap();
        let attr = write_source(&dir, "attr.json", r#"{"device": "iPhone 8", "num-sims": 4}"#);
        let rule = write_source(&dir, "rule.json", r#"{"device": "iPhone X"}"#);

        let merged = merge(EngineConfig::default(), Some(&attr), Some(&rule), None).unwrap();

        // The rule value wins for keys present in both; attr-only keys survive.
        assert_eq!(merged.device, "iPhone X");
        assert_eq!(merged.num_sims, 4);
    }

    #[test]
    fn attr_config_alone_overrides_base() {
        let dir = TempDir::new().unwrap();
        let attr = write_source(&dir, "attr.json", r#"{"headless": false}"#);

        let merged = merge(EngineConfig::default(), Some(&attr), None, None).unwrap();
        assert!(!merged.headless);
        assert_eq!(merged.device, "iPhone 6");
    }

    #[test]
    fn unknown_keys_in_sources_are_ignored() {
        let dir = TempDir::new().unwrap();
        let attr = write_source(&dir, "attr.json", r#"{"not-an-engine-key": true}"#);

        let merged = merge(EngineConfig::default(), Some(&attr), None, None).unwrap();
        assert_eq!(merged, EngineConfig::default());
    }

    #[test]
    fn absent_launch_options_leaves_env_and_include_untouched() {
        let mut base = EngineConfig::default();
        base.environment_variables
            .insert("FOO".to_string(), "1".to_string());
        base.include = Some(vec!["T1".to_string()]);

        let merged = merge(base.clone(), None, None, None).unwrap();
        assert_eq!(merged.environment_variables, base.environment_variables);
        assert_eq!(merged.include, base.include);
    }

    #[test]
    fn launch_options_replace_env_wholesale() {
        let dir = TempDir::new().unwrap();
        let options = write_source(&dir, "launch.json", r#"{"env_vars": {"NEW": "2"}}"#);

        let mut base = EngineConfig::default();
        base.environment_variables
            .insert("OLD".to_string(), "1".to_string());

        let merged = merge(base, None, None, Some(&options)).unwrap();
        assert_eq!(merged.environment_variables.len(), 1);
        assert_eq!(merged.environment_variables.get("NEW").unwrap(), "2");
    }

    #[test]
    fn launch_options_without_env_vars_clear_env() {
        let dir = TempDir::new().unwrap();
        let options = write_source(&dir, "launch.json", r#"{"tests_to_run": ["T1"]}"#);

        let mut base = EngineConfig::default();
        base.environment_variables
            .insert("OLD".to_string(), "1".to_string());

        let merged = merge(base, None, None, Some(&options)).unwrap();
        assert!(merged.environment_variables.is_empty());
        assert_eq!(merged.include, Some(vec!["T1".to_string()]));
    }

    #[test]
    fn empty_tests_to_run_does_not_set_include() {
        let dir = TempDir::new().unwrap();
        let options = write_source(&dir, "launch.json", r#"{"env_vars": {}, "tests_to_run": []}"#);

        let merged = merge(EngineConfig::default(), None, None, Some(&options)).unwrap();
        assert!(merged.include.is_none());
    }

    #[test]
    fn missing_source_is_an_error() {
        let result = merge(
            EngineConfig::default(),
            Some(Path::new("/nonexistent/attr.json")),
            None,
            None,
        );
        assert!(matches!(result, Err(ConfigError::Missing(_))));
    }

    #[test]
    fn invalid_json_is_an_error() {
        let dir = TempDir::new().unwrap();
        let attr = write_source(&dir, "attr.json", "not json at all");

        let result = merge(EngineConfig::default(), Some(&attr), None, None);
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn non_object_source_is_an_error() {
        let dir = TempDir::new().unwrap();
        let attr = write_source(&dir, "attr.json", "[1, 2, 3]");

        let result = merge(EngineConfig::default(), Some(&attr), None, None);
        assert!(matches!(result, Err(ConfigError::NotAnObject(_))));
    }

    #[test]
    fn missing_launch_options_file_is_an_error() {
        let result = merge(
            EngineConfig::default(),
            None,
            None,
            Some(Path::new("/nonexistent/launch.json")),
        );
        assert!(matches!(result, Err(ConfigError::Missing(_))));
    }
}
