//! The engine configuration model.
//!
//! [`EngineConfig`] is the canonical form of everything the parsim engine
//! needs for one run. It is built fresh from [`Default`] for every
//! invocation, mutated only during the merge phase (see [`crate::merge`]),
//! serialized to a transient JSON file, and never touched after the engine
//! starts.
//!
//! The serialized key convention is the engine's, not ours: keys are
//! hyphenated (`test-bundle-path`), except for two legacy camelCase keys
//! (`commandLineArguments`, `environmentVariables`) carried by an explicit
//! rename table. Deserialization is tolerant of missing keys, which fall
//! back to the defaults; validation is the caller's job, not this layer's.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

fn default_device() -> String {
    "iPhone 6".to_string()
}

fn default_runtime() -> String {
    "iOS 12.1".to_string()
}

fn default_xcode_path() -> PathBuf {
    PathBuf::from("/Applications/Xcode.app/Contents/Developer")
}

fn default_num_sims() -> u32 {
    1
}

fn default_headless() -> bool {
    true
}

/// Configuration handed to the parsim engine via `-c <file>`.
///
/// The environment-variable map is ordered so that serialization is
/// deterministic across runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct EngineConfig {
    /// Path of the application bundle under test.
    #[serde(default)]
    pub app: PathBuf,

    /// Path of the `.xctest` bundle containing the tests.
    #[serde(default)]
    pub test_bundle_path: PathBuf,

    /// Directory the engine writes its reports and stats into.
    #[serde(default)]
    pub output_dir: PathBuf,

    /// Simulator device type, e.g. "iPhone 6".
    #[serde(default = "default_device")]
    pub device: String,

    /// Simulator runtime, e.g. "iOS 12.1".
    #[serde(default = "default_runtime")]
    pub runtime: String,

    /// Xcode Developer directory of the host toolchain.
    #[serde(default = "default_xcode_path")]
    pub xcode_path: PathBuf,

    /// How many simulators the engine may run in parallel.
    #[serde(default = "default_num_sims")]
    pub num_sims: u32,

    /// Arguments passed to the app under test at launch.
    #[serde(default, rename = "commandLineArguments")]
    pub command_line_arguments: Vec<String>,

    /// Environment injected into the app under test.
    #[serde(default, rename = "environmentVariables")]
    pub environment_variables: BTreeMap<String, String>,

    /// Run simulators without a UI.
    #[serde(default = "default_headless")]
    pub headless: bool,

    /// Test identifiers to run; `None` means the engine runs everything.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include: Option<Vec<String>>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            app: PathBuf::new(),
            test_bundle_path: PathBuf::new(),
            output_dir: PathBuf::new(),
            device: default_device(),
            runtime: default_runtime(),
            xcode_path: default_xcode_path(),
            num_sims: default_num_sims(),
            command_line_arguments: Vec::new(),
            environment_variables: BTreeMap::new(),
            headless: default_headless(),
            include: None,
        }
    }
}

impl EngineConfig {
    /// Serialize to the compact JSON object the engine consumes.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON. Missing keys fall back to the defaults.
    pub fn from_json(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(bytes)
    }
}
