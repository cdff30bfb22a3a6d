//! xctestrunner-compatible CLI shim that drives the parsim engine.
//!
//! The invoking build framework calls this binary with the standardized
//! test-runner contract (underscored long flags, environment-supplied output
//! locations). The shim translates that contract into a parsim config file,
//! runs the engine, and relocates its artifacts to where the framework
//! expects them.
//!
//! # Usage
//!
//! ```bash
//! simbridge \
//!     --app_under_test_path /path/to/App.app \
//!     --test_bundle_path /path/to/AppTests.xctest \
//!     --work_dir /tmp/work \
//!     --output_dir "$TEST_UNDECLARED_OUTPUTS_DIR" \
//!     --launch_options_json_path launch_options.json \
//!     simulator_test --device_type "iPhone 6" --os_version 12.1
//! ```
//!
//! The exit code is the engine's own exit code (0 = all tests passed);
//! shim-side failures use reserved codes of their own so callers can tell
//! "tests failed" from "harness failed".

mod embedded;
mod error;
mod orchestrator;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// xctestrunner-compatible shim around the parsim parallel test engine.
#[derive(Parser)]
#[command(name = "simbridge")]
#[command(about = "Run XCTest bundles through the parsim parallel simulator engine")]
#[command(version)]
pub struct Cli {
    /// Increase output verbosity.
    #[arg(short, long)]
    pub verbose: bool,

    /// The path of the application to be tested.
    #[arg(long = "app_under_test_path")]
    pub app_under_test_path: Option<PathBuf>,

    /// The path of the test bundle that contains the tests.
    #[arg(long = "test_bundle_path")]
    pub test_bundle_path: Option<PathBuf>,

    /// Accepted for contract compatibility; unused.
    #[arg(long = "xctestrun", hide = true)]
    pub xctestrun: Option<PathBuf>,

    /// Launch-options JSON file (env_vars, tests_to_run).
    #[arg(long = "launch_options_json_path")]
    pub launch_options_json_path: Option<PathBuf>,

    /// Accepted for contract compatibility; unused.
    #[arg(long = "signing_options_json_path", hide = true)]
    pub signing_options_json_path: Option<PathBuf>,

    /// Accepted for contract compatibility; unused.
    #[arg(long = "test_type", hide = true)]
    pub test_type: Option<String>,

    /// Directory the engine writes its reports into.
    #[arg(long = "work_dir")]
    pub work_dir: Option<PathBuf>,

    /// Directory declared test outputs are copied to.
    #[arg(long = "output_dir", env = "TEST_UNDECLARED_OUTPUTS_DIR")]
    pub output_dir: Option<PathBuf>,

    /// Attribute-derived engine config (JSON).
    #[arg(long = "attr_config_json_path")]
    pub attr_config_json_path: Option<PathBuf>,

    /// Rule-level engine config (JSON); overrides the attribute config
    /// key-by-key.
    #[arg(long = "config_json_path")]
    pub config_json_path: Option<PathBuf>,

    /// Destination path for the canonical XML test report.
    #[arg(long = "xml_output_file", env = "XML_OUTPUT_FILE")]
    pub xml_output_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the test bundle on simulators (the only execution mode).
    #[command(name = "simulator_test")]
    SimulatorTest {
        /// Simulator device type, e.g. "iPhone 6".
        #[arg(long = "device_type")]
        device_type: Option<String>,

        /// OS version, e.g. "12.1".
        #[arg(long = "os_version")]
        os_version: Option<String>,

        /// Accepted for contract compatibility; ignored.
        #[arg(long = "new_simulator_name", hide = true)]
        new_simulator_name: Option<String>,

        /// Number of simulators the engine may run in parallel.
        #[arg(long = "sim_count", default_value_t = 1)]
        sim_count: u32,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!("args: {:?}", std::env::args().collect::<Vec<_>>());
    tracing::debug!("env: {:?}", std::env::vars().collect::<Vec<_>>());

    let code = match orchestrator::run(&cli) {
        Ok(code) => {
            tracing::info!("Done.");
            code
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            e.exit_code()
        }
    };
    std::process::exit(code);
}
