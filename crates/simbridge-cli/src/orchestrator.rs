//! Sequencing of the shim pipeline.
//!
//! Validate inputs, resolve the toolchain, merge the configuration, write
//! it to a transient file, unpack the engine, run it while streaming its
//! output, relocate its artifacts, and hand the engine's exit code back to
//! the caller. Temporary resources (the unpack directory and the config
//! file) are scoped values, so they are released on every exit path; the
//! config file is retained for inspection only under `--verbose`.

use std::path::{Path, PathBuf};

use simbridge_core::config::EngineConfig;
use simbridge_core::{merge, outputs, process, toolchain, unpack};
use tempfile::NamedTempFile;

use crate::embedded;
use crate::error::ShimError;
use crate::{Cli, Command};

/// Run the selected execution mode and return the process exit code.
pub fn run(cli: &Cli) -> Result<i32, ShimError> {
    if cli.xctestrun.is_some() || cli.signing_options_json_path.is_some() || cli.test_type.is_some()
    {
        tracing::debug!("ignoring xctestrun/signing_options/test_type compatibility options");
    }

    match &cli.command {
        Command::SimulatorTest {
            device_type,
            os_version,
            new_simulator_name,
            sim_count,
        } => {
            if new_simulator_name.is_some() {
                tracing::debug!("ignoring --new_simulator_name");
            }
            simulator_test(cli, device_type.as_deref(), os_version.as_deref(), *sim_count)
        }
    }
}

fn simulator_test(
    cli: &Cli,
    device_type: Option<&str>,
    os_version: Option<&str>,
    sim_count: u32,
) -> Result<i32, ShimError> {
    let app = require(&cli.app_under_test_path, "--app_under_test_path")?;
    let test_bundle = require(&cli.test_bundle_path, "--test_bundle_path")?;
    let work_dir = require(&cli.work_dir, "--work_dir")?;
    let output_dir = require(
        &cli.output_dir,
        "--output_dir (or TEST_UNDECLARED_OUTPUTS_DIR)",
    )?;
    let xml_dest = require(&cli.xml_output_file, "--xml_output_file (or XML_OUTPUT_FILE)")?;

    let xcode_path = toolchain::developer_dir()?;
    tracing::debug!("Xcode: {}", xcode_path.display());

    std::fs::create_dir_all(work_dir)?;
    std::fs::create_dir_all(output_dir)?;

    let base = build_base_config(
        app,
        test_bundle,
        work_dir,
        xcode_path,
        device_type,
        os_version,
        sim_count,
    );
    let config = merge::merge(
        base,
        cli.attr_config_json_path.as_deref(),
        cli.config_json_path.as_deref(),
        cli.launch_options_json_path.as_deref(),
    )?;

    // `_config_guard` keeps the transient file alive for the engine run and
    // deletes it on drop; under --verbose the file is kept for postmortem.
    let (config_path, _config_guard) = write_config(&config, cli.verbose)?;

    let exit_code = {
        let tools = unpack::unpack(
            &embedded::registry(),
            &[embedded::ENGINE, embedded::ENGINE_WORKER],
        )?;
        let args = [
            "-c".to_string(),
            config_path.to_string_lossy().into_owned(),
            "-n".to_string(),
            config.num_sims.to_string(),
        ];
        process::run(&tools.path(embedded::ENGINE), &args)?
        // The unpack directory is removed here, whatever the engine did.
    };
    tracing::debug!(exit_code, "engine finished");

    let collected = outputs::collect(work_dir, output_dir, xml_dest)?;
    tracing::info!(
        report = %collected.report.display(),
        profile = collected.profile.is_some(),
        "collected engine outputs"
    );

    Ok(exit_code)
}

fn require<'a>(value: &'a Option<PathBuf>, flag: &str) -> Result<&'a PathBuf, ShimError> {
    value
        .as_ref()
        .ok_or_else(|| ShimError::Usage(format!("missing required argument: {flag}")))
}

fn build_base_config(
    app: &Path,
    test_bundle: &Path,
    work_dir: &Path,
    xcode_path: PathBuf,
    device_type: Option<&str>,
    os_version: Option<&str>,
    sim_count: u32,
) -> EngineConfig {
    let mut config = EngineConfig::default();
    config.app = app.to_path_buf();
    config.test_bundle_path = test_bundle.to_path_buf();
    config.output_dir = work_dir.to_path_buf();
    config.xcode_path = xcode_path;
    config.num_sims = sim_count;
    if let Some(device) = device_type {
        config.device = device.to_string();
    }
    if let Some(version) = os_version {
        config.runtime = format!("iOS {version}");
    }
    config
}

/// Serialize the config to a transient file. Returns the file's path and,
/// unless `keep` is set, a guard whose drop removes it.
fn write_config(
    config: &EngineConfig,
    keep: bool,
) -> Result<(PathBuf, Option<NamedTempFile>), ShimError> {
    let json = config
        .to_json()
        .map_err(simbridge_core::merge::ConfigError::from)?;
    let file = tempfile::Builder::new()
        .prefix("simbridge-config-")
        .suffix(".json")
        .tempfile()?;
    std::fs::write(file.path(), &json)?;

    if keep {
        let (_, path) = file.keep().map_err(|e| ShimError::Io(e.error))?;
        tracing::info!("engine config retained at {}", path.display());
        Ok((path, None))
    } else {
        Ok((file.path().to_path_buf(), Some(file)))
    }
}
