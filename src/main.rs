//! Patch tester CLI entrypoint.

use std::io::{self, Write};
use std::process::ExitCode;

use ortho_config::OrthoConfig;
use patchtester::{OperationMode, PatchError, PatchTesterConfig};
use tracing_subscriber::EnvFilter;

mod cli;

use cli::CliError;

const REPAIR_NOTE: &str = "note: the working tree or the patch tester database may be \
                           partially changed and need manual repair";

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            let mut stderr = io::stderr().lock();
            if writeln!(stderr, "{error}").is_err() {
                return ExitCode::FAILURE;
            }
            if error.is_unsafe() && writeln!(stderr, "{REPAIR_NOTE}").is_err() {
                return ExitCode::FAILURE;
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), CliError> {
    let config = load_config()?;

    match config.operation_mode() {
        OperationMode::MigrateDatabase => cli::migrations::run(&config),
        OperationMode::Sync => cli::sync::run(&config).await,
        OperationMode::List => cli::list::run(&config),
        OperationMode::Apply(pull_id) => cli::apply::run(&config, pull_id).await,
        OperationMode::Revert(test_id) => cli::revert::run(&config, test_id),
    }
}

/// Logs go to stderr so stdout stays parseable; `RUST_LOG` overrides the
/// default `warn` level.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// Loads configuration from CLI, environment, and files.
///
/// # Errors
///
/// Returns [`PatchError::Configuration`] when ortho-config fails to parse
/// arguments or load configuration files.
fn load_config() -> Result<PatchTesterConfig, PatchError> {
    PatchTesterConfig::load().map_err(|error| PatchError::Configuration {
        message: error.to_string(),
    })
}
