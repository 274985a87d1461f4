//! Applying a pull request to the working tree.

use std::io;

use patchtester::PatchTesterConfig;
use patchtester::telemetry::{StderrJsonlTelemetrySink, TelemetryEvent, TelemetrySink};

use super::CliError;
use super::context::{LocalStores, open_gateway};
use super::output::write_apply_outcome;

/// Applies pull request `pull_id`.
///
/// # Errors
///
/// Returns the engine's failure. Unsafe failures may leave the tree partially
/// patched.
pub async fn run(config: &PatchTesterConfig, pull_id: u64) -> Result<(), CliError> {
    let gateway = open_gateway(config)?;
    let stores = LocalStores::open(config)?;

    let applied = stores.engine(&gateway).apply(pull_id).await?;
    if applied {
        StderrJsonlTelemetrySink.record(TelemetryEvent::PatchApplied { pull_id });
    }

    write_apply_outcome(&mut io::stdout().lock(), pull_id, applied)
}
