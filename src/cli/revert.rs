//! Reverting an applied test.

use std::io;

use patchtester::PatchTesterConfig;
use patchtester::telemetry::{StderrJsonlTelemetrySink, TelemetryEvent, TelemetrySink};

use super::CliError;
use super::context::{LocalStores, OfflineGateway};
use super::output::write_revert_outcome;

/// Reverts applied test `test_id` from local backups.
///
/// # Errors
///
/// Returns the engine's failure. Unsafe failures may leave the tree partially
/// restored.
pub fn run(config: &PatchTesterConfig, test_id: u64) -> Result<(), CliError> {
    let stores = LocalStores::open(config)?;

    stores.engine(&OfflineGateway).revert(test_id)?;
    StderrJsonlTelemetrySink.record(TelemetryEvent::PatchReverted { test_id });

    write_revert_outcome(&mut io::stdout().lock(), test_id)
}
