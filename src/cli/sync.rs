//! Mirroring open pull requests into the registry.

use std::io;

use patchtester::patch::map_persistence_read_error;
use patchtester::persistence::PullFilter;
use patchtester::telemetry::{StderrJsonlTelemetrySink, TelemetryEvent, TelemetrySink};
use patchtester::{PatchTesterConfig, PullListSynchronizer, PullRepository};
use tracing::info;

use super::CliError;
use super::context::{Registries, open_gateway};
use super::output::{write_sync_progress, write_sync_summary};

/// Synchronises every page of open pull requests, printing progress.
///
/// # Errors
///
/// Returns the first synchronisation failure. Pages stored before it are
/// kept.
pub async fn run(config: &PatchTesterConfig) -> Result<(), CliError> {
    let gateway = open_gateway(config)?;
    let registries = Registries::open(config)?;
    let mut synchronizer = PullListSynchronizer::new(
        &gateway,
        &registries.pulls,
        &registries.tests,
        config.sync_settings(),
    );

    let mut progress_error = None;
    let pages = synchronizer
        .sync_all(|page, last_page| {
            if let Err(error) = write_sync_progress(&mut io::stdout(), page, last_page) {
                progress_error.get_or_insert(error);
            }
        })
        .await?;
    if let Some(error) = progress_error {
        return Err(error);
    }

    StderrJsonlTelemetrySink.record(TelemetryEvent::PullsSynchronised { pages });
    let stored = registries
        .pulls
        .count(&PullFilter::default())
        .map_err(|error| map_persistence_read_error("count pull requests", &error))?;
    info!(pages, stored, "synchronisation finished");

    write_sync_summary(&mut io::stdout().lock(), pages, stored)
}
