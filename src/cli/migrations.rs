//! Database migration operations.

use std::io;

use patchtester::PatchTesterConfig;
use patchtester::patch::map_persistence_error;
use patchtester::persistence::migrate_database;
use patchtester::telemetry::StderrJsonlTelemetrySink;

use super::CliError;
use super::output::write_schema_version;

/// Runs database migrations.
///
/// # Errors
///
/// Returns a configuration error if the database URL is missing or blank and
/// a database error for connection or migration failures.
pub fn run(config: &PatchTesterConfig) -> Result<(), CliError> {
    let database_url = config.require_database_url()?;

    let telemetry = StderrJsonlTelemetrySink;
    let version = migrate_database(database_url, &telemetry)
        .map_err(|error| map_persistence_error("migrate database", &error))?;

    write_schema_version(&mut io::stdout().lock(), &version)
}
