//! Diesel-backed migration runner for the local `SQLite` database.

use diesel::sqlite::SqliteConnection;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use tracing::debug;

use crate::telemetry::{TelemetryEvent, TelemetrySink};

use super::PersistenceError;
use super::connection::DatabaseUrl;

/// Embedded Diesel migrations shipped with the binary.
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Schema version recorded by the migration that creates the pull, test, and
/// asset-version tables.
pub const INITIAL_SCHEMA_VERSION: &str = "20261019000000";

/// Schema version expected after every embedded migration has run.
pub const CURRENT_SCHEMA_VERSION: &str = INITIAL_SCHEMA_VERSION;

/// A Diesel migration version string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaVersion(String);

impl SchemaVersion {
    /// Returns the inner version string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Brings the database at `database_url` up to [`CURRENT_SCHEMA_VERSION`].
///
/// Creates the file when it does not exist. The resulting version is recorded
/// in telemetry.
///
/// # Errors
///
/// Returns [`PersistenceError`] when the database cannot be opened, a
/// migration fails, or no applied migration can be found afterwards.
pub fn migrate_database(
    database_url: &str,
    telemetry: &dyn TelemetrySink,
) -> Result<SchemaVersion, PersistenceError> {
    let mut connection = DatabaseUrl::new(database_url)?.establish()?;

    let applied = connection
        .run_pending_migrations(MIGRATIONS)
        .map_err(|error| PersistenceError::MigrationFailed {
            message: error.to_string(),
        })?;
    debug!(applied = applied.len(), "database migrations run");

    let schema_version = latest_applied_version(&mut connection)?;
    telemetry.record(TelemetryEvent::SchemaVersionRecorded {
        schema_version: schema_version.as_str().to_owned(),
    });

    Ok(schema_version)
}

fn latest_applied_version(
    connection: &mut SqliteConnection,
) -> Result<SchemaVersion, PersistenceError> {
    let versions = connection.applied_migrations().map_err(|error| {
        PersistenceError::SchemaVersionQueryFailed {
            message: error.to_string(),
        }
    })?;

    versions
        .into_iter()
        .max()
        .map(|version| SchemaVersion(version.to_string()))
        .ok_or(PersistenceError::MissingSchemaVersion)
}
