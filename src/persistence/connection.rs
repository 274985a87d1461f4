//! Shared `SQLite` connection handling for the registries.
//!
//! Each registry opens a short-lived connection per operation, mirroring the
//! request-scoped lifetime of the operations they serve.

use diesel::Connection;
use diesel::QueryableByName;
use diesel::RunQueryDsl;
use diesel::sql_query;
use diesel::sql_types::{BigInt, Text};
use diesel::sqlite::SqliteConnection;

use super::PersistenceError;

/// Validated database URL shared by the `SQLite` registries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct DatabaseUrl(String);

impl DatabaseUrl {
    pub(super) fn new(database_url: impl Into<String>) -> Result<Self, PersistenceError> {
        let value = database_url.into();
        if value.trim().is_empty() {
            return Err(PersistenceError::BlankDatabaseUrl);
        }
        Ok(Self(value))
    }

    pub(super) fn establish(&self) -> Result<SqliteConnection, PersistenceError> {
        let mut connection = SqliteConnection::establish(self.0.trim()).map_err(|error| {
            PersistenceError::ConnectionFailed {
                message: error.to_string(),
            }
        })?;

        sql_query("PRAGMA foreign_keys = ON;")
            .execute(&mut connection)
            .map(drop)
            .map_err(|error| PersistenceError::ForeignKeysEnableFailed {
                message: error.to_string(),
            })?;

        Ok(connection)
    }
}

pub(super) fn table_exists(
    connection: &mut SqliteConnection,
    table: &str,
) -> Result<bool, diesel::result::Error> {
    #[derive(Debug, QueryableByName)]
    struct Row {
        #[diesel(sql_type = BigInt)]
        count: i64,
    }

    let row: Row = sql_query(
        "SELECT COUNT(*) AS count FROM sqlite_master WHERE type = 'table' AND name = ?;",
    )
    .bind::<Text, _>(table)
    .get_result(connection)?;

    Ok(row.count > 0)
}

fn map_error_with_schema_check<F>(
    connection: &mut SqliteConnection,
    table: &str,
    error: &diesel::result::Error,
    create_error: F,
) -> PersistenceError
where
    F: Fn(String) -> PersistenceError,
{
    match table_exists(connection, table) {
        Ok(false) => PersistenceError::SchemaNotInitialised,
        Ok(true) => create_error(error.to_string()),
        Err(check_error) => create_error(format!(
            "schema presence check failed: {check_error}; original error: {error}"
        )),
    }
}

pub(super) fn map_query_error(
    connection: &mut SqliteConnection,
    table: &str,
    error: &diesel::result::Error,
) -> PersistenceError {
    map_error_with_schema_check(connection, table, error, |message| {
        PersistenceError::QueryFailed { message }
    })
}

pub(super) fn map_write_error(
    connection: &mut SqliteConnection,
    table: &str,
    error: &diesel::result::Error,
) -> PersistenceError {
    map_error_with_schema_check(connection, table, error, |message| {
        PersistenceError::WriteFailed { message }
    })
}

/// Converts a `u64` identifier into the `i64` that `SQLite` stores.
pub(super) fn id_to_i64(id: u64) -> i64 {
    i64::try_from(id).unwrap_or(i64::MAX)
}

/// Converts a stored `i64` identifier back to `u64`, clamping negatives.
pub(super) fn id_from_i64(id: i64) -> u64 {
    u64::try_from(id).unwrap_or(0)
}
