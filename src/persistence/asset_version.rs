//! Global asset-cache version marker.
//!
//! Clients append the marker to asset URLs, so bumping it after the working
//! tree changes forces them to reload patched scripts and stylesheets.

use chrono::{DateTime, Utc};
use diesel::OptionalExtension;
use diesel::QueryableByName;
use diesel::RunQueryDsl;
use diesel::sql_query;
use diesel::sql_types::Text;
use sha2::{Digest, Sha256};

use super::PersistenceError;
use super::connection::{DatabaseUrl, map_query_error, map_write_error};

const ASSET_VERSION_TABLE: &str = "asset_version";

/// Invalidates client-side asset caches.
pub trait AssetCacheMarker: Send + Sync {
    /// Replaces the current marker with a fresh value and returns it.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] when the marker cannot be stored.
    fn bump(&self) -> Result<String, PersistenceError>;

    /// Returns the current marker, if one has been recorded.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] when the marker cannot be read.
    fn current(&self) -> Result<Option<String>, PersistenceError>;
}

/// SQLite-backed asset-cache marker stored in a single-row table.
#[derive(Debug, Clone)]
pub struct SqliteAssetCacheMarker {
    database_url: DatabaseUrl,
    host_version: String,
}

impl SqliteAssetCacheMarker {
    /// Creates a marker store targeting `database_url`.
    ///
    /// The host version is mixed into every generated marker.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::BlankDatabaseUrl`] when the URL is blank.
    pub fn new(
        database_url: impl Into<String>,
        host_version: impl Into<String>,
    ) -> Result<Self, PersistenceError> {
        Ok(Self {
            database_url: DatabaseUrl::new(database_url)?,
            host_version: host_version.into(),
        })
    }

    fn next_marker(&self, previous: Option<&str>, now: DateTime<Utc>) -> String {
        let nanos = now
            .timestamp_nanos_opt()
            .unwrap_or_else(|| now.timestamp_micros());

        let mut hasher = Sha256::new();
        hasher.update(self.host_version.as_bytes());
        hasher.update(previous.unwrap_or_default().as_bytes());
        hasher.update(nanos.to_string().as_bytes());
        let digest = hex::encode(hasher.finalize());
        digest.chars().take(32).collect()
    }
}

impl AssetCacheMarker for SqliteAssetCacheMarker {
    fn bump(&self) -> Result<String, PersistenceError> {
        let previous = self.current()?;
        let marker = self.next_marker(previous.as_deref(), Utc::now());

        let mut connection = self.database_url.establish()?;
        sql_query(
            "INSERT INTO asset_version (id, version) VALUES (1, ?) \
             ON CONFLICT(id) DO UPDATE SET version = excluded.version, \
               updated_at = CURRENT_TIMESTAMP;",
        )
        .bind::<Text, _>(&marker)
        .execute(&mut connection)
        .map_err(|error| map_write_error(&mut connection, ASSET_VERSION_TABLE, &error))?;

        Ok(marker)
    }

    fn current(&self) -> Result<Option<String>, PersistenceError> {
        #[derive(Debug, QueryableByName)]
        struct Row {
            #[diesel(sql_type = Text)]
            version: String,
        }

        let mut connection = self.database_url.establish()?;
        let row: Option<Row> = sql_query("SELECT version FROM asset_version WHERE id = 1;")
            .get_result(&mut connection)
            .optional()
            .map_err(|error| map_query_error(&mut connection, ASSET_VERSION_TABLE, &error))?;

        Ok(row.map(|found| found.version))
    }
}
