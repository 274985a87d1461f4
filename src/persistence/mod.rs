//! Local persistence and database migrations.
//!
//! The patch tester keeps its pull request mirror, applied test bookkeeping,
//! and asset-cache marker in a local `SQLite` database. The schema is managed
//! with Diesel migrations so the database can be created and upgraded
//! consistently across machines.

mod asset_version;
mod connection;
mod error;
mod migrator;
mod pulls;

pub use applied_tests::{AppliedTestRecord, NewAppliedTest, SqliteTestRepository, TestRepository};
pub use asset_version::{AssetCacheMarker, SqliteAssetCacheMarker};
pub use error::PersistenceError;
pub use migrator::{
    CURRENT_SCHEMA_VERSION, INITIAL_SCHEMA_VERSION, SchemaVersion, migrate_database,
};
pub use pulls::{
    NewPull, PullFilter, PullOrdering, PullRecord, PullRepository, SearchTerm, SortDirection,
    SqlitePullRepository,
};
