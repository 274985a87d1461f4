//! Shared test utilities.

pub mod github;
pub mod sandbox;

use tempfile::TempDir;

/// Creates a temporary directory for database and site tests.
///
/// # Panics
///
/// Panics if the temporary directory cannot be created.
pub fn create_temp_dir() -> TempDir {
    TempDir::new().unwrap_or_else(|error| panic!("failed to create temporary directory: {error}"))
}
