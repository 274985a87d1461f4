//! Applying pull requests to the working tree and reverting them.
//!
//! [`PatchEngine::apply`] resolves a pull request's head, normalises its file
//! list, validates every file, downloads new contents, and only then backs up
//! and rewrites the tree before recording an applied test.
//! [`PatchEngine::revert`] inverts a recorded test from its backups.

mod apply;
mod engine;
mod error;
mod file_change;
mod revert;

pub use engine::{EngineDependencies, EngineSettings, PatchEngine};
pub(crate) use engine::require_quota;
pub use error::{PatchError, map_gateway_error, map_persistence_error, map_persistence_read_error};
pub use file_change::{
    FileAction, FileChange, NON_PRODUCTION_FILES, NON_PRODUCTION_FOLDERS, StagedChange,
    is_non_production, parse_file_list, strip_source_prefix,
};

#[cfg(test)]
mod tests;
