//! CLI operation handlers.
//!
//! - [`migrations`]: Database schema migrations
//! - [`sync`]: Mirror open pull requests into the registry
//! - [`list`]: Print the mirrored pull requests
//! - [`apply`]: Apply a pull request to the working tree
//! - [`revert`]: Revert an applied test
//!
//! Shared wiring lives in [`context`] and output formatting in [`output`].

use patchtester::PatchError;
use thiserror::Error;

pub mod apply;
pub mod context;
pub mod list;
pub mod migrations;
pub mod output;
pub mod revert;
pub mod sync;

/// Failures surfaced by the command line.
#[derive(Debug, Error)]
pub enum CliError {
    /// The requested operation failed.
    #[error(transparent)]
    Patch(#[from] PatchError),

    /// Writing to stdout failed.
    #[error("failed to write output: {message}")]
    Output {
        /// Failure detail.
        message: String,
    },
}

impl CliError {
    /// Returns true when the working tree or database may need manual repair.
    #[must_use]
    pub const fn is_unsafe(&self) -> bool {
        match self {
            Self::Patch(error) => error.is_unsafe(),
            Self::Output { .. } => false,
        }
    }
}
