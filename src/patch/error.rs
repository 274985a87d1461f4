//! Failures of the apply and revert pipeline.

use thiserror::Error;

use crate::github::{GatewayError, RateLimitInfo};
use crate::persistence::PersistenceError;
use crate::workspace::FilesystemError;

/// Errors returned by [`super::PatchEngine`] and the synchroniser.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatchError {
    /// The GitHub quota is too low for the operation.
    #[error("GitHub API rate limit exceeded, resets at {resets_at}")]
    RateLimitExceeded {
        /// Human-readable reset instant.
        resets_at: String,
    },

    /// GitHub could not be reached or answered with an error.
    #[error("could not talk to GitHub: {message}")]
    RemoteUnavailable {
        /// Failure detail.
        message: String,
    },

    /// The repository holding the pull request's head has been deleted.
    #[error("the head repository of pull request #{pull_id} no longer exists")]
    RepoGone {
        /// Pull request number.
        pull_id: u64,
    },

    /// Another applied patch already owns the file.
    #[error("'{path}' is already patched by another applied test")]
    Conflict {
        /// Conflicting path.
        path: String,
    },

    /// A file the patch modifies or deletes is absent locally.
    #[error("'{path}' does not exist in the working tree")]
    MissingLocalFile {
        /// Missing path.
        path: String,
    },

    /// GitHub returned file contents in an encoding other than base64.
    #[error("'{path}' uses unsupported encoding '{encoding}'")]
    UnsupportedEncoding {
        /// File path.
        path: String,
        /// Reported encoding.
        encoding: String,
    },

    /// A filesystem mutation failed.
    #[error("filesystem error: {message}")]
    FilesystemIo {
        /// Failure detail.
        message: String,
    },

    /// A database read or write failed.
    #[error("database error: {message}")]
    DatabaseIo {
        /// Failure detail.
        message: String,
        /// False when the failure happened before anything was changed.
        partial: bool,
    },

    /// Synchronisation was refused because patches are still applied.
    #[error("{count} applied test(s) must be reverted before refreshing pull requests")]
    AppliedPatchesPresent {
        /// Number of applied tests.
        count: usize,
    },

    /// No applied test exists with the given identifier.
    #[error("applied test {test_id} does not exist")]
    TestNotFound {
        /// Requested identifier.
        test_id: u64,
    },

    /// Configuration is missing or invalid.
    #[error("configuration error: {message}")]
    Configuration {
        /// Failure detail.
        message: String,
    },
}

impl PatchError {
    /// Returns true when the failure may have left the working tree or the
    /// bookkeeping partially changed.
    #[must_use]
    pub const fn is_unsafe(&self) -> bool {
        matches!(
            self,
            Self::FilesystemIo { .. } | Self::DatabaseIo { partial: true, .. }
        )
    }
}

impl From<FilesystemError> for PatchError {
    fn from(error: FilesystemError) -> Self {
        Self::FilesystemIo {
            message: error.to_string(),
        }
    }
}

/// Maps a gateway failure onto the patch taxonomy.
#[must_use]
pub fn map_gateway_error(error: &GatewayError) -> PatchError {
    match error {
        GatewayError::RateLimitExceeded { rate_limit, .. } => PatchError::RateLimitExceeded {
            resets_at: rate_limit
                .as_ref()
                .map_or_else(|| "an unknown time".to_owned(), RateLimitInfo::describe_reset),
        },
        GatewayError::InvalidUrl(_)
        | GatewayError::MissingRepository
        | GatewayError::MissingToken
        | GatewayError::Authentication { .. } => PatchError::Configuration {
            message: error.to_string(),
        },
        GatewayError::Api { .. }
        | GatewayError::Network { .. }
        | GatewayError::InvalidPagination { .. } => PatchError::RemoteUnavailable {
            message: error.to_string(),
        },
    }
}

/// Maps a failed write, or any failure after mutation began, onto the patch
/// taxonomy.
#[must_use]
pub fn map_persistence_error(operation: &str, error: &PersistenceError) -> PatchError {
    persistence_failure(operation, error, true)
}

/// Maps a failed read that precedes every mutation; the result is safe to
/// retry.
#[must_use]
pub fn map_persistence_read_error(operation: &str, error: &PersistenceError) -> PatchError {
    persistence_failure(operation, error, false)
}

fn persistence_failure(operation: &str, error: &PersistenceError, partial: bool) -> PatchError {
    match error {
        PersistenceError::MissingDatabaseUrl
        | PersistenceError::BlankDatabaseUrl
        | PersistenceError::SchemaNotInitialised => PatchError::Configuration {
            message: format!("{operation}: {error}"),
        },
        _ => PatchError::DatabaseIo {
            message: format!("{operation}: {error}"),
            partial,
        },
    }
}
