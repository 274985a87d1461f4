//! The patch engine and the collaborators it is wired to.

use crate::backup::BackupStore;
use crate::github::PatchGateway;
use crate::persistence::{AssetCacheMarker, PullRepository, TestRepository};
use crate::workspace::WorkingTree;

use super::error::{PatchError, map_gateway_error};

/// Borrowed collaborators of a [`PatchEngine`].
#[derive(Clone, Copy)]
pub struct EngineDependencies<'deps> {
    /// GitHub access.
    pub gateway: &'deps dyn PatchGateway,
    /// Pull request registry.
    pub pulls: &'deps dyn PullRepository,
    /// Applied test registry.
    pub tests: &'deps dyn TestRepository,
    /// Backup blobs.
    pub backups: &'deps dyn BackupStore,
    /// Site files.
    pub tree: &'deps dyn WorkingTree,
    /// Asset-cache version marker.
    pub assets: &'deps dyn AssetCacheMarker,
}

/// Values describing the host and the operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSettings {
    /// Version of the host application the tree belongs to.
    pub host_version: String,
    /// Identifier recorded as the user applying patches.
    pub acting_user: i64,
}

/// Applies pull requests to the working tree and reverts them.
///
/// Each operation validates everything it can before the first mutation.
/// Failures after that point are reported with [`PatchError::is_unsafe`]
/// returning true and are not rolled back.
pub struct PatchEngine<'deps> {
    pub(super) deps: EngineDependencies<'deps>,
    pub(super) settings: EngineSettings,
}

impl<'deps> PatchEngine<'deps> {
    /// Creates an engine over the given collaborators.
    #[must_use]
    pub const fn new(deps: EngineDependencies<'deps>, settings: EngineSettings) -> Self {
        Self { deps, settings }
    }
}

/// Fails unless GitHub allows at least `required` more requests.
pub(crate) async fn require_quota(
    gateway: &dyn PatchGateway,
    required: u32,
) -> Result<(), PatchError> {
    let info = gateway
        .rate_limit()
        .await
        .map_err(|error| map_gateway_error(&error))?;

    if info.allows(required) {
        return Ok(());
    }

    tracing::warn!(
        remaining = info.remaining(),
        required,
        "GitHub API quota too low"
    );
    Err(PatchError::RateLimitExceeded {
        resets_at: info.describe_reset(),
    })
}
