//! Patch tester library crate.
//!
//! Mirrors a GitHub repository's open pull requests into a local `SQLite`
//! registry, applies a pull request's changed files onto a working tree after
//! backing up every touched file, and reverts applied patches byte for byte.
//!
//! The building blocks are small injected interfaces:
//!
//! - [`PatchGateway`] for GitHub access, implemented with Octocrab
//! - [`PullRepository`], [`TestRepository`], and [`AssetCacheMarker`] for
//!   Diesel-backed bookkeeping
//! - [`WorkingTree`] and [`BackupStore`] for capability-scoped filesystem
//!   access
//!
//! [`PullListSynchronizer`] and [`PatchEngine`] compose them.

pub mod backup;
pub mod config;
pub mod github;
pub mod patch;
pub mod persistence;
pub mod sync;
pub mod telemetry;
pub mod workspace;

pub use backup::{BackupKey, BackupStore, DirectoryBackupStore};
pub use config::{OperationMode, PatchTesterConfig};
pub use github::{
    GatewayError, OctocrabPatchGateway, PatchGateway, PersonalAccessToken, RateLimitInfo,
    RepositoryLocator,
};
pub use patch::{EngineDependencies, EngineSettings, PatchEngine, PatchError};
pub use persistence::{
    AssetCacheMarker, PullRepository, SqliteAssetCacheMarker, SqlitePullRepository,
    SqliteTestRepository, TestRepository,
};
pub use sync::{PullListSynchronizer, SyncSettings, SyncStatus};
pub use workspace::{SiteTree, WorkingTree};
