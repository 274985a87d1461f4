//! Wiring shared by the CLI operations.

use async_trait::async_trait;
use patchtester::github::{
    ChangedFile, FileContents, GatewayError, HeadRepository, IssuePage, PullRequestHead,
};
use patchtester::patch::{map_gateway_error, map_persistence_read_error};
use patchtester::workspace::FilesystemError;
use patchtester::{
    DirectoryBackupStore, EngineDependencies, EngineSettings, OctocrabPatchGateway, PatchEngine,
    PatchError, PatchGateway, PatchTesterConfig, PersonalAccessToken, RateLimitInfo, SiteTree,
    SqliteAssetCacheMarker, SqlitePullRepository, SqliteTestRepository,
};

/// Builds the GitHub gateway from the configured repository and token.
///
/// # Errors
///
/// Returns [`PatchError::Configuration`] when the repository or token is
/// missing or invalid.
pub fn open_gateway(config: &PatchTesterConfig) -> Result<OctocrabPatchGateway, PatchError> {
    let locator = config.repository_locator()?;
    let token = PersonalAccessToken::new(config.resolve_token()?)
        .map_err(|error| map_gateway_error(&error))?;
    OctocrabPatchGateway::for_token(&token, locator).map_err(|error| map_gateway_error(&error))
}

/// The two registries every operation touches.
pub struct Registries {
    /// Mirrored pull requests.
    pub pulls: SqlitePullRepository,
    /// Applied tests.
    pub tests: SqliteTestRepository,
}

impl Registries {
    /// Opens both registries on the configured database.
    ///
    /// # Errors
    ///
    /// Returns [`PatchError::Configuration`] when the database URL is missing
    /// or blank.
    pub fn open(config: &PatchTesterConfig) -> Result<Self, PatchError> {
        let database_url = config.require_database_url()?;
        Ok(Self {
            pulls: SqlitePullRepository::new(database_url)
                .map_err(|error| map_persistence_read_error("open pull registry", &error))?,
            tests: SqliteTestRepository::new(database_url)
                .map_err(|error| map_persistence_read_error("open test registry", &error))?,
        })
    }
}

/// Everything the patch engine needs apart from GitHub.
pub struct LocalStores {
    registries: Registries,
    assets: SqliteAssetCacheMarker,
    tree: SiteTree,
    backups: DirectoryBackupStore,
    settings: EngineSettings,
}

impl LocalStores {
    /// Opens the registries, the site tree, and the backup directory.
    ///
    /// # Errors
    ///
    /// Returns [`PatchError::Configuration`] when a required setting is
    /// missing or a directory cannot be opened.
    pub fn open(config: &PatchTesterConfig) -> Result<Self, PatchError> {
        let host_version = config.require_host_version()?;
        let database_url = config.require_database_url()?;
        let tree = SiteTree::open(config.require_site_root()?)
            .map_err(|error| unusable_directory(&error))?;
        let backups = DirectoryBackupStore::open(config.require_backups_dir()?)
            .map_err(|error| unusable_directory(&error))?;

        Ok(Self {
            registries: Registries::open(config)?,
            assets: SqliteAssetCacheMarker::new(database_url, host_version)
                .map_err(|error| map_persistence_read_error("open asset marker", &error))?,
            tree,
            backups,
            settings: EngineSettings {
                host_version: host_version.to_owned(),
                acting_user: config.user_id,
            },
        })
    }

    /// Builds an engine borrowing these stores and `gateway`.
    #[must_use]
    pub fn engine<'a>(&'a self, gateway: &'a dyn PatchGateway) -> PatchEngine<'a> {
        PatchEngine::new(
            EngineDependencies {
                gateway,
                pulls: &self.registries.pulls,
                tests: &self.registries.tests,
                backups: &self.backups,
                tree: &self.tree,
                assets: &self.assets,
            },
            self.settings.clone(),
        )
    }
}

fn unusable_directory(error: &FilesystemError) -> PatchError {
    PatchError::Configuration {
        message: error.to_string(),
    }
}

/// Gateway used by operations that never talk to GitHub.
///
/// Reverting works from local backups, so it must not require a token.
pub struct OfflineGateway;

impl OfflineGateway {
    fn refuse() -> GatewayError {
        GatewayError::Network {
            message: "this operation does not contact GitHub".to_owned(),
        }
    }
}

#[async_trait]
impl PatchGateway for OfflineGateway {
    async fn rate_limit(&self) -> Result<RateLimitInfo, GatewayError> {
        Err(Self::refuse())
    }

    async fn list_open_issues(
        &self,
        _page: u32,
        _per_page: u8,
    ) -> Result<IssuePage, GatewayError> {
        Err(Self::refuse())
    }

    async fn pull_request(&self, _number: u64) -> Result<PullRequestHead, GatewayError> {
        Err(Self::refuse())
    }

    async fn pull_request_files(&self, _number: u64) -> Result<Vec<ChangedFile>, GatewayError> {
        Err(Self::refuse())
    }

    async fn file_contents(
        &self,
        _repository: &HeadRepository,
        _path: &str,
        _git_ref: &str,
    ) -> Result<FileContents, GatewayError> {
        Err(Self::refuse())
    }
}
