//! Application configuration loaded from CLI, environment, and files.
//!
//! Values are merged with ortho-config's layered approach.
//!
//! # Precedence
//!
//! Configuration values are loaded with the following precedence (lowest to
//! highest):
//!
//! 1. **Defaults** – Built-in application defaults
//! 2. **Configuration file** – `.patchtester.toml` in current directory, home
//!    directory, or XDG config directory
//! 3. **Environment variables** – `PATCHTESTER_TOKEN`, `PATCHTESTER_OWNER`, and
//!    friends, or legacy `GITHUB_TOKEN`
//! 4. **Command-line arguments** – `--token`/`-t`, `--apply <PULL>`, etc.
//!
//! # Configuration File
//!
//! ```toml
//! token = "ghp_example"
//! owner = "joomla"
//! repo = "joomla-cms"
//! database_url = "patchtester.sqlite"
//! site_root = "/var/www/site"
//! backups_dir = "/var/lib/patchtester/backups"
//! host_version = "4.0.0"
//! user_id = 42
//! ```

use std::env;

use camino::Utf8Path;
use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

use crate::github::RepositoryLocator;
use crate::patch::{PatchError, map_gateway_error};
use crate::persistence::PersistenceError;
use crate::sync::SyncSettings;

/// Operation selected by the configured flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationMode {
    /// Run database migrations and exit.
    MigrateDatabase,
    /// Mirror open pull requests into the registry.
    Sync,
    /// Print the mirrored pull requests.
    List,
    /// Apply the given pull request to the working tree.
    Apply(u64),
    /// Revert the given applied test.
    Revert(u64),
}

/// Application configuration supporting CLI, environment, and file sources.
///
/// # Example
///
/// ```no_run
/// use ortho_config::OrthoConfig;
/// use patchtester::PatchTesterConfig;
///
/// let config = PatchTesterConfig::load().expect("failed to load configuration");
/// let token = config.resolve_token().expect("token required");
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, OrthoConfig)]
#[serde(default)]
#[ortho_config(
    prefix = "PATCHTESTER",
    discovery(
        dotfile_name = ".patchtester.toml",
        config_file_name = "patchtester.toml",
        app_name = "patchtester"
    )
)]
pub struct PatchTesterConfig {
    /// Personal access token for GitHub API authentication.
    ///
    /// Falls back to `GITHUB_TOKEN` when unset.
    #[ortho_config(cli_short = 't')]
    pub token: Option<String>,

    /// Owner of the upstream repository (e.g. "joomla").
    #[ortho_config(cli_short = 'o')]
    pub owner: Option<String>,

    /// Name of the upstream repository (e.g. "joomla-cms").
    #[ortho_config(cli_short = 'r')]
    pub repo: Option<String>,

    /// REST API base URL, for GitHub Enterprise hosts or test servers.
    #[ortho_config()]
    pub api_base: Option<String>,

    /// Local `SQLite` database path.
    #[ortho_config()]
    pub database_url: Option<String>,

    /// Root of the working tree that patches are applied to.
    #[ortho_config()]
    pub site_root: Option<String>,

    /// Directory holding pre-patch backups.
    #[ortho_config()]
    pub backups_dir: Option<String>,

    /// Version of the host application installed in the working tree.
    #[ortho_config()]
    pub host_version: Option<String>,

    /// Identifier recorded as the user applying patches.
    #[ortho_config()]
    pub user_id: i64,

    /// Label marking pull requests as ready to commit.
    #[ortho_config()]
    pub fast_track_label: String,

    /// Prefix of labels naming a pull request's target branch.
    #[ortho_config()]
    pub branch_label_prefix: String,

    /// Title or `id:<n>` filter for `--list`.
    #[ortho_config()]
    pub search: Option<String>,

    /// Target branch filter for `--list`.
    #[ortho_config()]
    pub branch: Option<String>,

    /// Runs database migrations and exits.
    #[ortho_config()]
    pub migrate_db: bool,

    /// Mirrors open pull requests into the registry.
    #[ortho_config()]
    pub sync: bool,

    /// Lists mirrored pull requests.
    #[ortho_config(cli_short = 'l')]
    pub list: bool,

    /// Pull request number to apply.
    #[ortho_config()]
    pub apply: Option<u64>,

    /// Applied test identifier to revert.
    #[ortho_config()]
    pub revert: Option<u64>,
}

impl Default for PatchTesterConfig {
    fn default() -> Self {
        let labels = SyncSettings::default();
        Self {
            token: None,
            owner: None,
            repo: None,
            api_base: None,
            database_url: None,
            site_root: None,
            backups_dir: None,
            host_version: None,
            user_id: 0,
            fast_track_label: labels.fast_track_label,
            branch_label_prefix: labels.branch_label_prefix,
            search: None,
            branch: None,
            migrate_db: false,
            sync: false,
            list: false,
            apply: None,
            revert: None,
        }
    }
}

impl PatchTesterConfig {
    /// Resolves the token from configuration or the legacy `GITHUB_TOKEN`
    /// environment variable.
    ///
    /// # Errors
    ///
    /// Returns [`PatchError::Configuration`] when no token source provides a
    /// value.
    pub fn resolve_token(&self) -> Result<String, PatchError> {
        self.token
            .clone()
            .or_else(|| env::var("GITHUB_TOKEN").ok())
            .ok_or_else(|| missing("GitHub token (use --token or GITHUB_TOKEN)"))
    }

    /// Determines the operation from the configured flags.
    ///
    /// Migration wins over revert, revert over apply, apply over sync.
    /// Without any flag the registry is listed.
    #[must_use]
    pub const fn operation_mode(&self) -> OperationMode {
        match (self.migrate_db, self.revert, self.apply, self.sync) {
            (true, _, _, _) => OperationMode::MigrateDatabase,
            (false, Some(test_id), _, _) => OperationMode::Revert(test_id),
            (false, None, Some(pull_id), _) => OperationMode::Apply(pull_id),
            (false, None, None, true) => OperationMode::Sync,
            (false, None, None, false) => OperationMode::List,
        }
    }

    /// Returns the database URL.
    ///
    /// # Errors
    ///
    /// Returns [`PatchError::Configuration`] when no URL is configured.
    pub fn require_database_url(&self) -> Result<&str, PatchError> {
        self.database_url
            .as_deref()
            .ok_or_else(|| PatchError::Configuration {
                message: PersistenceError::MissingDatabaseUrl.to_string(),
            })
    }

    /// Returns the working tree root.
    ///
    /// # Errors
    ///
    /// Returns [`PatchError::Configuration`] when no root is configured.
    pub fn require_site_root(&self) -> Result<&Utf8Path, PatchError> {
        self.site_root
            .as_deref()
            .map(Utf8Path::new)
            .ok_or_else(|| missing("site root (use --site-root)"))
    }

    /// Returns the backups directory.
    ///
    /// # Errors
    ///
    /// Returns [`PatchError::Configuration`] when no directory is configured.
    pub fn require_backups_dir(&self) -> Result<&Utf8Path, PatchError> {
        self.backups_dir
            .as_deref()
            .map(Utf8Path::new)
            .ok_or_else(|| missing("backups directory (use --backups-dir)"))
    }

    /// Returns the host application version.
    ///
    /// # Errors
    ///
    /// Returns [`PatchError::Configuration`] when the version is missing or
    /// blank.
    pub fn require_host_version(&self) -> Result<&str, PatchError> {
        self.host_version
            .as_deref()
            .map(str::trim)
            .filter(|version| !version.is_empty())
            .ok_or_else(|| missing("host version (use --host-version)"))
    }

    /// Builds the repository locator from owner, repo, and API base.
    ///
    /// # Errors
    ///
    /// Returns [`PatchError::Configuration`] when owner or repo is missing, or
    /// when the API base is not a valid URL.
    pub fn repository_locator(&self) -> Result<RepositoryLocator, PatchError> {
        let owner = self
            .owner
            .as_deref()
            .ok_or_else(|| missing("repository owner (use --owner or -o)"))?;
        let repo = self
            .repo
            .as_deref()
            .ok_or_else(|| missing("repository name (use --repo or -r)"))?;

        let locator = RepositoryLocator::from_owner_repo(owner, repo)
            .map_err(|error| map_gateway_error(&error))?;
        let Some(api_base) = self.api_base.as_deref() else {
            return Ok(locator);
        };
        locator
            .with_api_base(api_base)
            .map_err(|error| map_gateway_error(&error))
    }

    /// Label conventions for synchronisation.
    #[must_use]
    pub fn sync_settings(&self) -> SyncSettings {
        SyncSettings {
            fast_track_label: self.fast_track_label.clone(),
            branch_label_prefix: self.branch_label_prefix.clone(),
        }
    }
}

fn missing(what: &str) -> PatchError {
    PatchError::Configuration {
        message: format!("{what} is required"),
    }
}

#[cfg(test)]
mod tests;
