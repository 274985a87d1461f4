//! Engine tests against real SQLite, real directories, and a mocked GitHub.


use std::collections::HashMap;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use camino::{Utf8Path, Utf8PathBuf};
use tempfile::TempDir;

use super::{EngineDependencies, EngineSettings, PatchEngine};
use crate::backup::DirectoryBackupStore;
use crate::github::{
    ChangedFile, FileContents, GatewayError, HeadRepository, MockPatchGateway, PullRequestHead,
    RateLimitInfo,
};
use crate::persistence::{
    NewPull, PullRepository, SqliteAssetCacheMarker, SqlitePullRepository, SqliteTestRepository,
    migrate_database,
};
use crate::telemetry::NoopTelemetrySink;
use crate::workspace::{SiteTree, WorkingTree};

pub(super) const PULL_ID: u64 = 12;
pub(super) const HEAD_SHA: &str = "abc123";
pub(super) const HOST_VERSION: &str = "4.0.0";

/// Temporary site, backups directory, and migrated database.
pub(super) struct Harness {
    _temp_dir: TempDir,
    backups_path: Utf8PathBuf,
    pub(super) pulls: SqlitePullRepository,
    pub(super) tests: SqliteTestRepository,
    pub(super) assets: SqliteAssetCacheMarker,
    pub(super) backups: DirectoryBackupStore,
    pub(super) tree: SiteTree,
}

impl Harness {
    pub(super) fn new() -> Self {
        let temp_dir = TempDir::new().expect("temporary directory should be created");
        let root = Utf8PathBuf::from_path_buf(temp_dir.path().to_path_buf())
            .expect("temporary path should be UTF-8");
        let site_path = root.join("site");
        let backups_path = root.join("backups");
        std::fs::create_dir_all(&site_path).expect("site directory should be created");

        let database_url = root.join("patchtester.sqlite").to_string();
        migrate_database(&database_url, &NoopTelemetrySink).expect("migrations should run");

        let pulls = SqlitePullRepository::new(database_url.clone()).expect("pulls should open");
        pulls
            .insert_batch(&[NewPull {
                pull_id: PULL_ID,
                title: "Fix menu rendering".to_owned(),
                description: String::new(),
                pull_url: format!("https://github.com/octo/site/pull/{PULL_ID}"),
                is_fast_track: false,
                branch: String::new(),
            }])
            .expect("seed pull should insert");

        Self {
            pulls,
            tests: SqliteTestRepository::new(database_url.clone()).expect("tests should open"),
            assets: SqliteAssetCacheMarker::new(database_url, HOST_VERSION)
                .expect("asset marker should open"),
            backups: DirectoryBackupStore::open(&backups_path).expect("backups should open"),
            tree: SiteTree::open(&site_path).expect("site should open"),
            backups_path,
            _temp_dir: temp_dir,
        }
    }

    pub(super) fn engine<'a>(
        &'a self,
        gateway: &'a MockPatchGateway,
        host_version: &str,
    ) -> PatchEngine<'a> {
        PatchEngine::new(
            EngineDependencies {
                gateway,
                pulls: &self.pulls,
                tests: &self.tests,
                backups: &self.backups,
                tree: &self.tree,
                assets: &self.assets,
            },
            EngineSettings {
                host_version: host_version.to_owned(),
                acting_user: 42,
            },
        )
    }

    pub(super) fn write(&self, path: &str, contents: &[u8]) {
        self.tree
            .write(Utf8Path::new(path), contents)
            .expect("site file should be written");
    }

    pub(super) fn read(&self, path: &str) -> Option<Vec<u8>> {
        let path = Utf8Path::new(path);
        self.tree
            .exists(path)
            .then(|| self.tree.read(path).expect("site file should be readable"))
    }

    pub(super) fn backup_count(&self) -> usize {
        std::fs::read_dir(&self.backups_path)
            .expect("backups directory should be listable")
            .count()
    }

    pub(super) fn applied_sha(&self) -> String {
        self.pulls
            .find(PULL_ID)
            .expect("pull lookup should succeed")
            .expect("seeded pull should exist")
            .applied_sha
    }
}

pub(super) fn changed(filename: &str, status: &str, previous: Option<&str>) -> ChangedFile {
    ChangedFile {
        filename: filename.to_owned(),
        status: status.to_owned(),
        previous_filename: previous.map(ToOwned::to_owned),
        contents_url: format!("https://api.github.com/repos/fork/site/contents/{filename}"),
    }
}

/// Remote state of the pull request served by the mocked gateway.
pub(super) struct RemotePull {
    pub(super) remaining: u32,
    pub(super) head_repository: Option<HeadRepository>,
    pub(super) files: Vec<ChangedFile>,
    pub(super) contents: HashMap<String, Vec<u8>>,
    pub(super) encoding: &'static str,
}

impl RemotePull {
    pub(super) fn with_files(files: Vec<ChangedFile>) -> Self {
        Self {
            remaining: 5000,
            head_repository: Some(HeadRepository {
                owner: "contributor".to_owned(),
                name: "site-fork".to_owned(),
            }),
            files,
            contents: HashMap::new(),
            encoding: "base64",
        }
    }

    pub(super) fn serving(mut self, path: &str, body: &[u8]) -> Self {
        self.contents.insert(path.to_owned(), body.to_vec());
        self
    }

    pub(super) fn gateway(self) -> MockPatchGateway {
        let Self {
            remaining,
            head_repository,
            files,
            contents,
            encoding,
        } = self;
        let mut gateway = MockPatchGateway::new();

        gateway
            .expect_rate_limit()
            .returning(move || Ok(RateLimitInfo::new(5000, remaining, 1_700_000_000)));
        gateway.expect_pull_request().returning(move |number| {
            Ok(PullRequestHead {
                number,
                head_ref: "fix-menu".to_owned(),
                head_sha: HEAD_SHA.to_owned(),
                repository: head_repository.clone(),
            })
        });
        gateway
            .expect_pull_request_files()
            .returning(move |_| Ok(files.clone()));
        gateway
            .expect_file_contents()
            .returning(move |repository, path, git_ref| {
                assert_eq!(repository.owner, "contributor");
                assert_eq!(git_ref, "fix-menu");
                contents.get(path).map_or_else(
                    || {
                        Err(GatewayError::Api {
                            message: format!("no contents for {path}"),
                        })
                    },
                    |body| {
                        Ok(FileContents {
                            encoding: encoding.to_owned(),
                            content: STANDARD.encode(body),
                        })
                    },
                )
            });

        gateway
    }
}
