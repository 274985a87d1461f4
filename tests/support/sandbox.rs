//! Temporary site, backups directory, and migrated database.

use camino::{Utf8Path, Utf8PathBuf};
use patchtester::persistence::migrate_database;
use patchtester::telemetry::NoopTelemetrySink;
use patchtester::{
    DirectoryBackupStore, EngineDependencies, EngineSettings, PatchEngine, PatchGateway, SiteTree,
    SqliteAssetCacheMarker, SqlitePullRepository, SqliteTestRepository,
};
use tempfile::TempDir;

use super::create_temp_dir;

pub const HOST_VERSION: &str = "4.0.0";

pub struct Sandbox {
    _temp_dir: TempDir,
    pub site_path: Utf8PathBuf,
    pub backups_path: Utf8PathBuf,
    pub database_url: String,
}

impl Sandbox {
    pub fn new() -> Self {
        let temp_dir = create_temp_dir();
        let root = Utf8PathBuf::from_path_buf(temp_dir.path().to_path_buf())
            .expect("temporary path should be UTF-8");
        let site_path = root.join("site");
        let backups_path = root.join("backups");
        std::fs::create_dir_all(&site_path).expect("site directory should be created");
        std::fs::create_dir_all(&backups_path).expect("backups directory should be created");

        let database_url = root.join("patchtester.sqlite").to_string();
        migrate_database(&database_url, &NoopTelemetrySink).expect("migrations should run");

        Self {
            _temp_dir: temp_dir,
            site_path,
            backups_path,
            database_url,
        }
    }

    pub fn write(&self, path: &str, contents: &[u8]) {
        let target = self.site_path.join(path);
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent).expect("parent directory should be created");
        }
        std::fs::write(target, contents).expect("site file should be written");
    }

    pub fn read(&self, path: &str) -> Option<Vec<u8>> {
        let target = self.site_path.join(path);
        target
            .exists()
            .then(|| std::fs::read(target).expect("site file should be readable"))
    }

    pub fn backup_count(&self) -> usize {
        std::fs::read_dir(&self.backups_path)
            .expect("backups directory should be listable")
            .count()
    }

    pub fn stores(&self) -> Stores {
        Stores {
            pulls: SqlitePullRepository::new(self.database_url.clone())
                .expect("pulls should open"),
            tests: SqliteTestRepository::new(self.database_url.clone())
                .expect("tests should open"),
            assets: SqliteAssetCacheMarker::new(self.database_url.clone(), HOST_VERSION)
                .expect("asset marker should open"),
            tree: SiteTree::open(&self.site_path).expect("site should open"),
            backups: DirectoryBackupStore::open(&self.backups_path).expect("backups should open"),
        }
    }

    pub fn site_root(&self) -> &Utf8Path {
        &self.site_path
    }
}

pub struct Stores {
    pub pulls: SqlitePullRepository,
    pub tests: SqliteTestRepository,
    pub assets: SqliteAssetCacheMarker,
    pub tree: SiteTree,
    pub backups: DirectoryBackupStore,
}

impl Stores {
    pub fn engine<'a>(&'a self, gateway: &'a dyn PatchGateway) -> PatchEngine<'a> {
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
                host_version: HOST_VERSION.to_owned(),
                acting_user: 7,
            },
        )
    }
}
